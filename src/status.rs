use crate::error::{Result, StatusError};

/// One parsed stub_status report.
///
/// The body is positional rather than keyed:
///
/// ```text
/// Active connections: 291
/// server accepts handled requests
///  16630948 16630948 31070465
/// Reading: 6 Writing: 179 Waiting: 106
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub active_connections: u64,
    /// Informational only; `None` when the token is not a counter.
    pub accepted: Option<u64>,
    pub handled: Option<u64>,
    /// Total requests served since the upstream started.
    pub cumulative_requests: u64,
    pub states: Option<ConnectionStates>,
}

/// Breakdown from the optional fourth line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionStates {
    pub reading: u64,
    pub writing: u64,
    pub waiting: u64,
}

const CONNECTIONS_LINE: usize = 0;
const COUNTERS_LINE: usize = 2;
const STATES_LINE: usize = 3;

impl StatusSnapshot {
    pub fn parse(body: &str) -> Result<Self> {
        let lines: Vec<&str> = body.lines().collect();

        let first = line(&lines, CONNECTIONS_LINE)?;
        let active = first
            .split(": ")
            .nth(1)
            .ok_or(StatusError::MissingField {
                line: CONNECTIONS_LINE + 1,
                what: "\": \" separator",
            })?;
        let active_connections = parse_counter(CONNECTIONS_LINE, active)?;

        let tokens: Vec<&str> = line(&lines, COUNTERS_LINE)?.split_whitespace().collect();
        let requests = tokens.get(2).ok_or(StatusError::MissingField {
            line: COUNTERS_LINE + 1,
            what: "requests counter",
        })?;
        let cumulative_requests = parse_counter(COUNTERS_LINE, requests)?;
        let accepted = tokens[0].parse().ok();
        let handled = tokens[1].parse().ok();

        let states = lines
            .get(STATES_LINE)
            .and_then(|l| ConnectionStates::parse(l));

        Ok(Self {
            active_connections,
            accepted,
            handled,
            cumulative_requests,
            states,
        })
    }
}

impl ConnectionStates {
    /// Lenient: a missing or odd fourth line just means no breakdown.
    fn parse(line: &str) -> Option<Self> {
        let mut reading = None;
        let mut writing = None;
        let mut waiting = None;

        let tokens: Vec<&str> = line.split_whitespace().collect();
        for pair in tokens.chunks(2) {
            let [label, value] = pair else {
                return None;
            };
            let value = value.parse().ok()?;
            match *label {
                "Reading:" => reading = Some(value),
                "Writing:" => writing = Some(value),
                "Waiting:" => waiting = Some(value),
                _ => {}
            }
        }

        Some(Self {
            reading: reading?,
            writing: writing?,
            waiting: waiting?,
        })
    }
}

fn line<'a>(lines: &[&'a str], index: usize) -> Result<&'a str> {
    lines
        .get(index)
        .copied()
        .ok_or(StatusError::MissingLine(index + 1))
}

fn parse_counter(index: usize, token: &str) -> Result<u64> {
    let token = token.trim();
    token.parse().map_err(|_| StatusError::InvalidInteger {
        line: index + 1,
        value: token.to_string(),
    })
}
