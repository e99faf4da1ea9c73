pub mod collector;
pub mod error;
pub mod source;
pub mod status;

pub use error::{Result, StatusError};
pub use source::{HttpStatusSource, StatusSource};
pub use status::{ConnectionStates, StatusSnapshot};
