//! Global types used across devup

pub mod error;
pub use error::*;
