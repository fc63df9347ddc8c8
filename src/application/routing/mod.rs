//! Command routing - matching, extraction, dispatch

pub mod extract;
pub mod router;

pub use router::{CommandRouter, Route};
