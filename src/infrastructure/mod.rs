//! Infrastructure layer - configuration and chat-network adapters

pub mod adapters;
pub mod config;
