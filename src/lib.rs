//! plugbot - a chat bot runtime built around dynamically loaded command plugins
//!
//! Messages arrive from a chat network through a transport adapter, are
//! matched against the commands advertised by the loaded plugins, and the
//! parsed command is handed to the owning plugin over its private channel.
//! Plugin replies flow back through a shared outbound sink.
//!
//! The crate is a library so plugin artifacts and tests can link against the
//! shared types; the `plugbot` binary wires everything together.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod plugins;
