//! Command protocol and session drivers for the uftp tools.
//!
//! The command layer carries short text commands over the reliable channel
//! and hands bulk transfers to the file streaming layer. One client talks to
//! one server at a time; each command is a fresh stop-and-wait exchange.

pub mod client;
pub mod command;
pub mod server;
