//! Test support for the uftp crates.
//!
//! Provides a scripted in-memory endpoint with a virtual clock for driving
//! the channel engine deterministically, and loss injection for exercising
//! retransmission over real sockets.

mod loss;
mod lossy;
mod script;

pub use loss::{LossGenerator, LossPattern};
pub use lossy::LossyEndpoint;
pub use script::ScriptedEndpoint;
