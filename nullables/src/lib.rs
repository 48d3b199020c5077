//! Nullable infrastructure for deterministic testing.
//!
//! Test-friendly stand-ins for the node's collaborators:
//! - [`RecordingLogger`] captures every facade call instead of emitting it
//! - [`NullPeer`] is a loopback remote that accepts connections and counts
//!   close events, so teardown can be observed from the far side
//!
//! Usage: hand these to a node in tests in place of real sinks and remotes.

pub mod logger;
pub mod peer;

pub use logger::RecordingLogger;
pub use peer::NullPeer;
