//! Test doubles for the axon protocols.
//!
//! Enabled with the `test-utils` feature. These are deliberately trivial —
//! they exist so implementation crates can exercise orchestration, runner,
//! and callback integrations without real handlers.

mod echo_agent;
mod failing_agent;
mod recording_callback;

pub use echo_agent::EchoAgent;
pub use failing_agent::FailingAgent;
pub use recording_callback::RecordingCallback;
