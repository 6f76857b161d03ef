//! State module for tracking run progress
//!
//! - `RunState`: lifecycle of one merge run (idle, running, finalizing, empty, done)

mod run_state;

pub use run_state::RunState;
