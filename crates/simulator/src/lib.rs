//! Scripted call simulator
//!
//! Replays transcripts from a script file through the call registry, the
//! same path a telephony transport would take.

pub mod runner;
pub mod script;

pub use runner::run_script;
pub use script::{Script, ScriptEvent, ScriptedCall};
