//! Trigger content, live script state, and the script-service boundary

pub mod context;
pub mod engine;
pub mod live;
pub mod matching;
pub mod trigger;
