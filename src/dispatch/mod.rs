//! Trigger dispatch: the shared evaluation loop, per-kind entry points,
//! multi-kind combos, kill propagation, and reset scheduling

pub mod combo;
pub mod creature;
pub mod item;
pub mod kill;
pub mod reset;
pub mod room;
pub mod run;
pub mod vehicle;
