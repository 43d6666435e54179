//! Thornmarch - trigger dispatch for a persistent-world text game
//!
//! Routes game events (movement, speech, commands, combat, commerce, quests,
//! resets) to the scripts attached to creatures, items, rooms, and vehicles,
//! and interprets the script results as allow/block decisions for the caller.

pub mod core;
pub mod dispatch;
pub mod script;
pub mod world;
