//! Trigger and quest content definitions
//!
//! A `TriggerDefinition` is authored offline and immutable at runtime. The
//! engine only reads it: which entity kind it attaches to, which events it
//! listens for, its numeric/text arguments, and its behavior flags.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::core::types::{QuestVnum, TriggerVnum};

/// Which entity kind a trigger may be placed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttachKind {
    Creature,
    Item,
    Room,
    Vehicle,
}

bitflags! {
    /// Event kinds a trigger listens for
    ///
    /// One definition may listen for several events; the numeric and text
    /// arguments are interpreted per event kind at dispatch time.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EventMask: u64 {
        /// Periodic dispatch while the entity is live
        const RANDOM       = 1 << 0;
        /// A command was typed in the entity's presence
        const COMMAND      = 1 << 1;
        /// Someone spoke in the entity's presence
        const SPEECH       = 1 << 2;
        /// A social/emote message reached the entity
        const ACT          = 1 << 3;
        /// The entity died
        const DEATH        = 1 << 4;
        /// Someone arrived in the room (watcher's trigger, can block)
        const GREET        = 1 << 5;
        /// As GREET, but fires even when the watcher cannot see the mover
        const GREET_ALL    = 1 << 6;
        /// The entity itself entered a new room
        const ENTRY        = 1 << 7;
        /// The entity was handed an item
        const RECEIVE      = 1 << 8;
        /// A combat round passed with the entity fighting
        const FIGHT        = 1 << 9;
        /// The entity's health fell to or below the numeric argument percent
        const HIT_PERCENT  = 1 << 10;
        /// The entity was offered money; numeric argument is the minimum amount
        const BRIBE        = 1 << 11;
        /// The entity was instantiated from content
        const LOAD         = 1 << 12;
        /// The entity remembers this actor and saw them again
        const MEMORY       = 1 << 13;
        /// An ability was used on or near the entity
        const ABILITY      = 1 << 14;
        /// Someone is about to leave the room (can block)
        const LEAVE        = 1 << 15;
        /// As LEAVE, but fires even when the watcher cannot see the mover
        const LEAVE_ALL    = 1 << 16;
        /// A door in the room was manipulated
        const DOOR         = 1 << 17;
        /// An item's countdown timer expired
        const TIMER        = 1 << 18;
        /// An item was picked up
        const GET          = 1 << 19;
        /// An item was dropped
        const DROP         = 1 << 20;
        /// An item was given away
        const GIVE         = 1 << 21;
        /// An item was equipped
        const WEAR         = 1 << 22;
        /// An item was unequipped
        const REMOVE       = 1 << 23;
        /// An item was eaten, drunk, quaffed, read or otherwise used up
        const CONSUME      = 1 << 24;
        /// Periodic world reset for a room
        const RESET        = 1 << 25;
        /// Someone entered the room (room's own trigger)
        const ENTER        = 1 << 26;
        /// A purchase is being made
        const BUY          = 1 << 27;
        /// Something was killed nearby by the entity's owner or allies
        const KILL         = 1 << 28;
        /// The game came back up from a reboot
        const REBOOT       = 1 << 29;
        /// A building or vehicle is being taken apart
        const DISMANTLE    = 1 << 30;
        /// A quest is being started
        const START_QUEST  = 1 << 31;
        /// A quest is being turned in
        const FINISH_QUEST = 1 << 32;
        /// A vehicle is being destroyed
        const DESTROY      = 1 << 33;
    }
}

// bitflags' serde feature only supplies helper functions; the trait impls
// forward to them so flag fields serialize as "A | B" text in content files.
impl Serialize for EventMask {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        bitflags::serde::serialize(self, serializer)
    }
}

impl<'de> Deserialize<'de> for EventMask {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        bitflags::serde::deserialize(deserializer)
    }
}

impl EventMask {
    /// Events whose text argument is mandatory; a definition listening for
    /// one of these with no text argument is inert and logged at dispatch.
    pub fn requires_text_arg(self) -> bool {
        self.intersects(EventMask::COMMAND | EventMask::SPEECH | EventMask::ACT)
    }

    /// Events gated on a real player being present in the relevant room
    pub fn requires_player_nearby(self) -> bool {
        self.intersects(EventMask::RANDOM | EventMask::RESET)
    }
}

bitflags! {
    /// Behavior flags on a trigger definition
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TriggerFlags: u8 {
        /// Do not end the dispatch loop after this trigger executes
        const ALLOW_MULTIPLE = 1 << 0;
        /// Fire even while the owning creature is charmed
        const CHARMED_OK     = 1 << 1;
        /// Bypass the player-nearby locality requirement
        const GLOBAL         = 1 << 2;
    }
}

impl Serialize for TriggerFlags {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        bitflags::serde::serialize(self, serializer)
    }
}

impl<'de> Deserialize<'de> for TriggerFlags {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        bitflags::serde::deserialize(deserializer)
    }
}

/// Immutable content definition of one trigger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerDefinition {
    pub vnum: TriggerVnum,
    pub name: String,
    pub attach: AttachKind,
    pub events: EventMask,
    /// Percent chance, health-percent threshold, minimum bribe amount, or
    /// buy-location bitmask, depending on the event kind
    #[serde(default)]
    pub numeric_arg: i32,
    /// Command pattern or speech wordlist, depending on the event kind
    #[serde(default)]
    pub text_arg: Option<String>,
    #[serde(default)]
    pub flags: TriggerFlags,
}

impl TriggerDefinition {
    pub fn allows_multiple(&self) -> bool {
        self.flags.contains(TriggerFlags::ALLOW_MULTIPLE)
    }

    pub fn fires_while_charmed(&self) -> bool {
        self.flags.contains(TriggerFlags::CHARMED_OK)
    }

    pub fn is_global(&self) -> bool {
        self.flags.contains(TriggerFlags::GLOBAL)
    }

    /// True when this definition listens for an event whose text argument is
    /// mandatory but carries none
    pub fn missing_text_arg(&self, event: EventMask) -> bool {
        (self.events & event).requires_text_arg()
            && self.text_arg.as_deref().map_or(true, |arg| arg.trim().is_empty())
    }
}

/// Quest content definition, reduced to what trigger dispatch needs:
/// identity plus the world-scoped triggers overlaid onto the actor's room
/// during the start/finish combo dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestDefinition {
    pub vnum: QuestVnum,
    pub name: String,
    #[serde(default)]
    pub world_triggers: Vec<TriggerVnum>,
}
