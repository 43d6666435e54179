//! Entity definitions for the four dispatchable kinds

use ahash::AHashMap;

use crate::core::types::{RoomVnum, WearSlot};
use crate::script::live::LiveScript;
use crate::world::{CreatureId, ItemId, RoomId, VehicleId};

/// A creature: player character or NPC
#[derive(Debug)]
pub struct Creature {
    pub name: String,
    pub room: RoomId,
    pub is_player: bool,
    pub charmed: bool,
    pub health: i32,
    pub max_health: i32,
    /// Creatures sharing a group id fight as allies
    pub group: Option<u32>,
    pub inventory: Vec<ItemId>,
    pub equipment: AHashMap<WearSlot, ItemId>,
    /// Actors this creature has a grudge against (memory triggers)
    pub memory: Vec<CreatureId>,
    pub script: Option<LiveScript>,
}

impl Creature {
    pub fn new(name: impl Into<String>, room: RoomId, is_player: bool) -> Self {
        Self {
            name: name.into(),
            room,
            is_player,
            charmed: false,
            health: 100,
            max_health: 100,
            group: None,
            inventory: Vec::new(),
            equipment: AHashMap::new(),
            memory: Vec::new(),
            script: None,
        }
    }

    pub fn health_percent(&self) -> i64 {
        if self.max_health <= 0 {
            return 0;
        }
        (self.health as i64 * 100) / self.max_health as i64
    }

    pub fn remembers(&self, actor: CreatureId) -> bool {
        self.memory.contains(&actor)
    }

    pub fn remember(&mut self, actor: CreatureId) {
        if !self.memory.contains(&actor) {
            self.memory.push(actor);
        }
    }

    pub fn forget(&mut self, actor: CreatureId) {
        self.memory.retain(|id| *id != actor);
    }
}

/// Where an item currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemLocation {
    InRoom(RoomId),
    CarriedBy(CreatureId),
    WornBy(CreatureId, WearSlot),
    Inside(ItemId),
}

/// An item; may contain other items
#[derive(Debug)]
pub struct Item {
    pub name: String,
    pub location: ItemLocation,
    pub contains: Vec<ItemId>,
    pub script: Option<LiveScript>,
}

impl Item {
    pub fn new(name: impl Into<String>, location: ItemLocation) -> Self {
        Self {
            name: name.into(),
            location,
            contains: Vec::new(),
            script: None,
        }
    }
}

/// A room in the world
#[derive(Debug)]
pub struct Room {
    pub vnum: RoomVnum,
    /// Instanced adventure rooms never qualify for reset scheduling
    pub instanced: bool,
    pub occupants: Vec<CreatureId>,
    pub items: Vec<ItemId>,
    pub vehicles: Vec<VehicleId>,
    pub script: Option<LiveScript>,
}

impl Room {
    pub fn new(vnum: RoomVnum, instanced: bool) -> Self {
        Self {
            vnum,
            instanced,
            occupants: Vec::new(),
            items: Vec::new(),
            vehicles: Vec::new(),
            script: None,
        }
    }
}

/// A vehicle: cart, ship, or other mobile structure
#[derive(Debug)]
pub struct Vehicle {
    pub name: String,
    pub room: RoomId,
    pub script: Option<LiveScript>,
}

impl Vehicle {
    pub fn new(name: impl Into<String>, room: RoomId) -> Self {
        Self {
            name: name.into(),
            room,
            script: None,
        }
    }
}
