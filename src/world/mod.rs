//! World state: entity arenas, content libraries, and the shared RNG
//!
//! The world is the single mutable resource every dispatch call works
//! against. Entities are stored in generational arenas so that a handle held
//! across a script invocation can be re-checked for liveness afterwards.

pub mod arena;
pub mod entity;
pub mod loader;

use ahash::AHashMap;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::core::config::TriggerConfig;
use crate::core::error::{Result, TriggerError};
use crate::core::types::{InstanceId, QuestVnum, RoomVnum, Tick, TriggerVnum, WearSlot};
use crate::script::live::LiveScript;
use crate::script::trigger::{AttachKind, QuestDefinition, TriggerDefinition};
use crate::world::arena::{Arena, RawId};
use crate::world::entity::{Creature, Item, ItemLocation, Room, Vehicle};

/// Handle to a creature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CreatureId(pub(crate) RawId);

/// Handle to an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemId(pub(crate) RawId);

/// Handle to a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoomId(pub(crate) RawId);

/// Handle to a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VehicleId(pub(crate) RawId);

/// Any dispatchable entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Creature(CreatureId),
    Item(ItemId),
    Room(RoomId),
    Vehicle(VehicleId),
}

impl EntityRef {
    pub fn attach_kind(&self) -> AttachKind {
        match self {
            EntityRef::Creature(_) => AttachKind::Creature,
            EntityRef::Item(_) => AttachKind::Item,
            EntityRef::Room(_) => AttachKind::Room,
            EntityRef::Vehicle(_) => AttachKind::Vehicle,
        }
    }
}

/// The game world containing all entities and content libraries
pub struct World {
    pub current_tick: Tick,
    pub rng: ChaCha8Rng,
    pub config: TriggerConfig,
    creatures: Arena<Creature>,
    items: Arena<Item>,
    rooms: Arena<Room>,
    vehicles: Arena<Vehicle>,
    trigger_library: AHashMap<TriggerVnum, TriggerDefinition>,
    quest_library: AHashMap<QuestVnum, QuestDefinition>,
    next_instance: u64,
}

impl World {
    pub fn new(seed: u64) -> Self {
        Self::with_config(seed, TriggerConfig::default())
    }

    pub fn with_config(seed: u64, config: TriggerConfig) -> Self {
        // An invalid config (e.g. a non-positive roll ceiling) would panic
        // deep inside the percent gate; reject it up front instead
        let config = match config.validate() {
            Ok(()) => config,
            Err(reason) => {
                tracing::warn!(%reason, "invalid trigger config, using defaults");
                TriggerConfig::default()
            }
        };
        Self {
            current_tick: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
            config,
            creatures: Arena::new(),
            items: Arena::new(),
            rooms: Arena::new(),
            vehicles: Arena::new(),
            trigger_library: AHashMap::new(),
            quest_library: AHashMap::new(),
            next_instance: 1,
        }
    }

    pub fn tick(&mut self) {
        self.current_tick += 1;
    }

    // === Content libraries ===

    pub fn define_trigger(&mut self, def: TriggerDefinition) {
        self.trigger_library.insert(def.vnum, def);
    }

    pub fn define_quest(&mut self, def: QuestDefinition) {
        self.quest_library.insert(def.vnum, def);
    }

    pub fn trigger_def(&self, vnum: TriggerVnum) -> Option<&TriggerDefinition> {
        self.trigger_library.get(&vnum)
    }

    pub fn quest_def(&self, vnum: QuestVnum) -> Option<&QuestDefinition> {
        self.quest_library.get(&vnum)
    }

    // === Spawning ===

    pub fn create_room(&mut self, vnum: RoomVnum, instanced: bool) -> RoomId {
        RoomId(self.rooms.insert(Room::new(vnum, instanced)))
    }

    pub fn spawn_creature(
        &mut self,
        name: impl Into<String>,
        room: RoomId,
        is_player: bool,
    ) -> Result<CreatureId> {
        if !self.rooms.contains(room.0) {
            return Err(TriggerError::RoomNotFound(room));
        }
        let id = CreatureId(self.creatures.insert(Creature::new(name, room, is_player)));
        self.room_mut(room)?.occupants.push(id);
        Ok(id)
    }

    pub fn spawn_item_in_room(&mut self, name: impl Into<String>, room: RoomId) -> Result<ItemId> {
        if !self.rooms.contains(room.0) {
            return Err(TriggerError::RoomNotFound(room));
        }
        let id = ItemId(self.items.insert(Item::new(name, ItemLocation::InRoom(room))));
        self.room_mut(room)?.items.push(id);
        Ok(id)
    }

    pub fn spawn_item_carried(
        &mut self,
        name: impl Into<String>,
        holder: CreatureId,
    ) -> Result<ItemId> {
        if !self.creatures.contains(holder.0) {
            return Err(TriggerError::CreatureNotFound(holder));
        }
        let id = ItemId(
            self.items
                .insert(Item::new(name, ItemLocation::CarriedBy(holder))),
        );
        self.creature_mut(holder)?.inventory.push(id);
        Ok(id)
    }

    pub fn spawn_item_inside(
        &mut self,
        name: impl Into<String>,
        container: ItemId,
    ) -> Result<ItemId> {
        if !self.items.contains(container.0) {
            return Err(TriggerError::ItemNotFound(container));
        }
        let id = ItemId(
            self.items
                .insert(Item::new(name, ItemLocation::Inside(container))),
        );
        self.item_mut(container)?.contains.push(id);
        Ok(id)
    }

    pub fn spawn_vehicle(&mut self, name: impl Into<String>, room: RoomId) -> Result<VehicleId> {
        if !self.rooms.contains(room.0) {
            return Err(TriggerError::RoomNotFound(room));
        }
        let id = VehicleId(self.vehicles.insert(Vehicle::new(name, room)));
        self.room_mut(room)?.vehicles.push(id);
        Ok(id)
    }

    // === Accessors ===

    pub fn creature(&self, id: CreatureId) -> Option<&Creature> {
        self.creatures.get(id.0)
    }

    pub fn creature_mut(&mut self, id: CreatureId) -> Result<&mut Creature> {
        self.creatures
            .get_mut(id.0)
            .ok_or(TriggerError::CreatureNotFound(id))
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(id.0)
    }

    pub fn item_mut(&mut self, id: ItemId) -> Result<&mut Item> {
        self.items.get_mut(id.0).ok_or(TriggerError::ItemNotFound(id))
    }

    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(id.0)
    }

    pub fn room_mut(&mut self, id: RoomId) -> Result<&mut Room> {
        self.rooms.get_mut(id.0).ok_or(TriggerError::RoomNotFound(id))
    }

    pub fn vehicle(&self, id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.get(id.0)
    }

    pub fn vehicle_mut(&mut self, id: VehicleId) -> Result<&mut Vehicle> {
        self.vehicles
            .get_mut(id.0)
            .ok_or(TriggerError::VehicleNotFound(id))
    }

    /// Liveness check for any entity kind
    pub fn alive(&self, entity: EntityRef) -> bool {
        match entity {
            EntityRef::Creature(id) => self.creatures.contains(id.0),
            EntityRef::Item(id) => self.items.contains(id.0),
            EntityRef::Room(id) => self.rooms.contains(id.0),
            EntityRef::Vehicle(id) => self.vehicles.contains(id.0),
        }
    }

    /// The room an entity is (transitively) located in
    pub fn entity_room(&self, entity: EntityRef) -> Option<RoomId> {
        match entity {
            EntityRef::Creature(id) => self.creature(id).map(|c| c.room),
            EntityRef::Room(id) => self.rooms.contains(id.0).then_some(id),
            EntityRef::Vehicle(id) => self.vehicle(id).map(|v| v.room),
            EntityRef::Item(id) => {
                let mut current = id;
                // Containers nest; walk up until something sits in a room
                loop {
                    match self.item(current)?.location {
                        ItemLocation::InRoom(room) => return Some(room),
                        ItemLocation::CarriedBy(ch) | ItemLocation::WornBy(ch, _) => {
                            return self.creature(ch).map(|c| c.room);
                        }
                        ItemLocation::Inside(container) => current = container,
                    }
                }
            }
        }
    }

    /// True when at least one real player occupies the room
    pub fn player_in_room(&self, room: RoomId) -> bool {
        self.room(room).is_some_and(|r| {
            r.occupants
                .iter()
                .any(|id| self.creature(*id).is_some_and(|c| c.is_player))
        })
    }

    /// Snapshot of the creatures currently in a room
    pub fn creatures_in_room(&self, room: RoomId) -> Vec<CreatureId> {
        self.room(room).map(|r| r.occupants.clone()).unwrap_or_default()
    }

    /// Snapshot of the items currently on the room floor
    pub fn items_in_room(&self, room: RoomId) -> Vec<ItemId> {
        self.room(room).map(|r| r.items.clone()).unwrap_or_default()
    }

    /// Snapshot of the vehicles currently in a room
    pub fn vehicles_in_room(&self, room: RoomId) -> Vec<VehicleId> {
        self.room(room).map(|r| r.vehicles.clone()).unwrap_or_default()
    }

    // === Movement and equipment ===

    pub fn move_creature(&mut self, id: CreatureId, to: RoomId) -> Result<()> {
        if !self.rooms.contains(to.0) {
            return Err(TriggerError::RoomNotFound(to));
        }
        let from = self.creature_mut(id)?.room;
        self.room_mut(from)?.occupants.retain(|c| *c != id);
        self.room_mut(to)?.occupants.push(id);
        self.creature_mut(id)?.room = to;
        Ok(())
    }

    /// Move a carried item into an equipment slot
    pub fn equip_item(&mut self, ch: CreatureId, item: ItemId, slot: WearSlot) -> Result<()> {
        let creature = self.creature_mut(ch)?;
        creature.inventory.retain(|i| *i != item);
        creature.equipment.insert(slot, item);
        self.item_mut(item)?.location = ItemLocation::WornBy(ch, slot);
        Ok(())
    }

    // === Scripts ===

    pub fn script(&self, entity: EntityRef) -> Option<&LiveScript> {
        match entity {
            EntityRef::Creature(id) => self.creature(id)?.script.as_ref(),
            EntityRef::Item(id) => self.item(id)?.script.as_ref(),
            EntityRef::Room(id) => self.room(id)?.script.as_ref(),
            EntityRef::Vehicle(id) => self.vehicle(id)?.script.as_ref(),
        }
    }

    pub fn script_mut(&mut self, entity: EntityRef) -> Option<&mut LiveScript> {
        match entity {
            EntityRef::Creature(id) => self.creatures.get_mut(id.0)?.script.as_mut(),
            EntityRef::Item(id) => self.items.get_mut(id.0)?.script.as_mut(),
            EntityRef::Room(id) => self.rooms.get_mut(id.0)?.script.as_mut(),
            EntityRef::Vehicle(id) => self.vehicles.get_mut(id.0)?.script.as_mut(),
        }
    }

    /// Get the entity's script, creating an empty one if absent.
    /// Returns `(script, created)` so short-lived scripts can be torn down.
    pub fn ensure_script(&mut self, entity: EntityRef) -> Result<(&mut LiveScript, bool)> {
        let slot = match entity {
            EntityRef::Creature(id) => &mut self.creature_mut(id)?.script,
            EntityRef::Item(id) => &mut self.item_mut(id)?.script,
            EntityRef::Room(id) => &mut self.room_mut(id)?.script,
            EntityRef::Vehicle(id) => &mut self.vehicle_mut(id)?.script,
        };
        let created = slot.is_none();
        Ok((slot.get_or_insert_with(LiveScript::new), created))
    }

    /// Drop an entity's script entirely
    pub fn remove_script(&mut self, entity: EntityRef) {
        let slot = match entity {
            EntityRef::Creature(id) => self.creatures.get_mut(id.0).map(|e| &mut e.script),
            EntityRef::Item(id) => self.items.get_mut(id.0).map(|e| &mut e.script),
            EntityRef::Room(id) => self.rooms.get_mut(id.0).map(|e| &mut e.script),
            EntityRef::Vehicle(id) => self.vehicles.get_mut(id.0).map(|e| &mut e.script),
        };
        if let Some(slot) = slot {
            *slot = None;
        }
    }

    /// Attach a defined trigger to an entity, validating the attach kind
    pub fn attach_trigger(&mut self, entity: EntityRef, vnum: TriggerVnum) -> Result<InstanceId> {
        let def = self
            .trigger_library
            .get(&vnum)
            .ok_or(TriggerError::UnknownTrigger(vnum))?;
        if def.attach != entity.attach_kind() {
            return Err(TriggerError::AttachMismatch {
                vnum,
                expected: def.attach,
                actual: entity.attach_kind(),
            });
        }
        let id = self.allocate_instance_id();
        let (script, _) = self.ensure_script(entity)?;
        script.attach(id, vnum);
        Ok(id)
    }

    pub fn detach_trigger(&mut self, entity: EntityRef, id: InstanceId) -> bool {
        self.script_mut(entity).is_some_and(|s| s.detach(id))
    }

    pub fn allocate_instance_id(&mut self) -> InstanceId {
        let id = InstanceId(self.next_instance);
        self.next_instance += 1;
        id
    }

    // === Purging ===

    /// Remove a creature from the world along with everything it carries
    pub fn purge_creature(&mut self, id: CreatureId) {
        let Some(creature) = self.creatures.get(id.0) else {
            return;
        };
        let room = creature.room;
        let carried: Vec<ItemId> = creature
            .inventory
            .iter()
            .copied()
            .chain(creature.equipment.values().copied())
            .collect();
        for item in carried {
            self.purge_item(item);
        }
        if let Some(room) = self.rooms.get_mut(room.0) {
            room.occupants.retain(|c| *c != id);
        }
        self.creatures.remove(id.0);
    }

    /// Remove an item and its entire contents from the world
    pub fn purge_item(&mut self, id: ItemId) {
        let Some(item) = self.items.get(id.0) else {
            return;
        };
        let location = item.location;
        let contents = item.contains.clone();
        for inner in contents {
            self.purge_item(inner);
        }
        match location {
            ItemLocation::InRoom(room) => {
                if let Some(room) = self.rooms.get_mut(room.0) {
                    room.items.retain(|i| *i != id);
                }
            }
            ItemLocation::CarriedBy(ch) => {
                if let Some(ch) = self.creatures.get_mut(ch.0) {
                    ch.inventory.retain(|i| *i != id);
                }
            }
            ItemLocation::WornBy(ch, slot) => {
                if let Some(ch) = self.creatures.get_mut(ch.0) {
                    ch.equipment.remove(&slot);
                }
            }
            ItemLocation::Inside(container) => {
                if let Some(container) = self.items.get_mut(container.0) {
                    container.contains.retain(|i| *i != id);
                }
            }
        }
        self.items.remove(id.0);
    }

    pub fn purge_vehicle(&mut self, id: VehicleId) {
        let Some(vehicle) = self.vehicles.get(id.0) else {
            return;
        };
        let room = vehicle.room;
        if let Some(room) = self.rooms.get_mut(room.0) {
            room.vehicles.retain(|v| *v != id);
        }
        self.vehicles.remove(id.0);
    }
}
