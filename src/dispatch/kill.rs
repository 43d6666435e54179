//! Kill-event propagation
//!
//! When something dies, the killer, the killer's present allies, and every
//! item they wear or carry (including nested container contents) each get a
//! kill dispatch. Every eligible trigger always runs; the aggregate outcome
//! only tells the caller whether to suppress its own death handling.

use crate::dispatch::{creature, item, vehicle};
use crate::script::context::Outcome;
use crate::script::engine::ScriptEngine;
use crate::world::{CreatureId, EntityRef, ItemId, VehicleId, World};

/// Fire kill dispatch for one death.
///
/// With no killer, or a suicide, creature and item kill triggers stay
/// silent; a killing vehicle still gets its dispatch. The result is the AND
/// of every individual outcome.
pub fn run_kill_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    dying: CreatureId,
    killer: Option<CreatureId>,
    killer_vehicle: Option<VehicleId>,
) -> Outcome {
    let mut result = Outcome::Allowed;

    let credited = killer.filter(|k| *k != dying);
    if let Some(killer) = credited {
        for ally in killer_and_allies(world, killer) {
            if !world.alive(EntityRef::Creature(ally)) {
                continue;
            }
            let one = creature::kill_triggers(world, engine, ally, dying, killer);
            result = result.and(one);

            // Items are snapshotted per creature so a script purging one
            // mid-walk cannot derail the traversal
            for carried in carried_items(world, ally) {
                result = result.and(propagate_to_item(world, engine, carried, dying, killer));
            }
        }
    }

    if let Some(veh) = killer_vehicle {
        if world.alive(EntityRef::Vehicle(veh)) {
            let killer_for_vehicle = credited.unwrap_or(dying);
            let one = vehicle::kill_triggers(world, engine, veh, dying, killer_for_vehicle);
            result = result.and(one.collapse_gone());
        }
    }

    result
}

/// Depth-first, pre-order: the item itself, then its contents
fn propagate_to_item(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    target: ItemId,
    dying: CreatureId,
    killer: CreatureId,
) -> Outcome {
    if !world.alive(EntityRef::Item(target)) {
        return Outcome::Allowed;
    }
    let mut result = item::kill_triggers(world, engine, target, dying, killer).collapse_gone();

    let contents: Vec<ItemId> = world
        .item(target)
        .map(|i| i.contains.clone())
        .unwrap_or_default();
    for inner in contents {
        result = result.and(propagate_to_item(world, engine, inner, dying, killer));
    }
    result
}

/// The killer plus every grouped ally in the killer's room
fn killer_and_allies(world: &World, killer: CreatureId) -> Vec<CreatureId> {
    let Some(killer_creature) = world.creature(killer) else {
        return Vec::new();
    };
    let room = killer_creature.room;
    let group = killer_creature.group;
    world
        .creatures_in_room(room)
        .into_iter()
        .filter(|id| {
            *id == killer
                || (group.is_some() && world.creature(*id).is_some_and(|c| c.group == group))
        })
        .collect()
}

/// Worn items in slot order, then carried inventory
fn carried_items(world: &World, ch: CreatureId) -> Vec<ItemId> {
    let Some(creature) = world.creature(ch) else {
        return Vec::new();
    };
    let mut worn: Vec<_> = creature.equipment.iter().map(|(s, i)| (*s, *i)).collect();
    worn.sort_by_key(|(slot, _)| *slot);
    let mut items: Vec<ItemId> = worn.into_iter().map(|(_, i)| i).collect();
    items.extend(creature.inventory.iter().copied());
    items
}
