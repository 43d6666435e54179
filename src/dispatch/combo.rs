//! Fixed-order dispatch sequences spanning multiple entity kinds
//!
//! One typed command, purchase, or quest transition must consult rooms,
//! creatures, items, and vehicles in a deterministic order with the
//! short-circuit rule that fits the action: commands stop at the first kind
//! that intercepts, purchases stop at the first block, quest transitions
//! stop at the first block with the room step evaluated last under the
//! quest's own trigger overlay.

use crate::core::types::{CurrencyId, QuestVnum};
use crate::dispatch::{creature, item, room, vehicle};
use crate::script::context::{Outcome, QuestContext};
use crate::script::engine::ScriptEngine;
use crate::script::matching::CommandMatch;
use crate::script::trigger::EventMask;
use crate::world::{CreatureId, EntityRef, ItemId, World};

/// Route a typed command through every kind that can intercept it:
/// the room first, then creatures, then the actor's items, then vehicles.
///
/// Returns true when some trigger intercepted the command; the caller must
/// then skip its normal command handling.
pub fn command_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    actor: CreatureId,
    typed: &str,
    argument: &str,
    mode: CommandMatch,
) -> bool {
    let Some(actor_room) = world.creature(actor).map(|c| c.room) else {
        return false;
    };
    if room::command_triggers(world, engine, actor_room, actor, typed, argument, mode) {
        return true;
    }
    if !world.alive(EntityRef::Creature(actor)) {
        return true;
    }
    if creature::command_triggers(world, engine, actor, typed, argument, mode) {
        return true;
    }
    if !world.alive(EntityRef::Creature(actor)) {
        return true;
    }
    if item::command_triggers(world, engine, actor, typed, argument, mode) {
        return true;
    }
    if !world.alive(EntityRef::Creature(actor)) {
        return true;
    }
    for veh in world.vehicles_in_room(actor_room) {
        if vehicle::command_triggers(world, engine, veh, actor, typed, argument, mode) {
            return true;
        }
        if !world.alive(EntityRef::Creature(actor)) {
            return true;
        }
    }
    false
}

/// Route a purchase through every kind that can veto it. The first block
/// ends the sequence; later kinds are not consulted.
#[allow(clippy::too_many_arguments)]
pub fn buy_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    actor: CreatureId,
    shopkeeper: Option<CreatureId>,
    bought: Option<ItemId>,
    cost: i64,
    currency: Option<CurrencyId>,
    location_bits: u32,
) -> Outcome {
    let Some(actor_room) = world.creature(actor).map(|c| c.room) else {
        return Outcome::Allowed;
    };

    let outcome = room::buy_triggers(
        world, engine, actor_room, actor, shopkeeper, bought, cost, location_bits,
    );
    if !outcome.allowed() || !world.alive(EntityRef::Creature(actor)) {
        return Outcome::Blocked;
    }

    if let Some(keeper) = shopkeeper {
        let outcome = creature::buy_triggers(
            world, engine, keeper, actor, bought, cost, currency, location_bits,
        );
        if !outcome.allowed() || !world.alive(EntityRef::Creature(actor)) {
            return Outcome::Blocked;
        }
    }

    for carried in actor_items(world, actor) {
        if !world.alive(EntityRef::Item(carried)) {
            continue;
        }
        let outcome = item::buy_triggers(
            world, engine, carried, actor, shopkeeper, bought, cost, location_bits,
        );
        if !outcome.allowed() || !world.alive(EntityRef::Creature(actor)) {
            return Outcome::Blocked;
        }
    }

    for veh in world.vehicles_in_room(actor_room) {
        let outcome = vehicle::buy_triggers(
            world, engine, veh, actor, shopkeeper, bought, cost, location_bits,
        );
        if !outcome.allowed() || !world.alive(EntityRef::Creature(actor)) {
            return Outcome::Blocked;
        }
    }

    Outcome::Allowed
}

/// Dispatch a quest start through everything near the actor
pub fn start_quest_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    actor: CreatureId,
    quest_vnum: QuestVnum,
    instance: Option<u64>,
) -> Outcome {
    quest_combo(world, engine, actor, quest_vnum, instance, EventMask::START_QUEST)
}

/// Dispatch a quest completion through everything near the actor
pub fn finish_quest_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    actor: CreatureId,
    quest_vnum: QuestVnum,
    instance: Option<u64>,
) -> Outcome {
    quest_combo(world, engine, actor, quest_vnum, instance, EventMask::FINISH_QUEST)
}

/// Creature, then item, then vehicle, then the room last. The room step
/// merges the quest's own world-scoped triggers as a read-time overlay, so
/// the room's stored trigger list is never modified on any path.
fn quest_combo(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    actor: CreatureId,
    quest_vnum: QuestVnum,
    instance: Option<u64>,
    event: EventMask,
) -> Outcome {
    let Some(def) = world.quest_def(quest_vnum) else {
        tracing::warn!(vnum = quest_vnum.0, "quest dispatch for unknown quest");
        return Outcome::Allowed;
    };
    let quest = QuestContext {
        vnum: quest_vnum,
        name: def.name.clone(),
        instance,
    };
    let overlay = def.world_triggers.clone();
    let Some(actor_room) = world.creature(actor).map(|c| c.room) else {
        return Outcome::Allowed;
    };

    for ch in world.creatures_in_room(actor_room) {
        if ch == actor {
            continue;
        }
        let outcome = creature::quest_triggers(world, engine, ch, actor, &quest, event);
        if !outcome.allowed() || !world.alive(EntityRef::Creature(actor)) {
            return Outcome::Blocked;
        }
    }

    for carried in actor_items(world, actor) {
        if !world.alive(EntityRef::Item(carried)) {
            continue;
        }
        let outcome = item::quest_triggers(world, engine, carried, actor, &quest, event);
        if !outcome.allowed() || !world.alive(EntityRef::Creature(actor)) {
            return Outcome::Blocked;
        }
    }

    for veh in world.vehicles_in_room(actor_room) {
        let outcome = vehicle::quest_triggers(world, engine, veh, actor, &quest, event);
        if !outcome.allowed() || !world.alive(EntityRef::Creature(actor)) {
            return Outcome::Blocked;
        }
    }

    room::quest_triggers(world, engine, actor_room, actor, &quest, event, &overlay)
}

/// The actor's worn items in slot order, then carried inventory
fn actor_items(world: &World, actor: CreatureId) -> Vec<ItemId> {
    let Some(creature) = world.creature(actor) else {
        return Vec::new();
    };
    let mut worn: Vec<_> = creature.equipment.iter().map(|(s, i)| (*s, *i)).collect();
    worn.sort_by_key(|(slot, _)| *slot);
    let mut items: Vec<ItemId> = worn.into_iter().map(|(_, i)| i).collect();
    items.extend(creature.inventory.iter().copied());
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{RoomVnum, TriggerVnum};
    use crate::script::engine::RecordingEngine;
    use crate::script::trigger::{
        AttachKind, QuestDefinition, TriggerDefinition, TriggerFlags,
    };
    use crate::world::RoomId;

    fn setup() -> (World, RoomId, CreatureId) {
        let mut world = World::new(53);
        let room = world.create_room(RoomVnum(1), false);
        let player = world.spawn_creature("hero", room, true).unwrap();
        (world, room, player)
    }

    fn def(vnum: u32, attach: AttachKind, events: EventMask, text: Option<&str>) -> TriggerDefinition {
        TriggerDefinition {
            vnum: TriggerVnum(vnum),
            name: format!("trigger {vnum}"),
            attach,
            events,
            numeric_arg: 100,
            text_arg: text.map(String::from),
            flags: TriggerFlags::empty(),
        }
    }

    /// BUY reads the numeric argument as a location bitmask; 0 means the
    /// trigger fires regardless of the shop's location bits
    fn buy_def(vnum: u32, attach: AttachKind) -> TriggerDefinition {
        TriggerDefinition {
            numeric_arg: 0,
            ..def(vnum, attach, EventMask::BUY, None)
        }
    }

    #[test]
    fn test_command_room_takes_precedence() {
        let (mut world, room, player) = setup();
        let guard = world.spawn_creature("guard", room, false).unwrap();
        world.define_trigger(TriggerDefinition {
            numeric_arg: 0,
            ..def(1, AttachKind::Room, EventMask::COMMAND, Some("pray"))
        });
        world.define_trigger(TriggerDefinition {
            numeric_arg: 0,
            ..def(2, AttachKind::Creature, EventMask::COMMAND, Some("pray"))
        });
        world
            .attach_trigger(EntityRef::Room(room), TriggerVnum(1))
            .unwrap();
        world
            .attach_trigger(EntityRef::Creature(guard), TriggerVnum(2))
            .unwrap();

        let mut engine = RecordingEngine::new();
        assert!(command_triggers(
            &mut world,
            &mut engine,
            player,
            "pray",
            "",
            CommandMatch::Exact
        ));
        assert_eq!(engine.count_for(TriggerVnum(1)), 1);
        assert_eq!(engine.count_for(TriggerVnum(2)), 0);
    }

    #[test]
    fn test_command_falls_through_kinds() {
        let (mut world, room, player) = setup();
        let cart = world.spawn_vehicle("cart", room).unwrap();
        world.define_trigger(TriggerDefinition {
            numeric_arg: 0,
            ..def(1, AttachKind::Vehicle, EventMask::COMMAND, Some("board"))
        });
        world
            .attach_trigger(EntityRef::Vehicle(cart), TriggerVnum(1))
            .unwrap();

        let mut engine = RecordingEngine::new();
        assert!(command_triggers(
            &mut world,
            &mut engine,
            player,
            "board",
            "cart",
            CommandMatch::Exact
        ));
        assert!(!command_triggers(
            &mut world,
            &mut engine,
            player,
            "dance",
            "",
            CommandMatch::Exact
        ));
    }

    #[test]
    fn test_buy_block_short_circuits() {
        let (mut world, room, player) = setup();
        let keeper = world.spawn_creature("merchant", room, false).unwrap();
        let charm = world.spawn_item_carried("lucky charm", player).unwrap();
        // numeric argument 0 = no location restriction on the buy gate
        world.define_trigger(buy_def(1, AttachKind::Creature));
        world.define_trigger(buy_def(2, AttachKind::Item));
        world
            .attach_trigger(EntityRef::Creature(keeper), TriggerVnum(1))
            .unwrap();
        world
            .attach_trigger(EntityRef::Item(charm), TriggerVnum(2))
            .unwrap();

        let mut engine = RecordingEngine::new();
        engine.set_result(TriggerVnum(1), 0);
        let outcome = buy_triggers(
            &mut world,
            &mut engine,
            player,
            Some(keeper),
            None,
            25,
            None,
            0,
        );
        assert_eq!(outcome, Outcome::Blocked);
        // The shopkeeper blocked, so the item step never ran
        assert_eq!(engine.count_for(TriggerVnum(2)), 0);
    }

    #[test]
    fn test_buy_allow_consults_every_kind() {
        let (mut world, room, player) = setup();
        let keeper = world.spawn_creature("merchant", room, false).unwrap();
        let charm = world.spawn_item_carried("lucky charm", player).unwrap();
        let cart = world.spawn_vehicle("cart", room).unwrap();
        world.define_trigger(buy_def(1, AttachKind::Creature));
        world.define_trigger(buy_def(2, AttachKind::Item));
        world.define_trigger(buy_def(3, AttachKind::Vehicle));
        world
            .attach_trigger(EntityRef::Creature(keeper), TriggerVnum(1))
            .unwrap();
        world
            .attach_trigger(EntityRef::Item(charm), TriggerVnum(2))
            .unwrap();
        world
            .attach_trigger(EntityRef::Vehicle(cart), TriggerVnum(3))
            .unwrap();

        let mut engine = RecordingEngine::new();
        let outcome = buy_triggers(
            &mut world,
            &mut engine,
            player,
            Some(keeper),
            None,
            25,
            None,
            0,
        );
        assert!(outcome.allowed());
        assert_eq!(engine.invocation_count(), 3);
    }

    #[test]
    fn test_quest_room_list_untouched_after_dispatch() {
        let (mut world, room, player) = setup();
        world.define_trigger(def(9, AttachKind::Room, EventMask::START_QUEST, None));
        world.define_quest(QuestDefinition {
            vnum: QuestVnum(300),
            name: "The Lost Caravan".into(),
            world_triggers: vec![TriggerVnum(9)],
        });

        let mut engine = RecordingEngine::new();
        let outcome =
            start_quest_triggers(&mut world, &mut engine, player, QuestVnum(300), None);
        assert!(outcome.allowed());
        assert_eq!(engine.count_for(TriggerVnum(9)), 1);
        assert!(world.script(EntityRef::Room(room)).is_none());

        // Same guarantee when the overlay trigger blocks
        engine.set_result(TriggerVnum(9), 0);
        let outcome =
            start_quest_triggers(&mut world, &mut engine, player, QuestVnum(300), None);
        assert_eq!(outcome, Outcome::Blocked);
        assert!(world.script(EntityRef::Room(room)).is_none());
    }

    #[test]
    fn test_quest_creature_block_skips_room_step() {
        let (mut world, room, player) = setup();
        let giver = world.spawn_creature("quartermaster", room, false).unwrap();
        world.define_trigger(def(1, AttachKind::Creature, EventMask::FINISH_QUEST, None));
        world.define_trigger(def(9, AttachKind::Room, EventMask::FINISH_QUEST, None));
        world
            .attach_trigger(EntityRef::Creature(giver), TriggerVnum(1))
            .unwrap();
        world.define_quest(QuestDefinition {
            vnum: QuestVnum(301),
            name: "Tribute".into(),
            world_triggers: vec![TriggerVnum(9)],
        });

        let mut engine = RecordingEngine::new();
        engine.set_result(TriggerVnum(1), 0);
        let outcome =
            finish_quest_triggers(&mut world, &mut engine, player, QuestVnum(301), None);
        assert_eq!(outcome, Outcome::Blocked);
        assert_eq!(engine.count_for(TriggerVnum(9)), 0);
    }

    #[test]
    fn test_unknown_quest_allows() {
        let (mut world, _room, player) = setup();
        let mut engine = RecordingEngine::new();
        let outcome =
            start_quest_triggers(&mut world, &mut engine, player, QuestVnum(999), None);
        assert!(outcome.allowed());
        assert_eq!(engine.invocation_count(), 0);
    }
}
