//! Item trigger dispatch
//!
//! Manipulation events (get, drop, give, wear, remove, consume) report
//! `TargetGone` when the script destroys the item, so callers can abort the
//! rest of the manipulation instead of touching a freed handle.

use crate::core::types::AbilityId;
use crate::dispatch::run::{run_triggers, LoopPolicy, NumericGate, TextFilter};
use crate::script::context::{DispatchContext, Outcome, QuestContext};
use crate::script::engine::ScriptEngine;
use crate::script::matching::CommandMatch;
use crate::script::trigger::EventMask;
use crate::world::{CreatureId, EntityRef, ItemId, World};

fn item_ctx(actor: Option<CreatureId>) -> DispatchContext {
    DispatchContext {
        actor,
        ..DispatchContext::default()
    }
}

/// Periodic dispatch for one item
pub fn random_triggers(world: &mut World, engine: &mut dyn ScriptEngine, item: ItemId) -> Outcome {
    run_triggers(
        world,
        engine,
        EntityRef::Item(item),
        EventMask::RANDOM,
        NumericGate::Percent,
        TextFilter::None,
        LoopPolicy::FirstMatch,
        &DispatchContext::new(),
    )
    .outcome
    .collapse_gone()
}

/// An actor is picking the item up. `TargetGone` means the item no longer
/// exists; `Blocked` means leave it where it is.
pub fn get_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    item: ItemId,
    actor: CreatureId,
) -> Outcome {
    run_triggers(
        world,
        engine,
        EntityRef::Item(item),
        EventMask::GET,
        NumericGate::Percent,
        TextFilter::None,
        LoopPolicy::FirstMatch,
        &item_ctx(Some(actor)),
    )
    .outcome
}

/// An actor is dropping the item
pub fn drop_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    item: ItemId,
    actor: CreatureId,
) -> Outcome {
    run_triggers(
        world,
        engine,
        EntityRef::Item(item),
        EventMask::DROP,
        NumericGate::Percent,
        TextFilter::None,
        LoopPolicy::FirstMatch,
        &item_ctx(Some(actor)),
    )
    .outcome
}

/// An actor is giving the item away
pub fn give_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    item: ItemId,
    actor: CreatureId,
    victim: CreatureId,
) -> Outcome {
    let ctx = DispatchContext {
        actor: Some(actor),
        victim: Some(victim),
        ..DispatchContext::default()
    };
    run_triggers(
        world,
        engine,
        EntityRef::Item(item),
        EventMask::GIVE,
        NumericGate::Percent,
        TextFilter::None,
        LoopPolicy::FirstMatch,
        &ctx,
    )
    .outcome
}

/// An actor is equipping the item
pub fn wear_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    item: ItemId,
    actor: CreatureId,
) -> Outcome {
    run_triggers(
        world,
        engine,
        EntityRef::Item(item),
        EventMask::WEAR,
        NumericGate::Always,
        TextFilter::None,
        LoopPolicy::FirstMatch,
        &item_ctx(Some(actor)),
    )
    .outcome
}

/// An actor is unequipping the item
pub fn remove_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    item: ItemId,
    actor: CreatureId,
) -> Outcome {
    run_triggers(
        world,
        engine,
        EntityRef::Item(item),
        EventMask::REMOVE,
        NumericGate::Always,
        TextFilter::None,
        LoopPolicy::FirstMatch,
        &item_ctx(Some(actor)),
    )
    .outcome
}

/// An actor is eating, drinking, or otherwise using the item up.
/// `method` names the consumption verb.
pub fn consume_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    item: ItemId,
    actor: CreatureId,
    method: &str,
) -> Outcome {
    let ctx = DispatchContext {
        actor: Some(actor),
        method: Some(method.to_string()),
        ..DispatchContext::default()
    };
    run_triggers(
        world,
        engine,
        EntityRef::Item(item),
        EventMask::CONSUME,
        NumericGate::Percent,
        TextFilter::None,
        LoopPolicy::FirstMatch,
        &ctx,
    )
    .outcome
}

/// The item's timer ran out
pub fn timer_triggers(world: &mut World, engine: &mut dyn ScriptEngine, item: ItemId) -> Outcome {
    run_triggers(
        world,
        engine,
        EntityRef::Item(item),
        EventMask::TIMER,
        NumericGate::Always,
        TextFilter::None,
        LoopPolicy::FirstMatch,
        &DispatchContext::new(),
    )
    .outcome
}

/// The item was just instantiated from content
pub fn load_triggers(world: &mut World, engine: &mut dyn ScriptEngine, item: ItemId) -> Outcome {
    run_triggers(
        world,
        engine,
        EntityRef::Item(item),
        EventMask::LOAD,
        NumericGate::Percent,
        TextFilter::None,
        LoopPolicy::FirstMatch,
        &DispatchContext::new(),
    )
    .outcome
}

/// A command was typed; the actor's worn, carried, and room items get a
/// chance to intercept, in that order.
///
/// Worn slots are walked in a fixed order so interception is deterministic.
pub fn command_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    actor: CreatureId,
    typed: &str,
    argument: &str,
    mode: CommandMatch,
) -> bool {
    let Some(creature) = world.creature(actor) else {
        return false;
    };
    let room = creature.room;
    let mut worn: Vec<_> = creature.equipment.iter().map(|(s, i)| (*s, *i)).collect();
    worn.sort_by_key(|(slot, _)| *slot);
    let mut candidates: Vec<ItemId> = worn.into_iter().map(|(_, item)| item).collect();
    candidates.extend(creature.inventory.iter().copied());
    candidates.extend(world.items_in_room(room));

    let ctx = DispatchContext {
        actor: Some(actor),
        command: Some(typed.to_string()),
        argument: Some(argument.to_string()),
        ..DispatchContext::default()
    };
    for item in candidates {
        if !world.alive(EntityRef::Item(item)) {
            continue;
        }
        let result = run_triggers(
            world,
            engine,
            EntityRef::Item(item),
            EventMask::COMMAND,
            NumericGate::Always,
            TextFilter::Command { typed, mode },
            LoopPolicy::FirstMatch,
            &ctx,
        );
        if result.fired > 0 && result.outcome.allowed() {
            return true;
        }
        if !world.alive(EntityRef::Creature(actor)) {
            return true;
        }
    }
    false
}

/// An ability was used with this item as the target
pub fn ability_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    item: ItemId,
    actor: CreatureId,
    ability: AbilityId,
    ability_name: &str,
) -> Outcome {
    let ctx = DispatchContext {
        actor: Some(actor),
        ability: Some(ability),
        ability_name: Some(ability_name.to_string()),
        ..DispatchContext::default()
    };
    run_triggers(
        world,
        engine,
        EntityRef::Item(item),
        EventMask::ABILITY,
        NumericGate::Percent,
        TextFilter::None,
        LoopPolicy::FirstMatch,
        &ctx,
    )
    .outcome
    .collapse_gone()
}

/// An actor is about to leave the room; items on the floor may object
pub fn leave_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    actor: CreatureId,
    direction: Option<crate::core::types::Direction>,
) -> Outcome {
    let Some(room) = world.creature(actor).map(|c| c.room) else {
        return Outcome::Allowed;
    };
    let ctx = DispatchContext {
        actor: Some(actor),
        direction,
        ..DispatchContext::default()
    };
    let mut result = Outcome::Allowed;
    for item in world.items_in_room(room) {
        let one = run_triggers(
            world,
            engine,
            EntityRef::Item(item),
            EventMask::LEAVE,
            NumericGate::Percent,
            TextFilter::None,
            LoopPolicy::FirstMatch,
            &ctx,
        );
        result = result.and(one.outcome.collapse_gone());
        if !world.alive(EntityRef::Creature(actor)) {
            return Outcome::Blocked;
        }
    }
    result
}

/// Something died near this item (kill propagation)
pub fn kill_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    item: ItemId,
    dying: CreatureId,
    killer: CreatureId,
) -> Outcome {
    let ctx = DispatchContext {
        victim: Some(dying),
        killer: Some(killer),
        ..DispatchContext::default()
    };
    run_triggers(
        world,
        engine,
        EntityRef::Item(item),
        EventMask::KILL,
        NumericGate::Percent,
        TextFilter::None,
        LoopPolicy::Canvass,
        &ctx,
    )
    .outcome
}

/// The game came back up from a reboot
pub fn reboot_triggers(world: &mut World, engine: &mut dyn ScriptEngine, item: ItemId) -> Outcome {
    run_triggers(
        world,
        engine,
        EntityRef::Item(item),
        EventMask::REBOOT,
        NumericGate::Percent,
        TextFilter::None,
        LoopPolicy::FirstMatch,
        &DispatchContext::new(),
    )
    .outcome
    .collapse_gone()
}

/// A purchase is being made with this item carried by the buyer
#[allow(clippy::too_many_arguments)]
pub fn buy_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    item: ItemId,
    actor: CreatureId,
    shopkeeper: Option<CreatureId>,
    bought: Option<ItemId>,
    cost: i64,
    location_bits: u32,
) -> Outcome {
    let bought_name = bought
        .and_then(|id| world.item(id))
        .map(|i| i.name.clone())
        .unwrap_or_default();
    let ctx = DispatchContext {
        actor: Some(actor),
        shopkeeper,
        object: bought,
        cost: Some(cost),
        ..DispatchContext::default()
    };
    run_triggers(
        world,
        engine,
        EntityRef::Item(item),
        EventMask::BUY,
        NumericGate::LocationBit(location_bits),
        TextFilter::Wordlist { text: &bought_name },
        LoopPolicy::FirstMatch,
        &ctx,
    )
    .outcome
    .collapse_gone()
}

/// A quest is being started or finished with this item present
pub fn quest_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    item: ItemId,
    actor: CreatureId,
    quest: &QuestContext,
    event: EventMask,
) -> Outcome {
    debug_assert!(event == EventMask::START_QUEST || event == EventMask::FINISH_QUEST);
    let ctx = DispatchContext {
        actor: Some(actor),
        quest: Some(quest.clone()),
        ..DispatchContext::default()
    };
    run_triggers(
        world,
        engine,
        EntityRef::Item(item),
        event,
        NumericGate::Percent,
        TextFilter::None,
        LoopPolicy::FirstMatch,
        &ctx,
    )
    .outcome
    .collapse_gone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{RoomVnum, TriggerVnum, WearSlot};
    use crate::script::engine::RecordingEngine;
    use crate::script::trigger::{AttachKind, TriggerDefinition, TriggerFlags};
    use crate::world::RoomId;

    fn setup() -> (World, RoomId, CreatureId) {
        let mut world = World::new(23);
        let room = world.create_room(RoomVnum(1), false);
        let player = world.spawn_creature("hero", room, true).unwrap();
        (world, room, player)
    }

    fn item_def(vnum: u32, events: EventMask, numeric: i32) -> TriggerDefinition {
        TriggerDefinition {
            vnum: TriggerVnum(vnum),
            name: format!("trigger {vnum}"),
            attach: AttachKind::Item,
            events,
            numeric_arg: numeric,
            text_arg: None,
            flags: TriggerFlags::empty(),
        }
    }

    #[test]
    fn test_get_self_destruct_reports_target_gone() {
        let (mut world, room, player) = setup();
        let orb = world.spawn_item_in_room("unstable orb", room).unwrap();
        world.define_trigger(item_def(1, EventMask::GET, 100));
        world
            .attach_trigger(EntityRef::Item(orb), TriggerVnum(1))
            .unwrap();

        let mut engine = RecordingEngine::new();
        engine.set_effect(TriggerVnum(1), move |world| world.purge_item(orb));
        let outcome = get_triggers(&mut world, &mut engine, orb, player);
        assert_eq!(outcome, Outcome::TargetGone);
    }

    #[test]
    fn test_get_block_leaves_item_alive() {
        let (mut world, room, player) = setup();
        let anvil = world.spawn_item_in_room("bolted anvil", room).unwrap();
        world.define_trigger(item_def(1, EventMask::GET, 100));
        world
            .attach_trigger(EntityRef::Item(anvil), TriggerVnum(1))
            .unwrap();

        let mut engine = RecordingEngine::new();
        engine.set_result(TriggerVnum(1), 0);
        let outcome = get_triggers(&mut world, &mut engine, anvil, player);
        assert_eq!(outcome, Outcome::Blocked);
        assert!(world.alive(EntityRef::Item(anvil)));
    }

    #[test]
    fn test_command_checks_worn_then_carried_then_floor() {
        let (mut world, room, player) = setup();
        let ring = world.spawn_item_carried("ring", player).unwrap();
        world.equip_item(player, ring, WearSlot::Hands).unwrap();
        let wand = world.spawn_item_carried("wand", player).unwrap();
        let lever = world.spawn_item_in_room("lever", room).unwrap();

        for (vnum, item) in [(1, ring), (2, wand), (3, lever)] {
            world.define_trigger(TriggerDefinition {
                text_arg: Some("pull".into()),
                ..item_def(vnum, EventMask::COMMAND, 0)
            });
            world
                .attach_trigger(EntityRef::Item(item), TriggerVnum(vnum))
                .unwrap();
        }

        // The worn item intercepts first; later candidates never run
        let mut engine = RecordingEngine::new();
        assert!(command_triggers(
            &mut world,
            &mut engine,
            player,
            "pull",
            "",
            CommandMatch::Exact
        ));
        assert_eq!(engine.count_for(TriggerVnum(1)), 1);
        assert_eq!(engine.count_for(TriggerVnum(2)), 0);
        assert_eq!(engine.count_for(TriggerVnum(3)), 0);

        // With the worn trigger declining, the carried item is next
        engine.set_result(TriggerVnum(1), 0);
        assert!(command_triggers(
            &mut world,
            &mut engine,
            player,
            "pull",
            "",
            CommandMatch::Exact
        ));
        assert_eq!(engine.count_for(TriggerVnum(2)), 1);
        assert_eq!(engine.count_for(TriggerVnum(3)), 0);
    }

    #[test]
    fn test_consume_binds_method() {
        let (mut world, _room, player) = setup();
        let bread = world.spawn_item_carried("bread", player).unwrap();
        world.define_trigger(item_def(1, EventMask::CONSUME, 100));
        world
            .attach_trigger(EntityRef::Item(bread), TriggerVnum(1))
            .unwrap();

        let mut engine = RecordingEngine::new();
        let outcome = consume_triggers(&mut world, &mut engine, bread, player, "eat");
        assert_eq!(engine.invocation_count(), 1);
        assert!(outcome.allowed());
    }

    #[test]
    fn test_timer_fires_without_actor() {
        let (mut world, room, _player) = setup();
        let torch = world.spawn_item_in_room("torch", room).unwrap();
        world.define_trigger(item_def(1, EventMask::TIMER, 0));
        world
            .attach_trigger(EntityRef::Item(torch), TriggerVnum(1))
            .unwrap();

        let mut engine = RecordingEngine::new();
        let outcome = timer_triggers(&mut world, &mut engine, torch);
        assert_eq!(engine.invocation_count(), 1);
        assert!(outcome.allowed());
    }
}
