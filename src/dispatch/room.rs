//! Room trigger dispatch
//!
//! The quest variants accept a read-time overlay of extra trigger vnums so
//! quest content can listen in a room without ever being attached to it.

use crate::core::types::{AbilityId, Direction, TriggerVnum};
use crate::dispatch::run::{
    run_triggers, run_triggers_with_overlay, LoopPolicy, NumericGate, TextFilter,
};
use crate::script::context::{DispatchContext, Outcome, QuestContext};
use crate::script::engine::ScriptEngine;
use crate::script::matching::CommandMatch;
use crate::script::trigger::EventMask;
use crate::world::{CreatureId, EntityRef, ItemId, RoomId, World};

/// Periodic dispatch for one room
pub fn random_triggers(world: &mut World, engine: &mut dyn ScriptEngine, room: RoomId) -> Outcome {
    run_triggers(
        world,
        engine,
        EntityRef::Room(room),
        EventMask::RANDOM,
        NumericGate::Percent,
        TextFilter::None,
        LoopPolicy::FirstMatch,
        &DispatchContext::new(),
    )
    .outcome
    .collapse_gone()
}

/// An actor entered the room
pub fn enter_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    room: RoomId,
    actor: CreatureId,
    from_direction: Option<Direction>,
) -> Outcome {
    let ctx = DispatchContext {
        actor: Some(actor),
        direction: from_direction,
        ..DispatchContext::default()
    };
    run_triggers(
        world,
        engine,
        EntityRef::Room(room),
        EventMask::ENTER,
        NumericGate::Percent,
        TextFilter::None,
        LoopPolicy::FirstMatch,
        &ctx,
    )
    .outcome
    .collapse_gone()
}

/// A command was typed in this room.
///
/// Returns true when a trigger intercepted the command.
pub fn command_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    room: RoomId,
    actor: CreatureId,
    typed: &str,
    argument: &str,
    mode: CommandMatch,
) -> bool {
    let ctx = DispatchContext {
        actor: Some(actor),
        command: Some(typed.to_string()),
        argument: Some(argument.to_string()),
        ..DispatchContext::default()
    };
    let result = run_triggers(
        world,
        engine,
        EntityRef::Room(room),
        EventMask::COMMAND,
        NumericGate::Always,
        TextFilter::Command { typed, mode },
        LoopPolicy::FirstMatch,
        &ctx,
    );
    result.fired > 0 && result.outcome.allowed()
}

/// Someone spoke in this room
pub fn speech_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    room: RoomId,
    actor: CreatureId,
    speech: &str,
) -> Outcome {
    let ctx = DispatchContext {
        actor: Some(actor),
        speech: Some(speech.to_string()),
        ..DispatchContext::default()
    };
    run_triggers(
        world,
        engine,
        EntityRef::Room(room),
        EventMask::SPEECH,
        NumericGate::Percent,
        TextFilter::Wordlist { text: speech },
        LoopPolicy::FirstMatch,
        &ctx,
    )
    .outcome
    .collapse_gone()
}

/// An item was dropped on this room's floor
pub fn drop_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    room: RoomId,
    actor: CreatureId,
    object: ItemId,
) -> Outcome {
    let ctx = DispatchContext {
        actor: Some(actor),
        object: Some(object),
        ..DispatchContext::default()
    };
    let result = run_triggers(
        world,
        engine,
        EntityRef::Room(room),
        EventMask::DROP,
        NumericGate::Percent,
        TextFilter::None,
        LoopPolicy::FirstMatch,
        &ctx,
    );
    if !world.alive(EntityRef::Item(object)) {
        return Outcome::TargetGone;
    }
    result.outcome.collapse_gone()
}

/// An item is being consumed in this room
pub fn consume_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    room: RoomId,
    actor: CreatureId,
    object: ItemId,
    method: &str,
) -> Outcome {
    let ctx = DispatchContext {
        actor: Some(actor),
        object: Some(object),
        method: Some(method.to_string()),
        ..DispatchContext::default()
    };
    run_triggers(
        world,
        engine,
        EntityRef::Room(room),
        EventMask::CONSUME,
        NumericGate::Percent,
        TextFilter::None,
        LoopPolicy::FirstMatch,
        &ctx,
    )
    .outcome
    .collapse_gone()
}

/// An ability was used in this room
pub fn ability_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    room: RoomId,
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
        EntityRef::Room(room),
        EventMask::ABILITY,
        NumericGate::Percent,
        TextFilter::None,
        LoopPolicy::FirstMatch,
        &ctx,
    )
    .outcome
    .collapse_gone()
}

/// An actor is about to leave this room
pub fn leave_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    room: RoomId,
    actor: CreatureId,
    direction: Option<Direction>,
) -> Outcome {
    let ctx = DispatchContext {
        actor: Some(actor),
        direction,
        ..DispatchContext::default()
    };
    run_triggers(
        world,
        engine,
        EntityRef::Room(room),
        EventMask::LEAVE,
        NumericGate::Percent,
        TextFilter::None,
        LoopPolicy::FirstMatch,
        &ctx,
    )
    .outcome
    .collapse_gone()
}

/// A door in this room was manipulated
pub fn door_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    room: RoomId,
    actor: CreatureId,
    direction: Direction,
    method: &str,
) -> Outcome {
    let ctx = DispatchContext {
        actor: Some(actor),
        direction: Some(direction),
        method: Some(method.to_string()),
        ..DispatchContext::default()
    };
    run_triggers(
        world,
        engine,
        EntityRef::Room(room),
        EventMask::DOOR,
        NumericGate::Percent,
        TextFilter::None,
        LoopPolicy::FirstMatch,
        &ctx,
    )
    .outcome
    .collapse_gone()
}

/// The room's periodic reset came due
pub fn reset_triggers(world: &mut World, engine: &mut dyn ScriptEngine, room: RoomId) -> Outcome {
    run_triggers(
        world,
        engine,
        EntityRef::Room(room),
        EventMask::RESET,
        NumericGate::Percent,
        TextFilter::None,
        LoopPolicy::FirstMatch,
        &DispatchContext::new(),
    )
    .outcome
    .collapse_gone()
}

/// A built structure in this room is being torn down.
/// `preventable` tells the script whether a block will be honored.
pub fn dismantle_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    room: RoomId,
    actor: Option<CreatureId>,
    preventable: bool,
) -> Outcome {
    let ctx = DispatchContext {
        actor,
        preventable: Some(preventable),
        ..DispatchContext::default()
    };
    let outcome = run_triggers(
        world,
        engine,
        EntityRef::Room(room),
        EventMask::DISMANTLE,
        NumericGate::Percent,
        TextFilter::None,
        LoopPolicy::FirstMatch,
        &ctx,
    )
    .outcome
    .collapse_gone();
    if preventable {
        outcome
    } else {
        Outcome::Allowed
    }
}

/// The room was just instantiated from content
pub fn load_triggers(world: &mut World, engine: &mut dyn ScriptEngine, room: RoomId) -> Outcome {
    run_triggers(
        world,
        engine,
        EntityRef::Room(room),
        EventMask::LOAD,
        NumericGate::Percent,
        TextFilter::None,
        LoopPolicy::FirstMatch,
        &DispatchContext::new(),
    )
    .outcome
}

/// The game came back up from a reboot
pub fn reboot_triggers(world: &mut World, engine: &mut dyn ScriptEngine, room: RoomId) -> Outcome {
    run_triggers(
        world,
        engine,
        EntityRef::Room(room),
        EventMask::REBOOT,
        NumericGate::Percent,
        TextFilter::None,
        LoopPolicy::FirstMatch,
        &DispatchContext::new(),
    )
    .outcome
    .collapse_gone()
}

/// A purchase is being made in this room
#[allow(clippy::too_many_arguments)]
pub fn buy_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    room: RoomId,
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
        EntityRef::Room(room),
        EventMask::BUY,
        NumericGate::LocationBit(location_bits),
        TextFilter::Wordlist { text: &bought_name },
        LoopPolicy::FirstMatch,
        &ctx,
    )
    .outcome
    .collapse_gone()
}

/// A quest is being started or finished in this room.
///
/// `overlay` holds room-attachable world triggers contributed by the quest
/// itself; they are evaluated alongside the room's own triggers without
/// touching its stored trigger list.
pub fn quest_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    room: RoomId,
    actor: CreatureId,
    quest: &QuestContext,
    event: EventMask,
    overlay: &[TriggerVnum],
) -> Outcome {
    debug_assert!(event == EventMask::START_QUEST || event == EventMask::FINISH_QUEST);
    let ctx = DispatchContext {
        actor: Some(actor),
        quest: Some(quest.clone()),
        ..DispatchContext::default()
    };
    run_triggers_with_overlay(
        world,
        engine,
        EntityRef::Room(room),
        overlay,
        event,
        NumericGate::Percent,
        TextFilter::None,
        LoopPolicy::FirstMatch,
        &ctx,
    )
    .outcome
    .collapse_gone()
}
