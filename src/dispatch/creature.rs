//! Creature trigger dispatch, one function per event kind
//!
//! Room-wide events (greet, leave, door, speech, command) snapshot the
//! occupant list before iterating so scripts that purge or move creatures
//! mid-dispatch cannot invalidate the walk.

use crate::core::types::{AbilityId, CurrencyId, Direction, LanguageId};
use crate::dispatch::run::{run_triggers, LoopPolicy, NumericGate, TextFilter};
use crate::script::context::{DispatchContext, Outcome, QuestContext};
use crate::script::engine::ScriptEngine;
use crate::script::matching::CommandMatch;
use crate::script::trigger::EventMask;
use crate::world::{CreatureId, EntityRef, ItemId, World};

/// Periodic dispatch for one creature
pub fn random_triggers(world: &mut World, engine: &mut dyn ScriptEngine, ch: CreatureId) -> Outcome {
    run_triggers(
        world,
        engine,
        EntityRef::Creature(ch),
        EventMask::RANDOM,
        NumericGate::Percent,
        TextFilter::None,
        LoopPolicy::FirstMatch,
        &DispatchContext::new(),
    )
    .outcome
    .collapse_gone()
}

/// Someone spoke; every other creature in the room gets a chance to react
pub fn speech_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    actor: CreatureId,
    speech: &str,
    language: Option<(LanguageId, &str)>,
) -> Outcome {
    let Some(room) = world.creature(actor).map(|c| c.room) else {
        return Outcome::Allowed;
    };
    let ctx = DispatchContext {
        actor: Some(actor),
        speech: Some(speech.to_string()),
        language: language.map(|(id, _)| id),
        language_name: language.map(|(_, name)| name.to_string()),
        ..DispatchContext::default()
    };
    let mut result = Outcome::Allowed;
    for ch in world.creatures_in_room(room) {
        if ch == actor {
            continue;
        }
        let one = run_triggers(
            world,
            engine,
            EntityRef::Creature(ch),
            EventMask::SPEECH,
            NumericGate::Percent,
            TextFilter::Wordlist { text: speech },
            LoopPolicy::FirstMatch,
            &ctx,
        );
        result = result.and(one.outcome.collapse_gone());
    }
    result
}

/// A social/emote message reached one creature
pub fn act_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    ch: CreatureId,
    actor: CreatureId,
    phrase: &str,
) -> Outcome {
    let ctx = DispatchContext {
        actor: Some(actor),
        speech: Some(phrase.to_string()),
        ..DispatchContext::default()
    };
    run_triggers(
        world,
        engine,
        EntityRef::Creature(ch),
        EventMask::ACT,
        NumericGate::Percent,
        TextFilter::Wordlist { text: phrase },
        LoopPolicy::FirstMatch,
        &ctx,
    )
    .outcome
    .collapse_gone()
}

/// An actor arrived; every watcher in the room may object.
///
/// Aggregates across all creatures present: the move is blocked if any
/// watcher blocks, but every watcher still gets its dispatch.
pub fn greet_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    actor: CreatureId,
    from_direction: Option<Direction>,
) -> Outcome {
    let Some(room) = world.creature(actor).map(|c| c.room) else {
        return Outcome::Allowed;
    };
    let ctx = DispatchContext {
        actor: Some(actor),
        direction: from_direction,
        ..DispatchContext::default()
    };
    let mut result = Outcome::Allowed;
    for ch in world.creatures_in_room(room) {
        if ch == actor {
            continue;
        }
        let one = run_triggers(
            world,
            engine,
            EntityRef::Creature(ch),
            EventMask::GREET | EventMask::GREET_ALL,
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

/// The creature itself entered a new room
pub fn entry_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    ch: CreatureId,
    direction: Option<Direction>,
) -> Outcome {
    let ctx = DispatchContext {
        direction,
        ..DispatchContext::default()
    };
    run_triggers(
        world,
        engine,
        EntityRef::Creature(ch),
        EventMask::ENTRY,
        NumericGate::Percent,
        TextFilter::None,
        LoopPolicy::FirstMatch,
        &ctx,
    )
    .outcome
    .collapse_gone()
}

/// A command was typed; creatures in the room may intercept it.
///
/// Returns true when a trigger matched, executed, and did not decline,
/// meaning the normal command handler must not run.
pub fn command_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    actor: CreatureId,
    typed: &str,
    argument: &str,
    mode: CommandMatch,
) -> bool {
    let Some(room) = world.creature(actor).map(|c| c.room) else {
        return false;
    };
    let ctx = DispatchContext {
        actor: Some(actor),
        command: Some(typed.to_string()),
        argument: Some(argument.to_string()),
        ..DispatchContext::default()
    };
    for ch in world.creatures_in_room(room) {
        if ch == actor {
            continue;
        }
        let result = run_triggers(
            world,
            engine,
            EntityRef::Creature(ch),
            EventMask::COMMAND,
            NumericGate::Always,
            TextFilter::Command { typed, mode },
            LoopPolicy::FirstMatch,
            &ctx,
        );
        if result.fired > 0 && result.outcome.allowed() {
            return true;
        }
    }
    false
}

/// The creature was handed an item. `TargetGone` means the item was
/// destroyed by the script and must not reach the receiver's inventory.
pub fn receive_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    ch: CreatureId,
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
        EntityRef::Creature(ch),
        EventMask::RECEIVE,
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

/// The creature was offered money; fires when the amount meets the
/// trigger's minimum
pub fn bribe_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    ch: CreatureId,
    actor: CreatureId,
    amount: i64,
    currency: Option<CurrencyId>,
) -> Outcome {
    let ctx = DispatchContext {
        actor: Some(actor),
        amount: Some(amount),
        currency,
        ..DispatchContext::default()
    };
    run_triggers(
        world,
        engine,
        EntityRef::Creature(ch),
        EventMask::BRIBE,
        NumericGate::AmountAtLeast(amount),
        TextFilter::None,
        LoopPolicy::FirstMatch,
        &ctx,
    )
    .outcome
    .collapse_gone()
}

/// A combat round passed with the creature fighting
pub fn fight_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    ch: CreatureId,
    opponent: Option<CreatureId>,
) -> Outcome {
    let hit = world.creature(ch).map(|c| c.health_percent());
    let ctx = DispatchContext {
        victim: opponent,
        hit,
        ..DispatchContext::default()
    };
    run_triggers(
        world,
        engine,
        EntityRef::Creature(ch),
        EventMask::FIGHT,
        NumericGate::Percent,
        TextFilter::None,
        LoopPolicy::FirstMatch,
        &ctx,
    )
    .outcome
    .collapse_gone()
}

/// The creature's health dropped; fires when at or below the trigger's
/// percent threshold
pub fn hitprcnt_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    ch: CreatureId,
    opponent: Option<CreatureId>,
) -> Outcome {
    let hit = world.creature(ch).map(|c| c.health_percent());
    let ctx = DispatchContext {
        victim: opponent,
        hit,
        ..DispatchContext::default()
    };
    run_triggers(
        world,
        engine,
        EntityRef::Creature(ch),
        EventMask::HIT_PERCENT,
        NumericGate::HealthBelow,
        TextFilter::None,
        LoopPolicy::FirstMatch,
        &ctx,
    )
    .outcome
    .collapse_gone()
}

/// The creature died. Every death trigger gets its chance; a block from any
/// of them suppresses the caller's death handling (corpse message, loot).
pub fn death_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    ch: CreatureId,
    killer: Option<CreatureId>,
    method: Option<&str>,
) -> Outcome {
    let ctx = DispatchContext {
        killer,
        method: method.map(String::from),
        ..DispatchContext::default()
    };
    run_triggers(
        world,
        engine,
        EntityRef::Creature(ch),
        EventMask::DEATH,
        NumericGate::Percent,
        TextFilter::None,
        LoopPolicy::Canvass,
        &ctx,
    )
    .outcome
    .collapse_gone()
}

/// Something died at the hands of this creature or its allies
pub fn kill_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    ch: CreatureId,
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
        EntityRef::Creature(ch),
        EventMask::KILL,
        NumericGate::Percent,
        TextFilter::None,
        LoopPolicy::Canvass,
        &ctx,
    )
    .outcome
    .collapse_gone()
}

/// The creature was just instantiated from content
pub fn load_triggers(world: &mut World, engine: &mut dyn ScriptEngine, ch: CreatureId) -> Outcome {
    run_triggers(
        world,
        engine,
        EntityRef::Creature(ch),
        EventMask::LOAD,
        NumericGate::Percent,
        TextFilter::None,
        LoopPolicy::FirstMatch,
        &DispatchContext::new(),
    )
    .outcome
}

/// The creature spotted an actor it remembers
pub fn memory_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    ch: CreatureId,
    actor: CreatureId,
) -> Outcome {
    let remembered = world.creature(ch).is_some_and(|c| c.remembers(actor));
    if !remembered {
        return Outcome::Allowed;
    }
    let ctx = DispatchContext {
        actor: Some(actor),
        ..DispatchContext::default()
    };
    run_triggers(
        world,
        engine,
        EntityRef::Creature(ch),
        EventMask::MEMORY,
        NumericGate::Percent,
        TextFilter::None,
        LoopPolicy::FirstMatch,
        &ctx,
    )
    .outcome
    .collapse_gone()
}

/// An ability was used on the creature
pub fn ability_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    ch: CreatureId,
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
        EntityRef::Creature(ch),
        EventMask::ABILITY,
        NumericGate::Percent,
        TextFilter::None,
        LoopPolicy::FirstMatch,
        &ctx,
    )
    .outcome
    .collapse_gone()
}

/// An actor is about to leave the room; every watcher may object
pub fn leave_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    actor: CreatureId,
    direction: Option<Direction>,
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
    for ch in world.creatures_in_room(room) {
        if ch == actor {
            continue;
        }
        let one = run_triggers(
            world,
            engine,
            EntityRef::Creature(ch),
            EventMask::LEAVE | EventMask::LEAVE_ALL,
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

/// A door in the room was manipulated
pub fn door_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    actor: CreatureId,
    direction: Direction,
    method: &str,
) -> Outcome {
    let Some(room) = world.creature(actor).map(|c| c.room) else {
        return Outcome::Allowed;
    };
    let ctx = DispatchContext {
        actor: Some(actor),
        direction: Some(direction),
        method: Some(method.to_string()),
        ..DispatchContext::default()
    };
    let mut result = Outcome::Allowed;
    for ch in world.creatures_in_room(room) {
        if ch == actor {
            continue;
        }
        let one = run_triggers(
            world,
            engine,
            EntityRef::Creature(ch),
            EventMask::DOOR,
            NumericGate::Percent,
            TextFilter::None,
            LoopPolicy::FirstMatch,
            &ctx,
        );
        result = result.and(one.outcome.collapse_gone());
    }
    result
}

/// The game came back up from a reboot
pub fn reboot_triggers(world: &mut World, engine: &mut dyn ScriptEngine, ch: CreatureId) -> Outcome {
    run_triggers(
        world,
        engine,
        EntityRef::Creature(ch),
        EventMask::REBOOT,
        NumericGate::Percent,
        TextFilter::None,
        LoopPolicy::FirstMatch,
        &DispatchContext::new(),
    )
    .outcome
    .collapse_gone()
}

/// A purchase is being made from this shopkeeper
#[allow(clippy::too_many_arguments)]
pub fn buy_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    shopkeeper: CreatureId,
    actor: CreatureId,
    object: Option<ItemId>,
    cost: i64,
    currency: Option<CurrencyId>,
    location_bits: u32,
) -> Outcome {
    let object_name = object
        .and_then(|id| world.item(id))
        .map(|item| item.name.clone())
        .unwrap_or_default();
    let ctx = DispatchContext {
        actor: Some(actor),
        shopkeeper: Some(shopkeeper),
        object,
        cost: Some(cost),
        currency,
        ..DispatchContext::default()
    };
    run_triggers(
        world,
        engine,
        EntityRef::Creature(shopkeeper),
        EventMask::BUY,
        NumericGate::LocationBit(location_bits),
        TextFilter::Wordlist { text: &object_name },
        LoopPolicy::FirstMatch,
        &ctx,
    )
    .outcome
    .collapse_gone()
}

/// A quest is being started or finished near this creature
pub fn quest_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    ch: CreatureId,
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
        EntityRef::Creature(ch),
        event,
        NumericGate::Percent,
        TextFilter::None,
        LoopPolicy::FirstMatch,
        &ctx,
    )
    .outcome
    .collapse_gone()
}
