//! Vehicle trigger dispatch
//!
//! Vehicles are the fourth attach kind: carts, ships, siege engines. Their
//! entry/greet events mirror the creature versions but key off the vehicle's
//! interior; movement directions may be custom-named rather than compass.

use crate::core::types::Direction;
use crate::dispatch::run::{run_triggers, LoopPolicy, NumericGate, TextFilter};
use crate::script::context::{DispatchContext, Outcome, QuestContext};
use crate::script::engine::ScriptEngine;
use crate::script::matching::CommandMatch;
use crate::script::trigger::EventMask;
use crate::world::{CreatureId, EntityRef, ItemId, VehicleId, World};

/// Periodic dispatch for one vehicle
pub fn random_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    vehicle: VehicleId,
) -> Outcome {
    run_triggers(
        world,
        engine,
        EntityRef::Vehicle(vehicle),
        EventMask::RANDOM,
        NumericGate::Percent,
        TextFilter::None,
        LoopPolicy::FirstMatch,
        &DispatchContext::new(),
    )
    .outcome
    .collapse_gone()
}

/// A command was typed near this vehicle.
///
/// Returns true when a trigger intercepted the command.
pub fn command_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    vehicle: VehicleId,
    actor: CreatureId,
    typed: &str,
    argument: &str,
    mode: CommandMatch,
) -> bool {
    let ctx = DispatchContext {
        actor: Some(actor),
        vehicle: Some(vehicle),
        command: Some(typed.to_string()),
        argument: Some(argument.to_string()),
        ..DispatchContext::default()
    };
    let result = run_triggers(
        world,
        engine,
        EntityRef::Vehicle(vehicle),
        EventMask::COMMAND,
        NumericGate::Always,
        TextFilter::Command { typed, mode },
        LoopPolicy::FirstMatch,
        &ctx,
    );
    result.fired > 0 && result.outcome.allowed()
}

/// Someone spoke near this vehicle
pub fn speech_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    vehicle: VehicleId,
    actor: CreatureId,
    speech: &str,
) -> Outcome {
    let ctx = DispatchContext {
        actor: Some(actor),
        vehicle: Some(vehicle),
        speech: Some(speech.to_string()),
        ..DispatchContext::default()
    };
    run_triggers(
        world,
        engine,
        EntityRef::Vehicle(vehicle),
        EventMask::SPEECH,
        NumericGate::Percent,
        TextFilter::Wordlist { text: speech },
        LoopPolicy::FirstMatch,
        &ctx,
    )
    .outcome
    .collapse_gone()
}

/// The vehicle is about to be destroyed. Runs every trigger; the vehicle is
/// usually gone afterwards regardless of outcome.
pub fn destroy_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    vehicle: VehicleId,
    method: Option<&str>,
) -> Outcome {
    let ctx = DispatchContext {
        vehicle: Some(vehicle),
        method: method.map(String::from),
        ..DispatchContext::default()
    };
    run_triggers(
        world,
        engine,
        EntityRef::Vehicle(vehicle),
        EventMask::DESTROY,
        NumericGate::Percent,
        TextFilter::None,
        LoopPolicy::Canvass,
        &ctx,
    )
    .outcome
    .collapse_gone()
}

/// An actor boarded or approached the vehicle
pub fn greet_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    vehicle: VehicleId,
    actor: CreatureId,
    from_direction: Option<Direction>,
) -> Outcome {
    let ctx = DispatchContext {
        actor: Some(actor),
        vehicle: Some(vehicle),
        direction: from_direction,
        ..DispatchContext::default()
    };
    run_triggers(
        world,
        engine,
        EntityRef::Vehicle(vehicle),
        EventMask::GREET,
        NumericGate::Percent,
        TextFilter::None,
        LoopPolicy::FirstMatch,
        &ctx,
    )
    .outcome
    .collapse_gone()
}

/// The vehicle itself moved to a new room.
/// `custom_direction` carries non-compass movement names.
pub fn entry_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    vehicle: VehicleId,
    direction: Option<Direction>,
    custom_direction: Option<&str>,
) -> Outcome {
    let ctx = DispatchContext {
        vehicle: Some(vehicle),
        direction,
        custom_direction: custom_direction.map(String::from),
        ..DispatchContext::default()
    };
    run_triggers(
        world,
        engine,
        EntityRef::Vehicle(vehicle),
        EventMask::ENTRY,
        NumericGate::Percent,
        TextFilter::None,
        LoopPolicy::FirstMatch,
        &ctx,
    )
    .outcome
    .collapse_gone()
}

/// The vehicle was just instantiated from content
pub fn load_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    vehicle: VehicleId,
) -> Outcome {
    run_triggers(
        world,
        engine,
        EntityRef::Vehicle(vehicle),
        EventMask::LOAD,
        NumericGate::Percent,
        TextFilter::None,
        LoopPolicy::FirstMatch,
        &DispatchContext::new(),
    )
    .outcome
}

/// Something died in this vehicle's room (kill propagation)
pub fn kill_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    vehicle: VehicleId,
    dying: CreatureId,
    killer: CreatureId,
) -> Outcome {
    let ctx = DispatchContext {
        vehicle: Some(vehicle),
        victim: Some(dying),
        killer: Some(killer),
        ..DispatchContext::default()
    };
    run_triggers(
        world,
        engine,
        EntityRef::Vehicle(vehicle),
        EventMask::KILL,
        NumericGate::Percent,
        TextFilter::None,
        LoopPolicy::Canvass,
        &ctx,
    )
    .outcome
}

/// An actor is about to leave the room containing this vehicle
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
    for vehicle in world.vehicles_in_room(room) {
        let one = run_triggers(
            world,
            engine,
            EntityRef::Vehicle(vehicle),
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

/// A door near this vehicle was manipulated
pub fn door_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    vehicle: VehicleId,
    actor: CreatureId,
    direction: Direction,
    method: &str,
) -> Outcome {
    let ctx = DispatchContext {
        actor: Some(actor),
        vehicle: Some(vehicle),
        direction: Some(direction),
        method: Some(method.to_string()),
        ..DispatchContext::default()
    };
    run_triggers(
        world,
        engine,
        EntityRef::Vehicle(vehicle),
        EventMask::DOOR,
        NumericGate::Percent,
        TextFilter::None,
        LoopPolicy::FirstMatch,
        &ctx,
    )
    .outcome
    .collapse_gone()
}

/// The game came back up from a reboot
pub fn reboot_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    vehicle: VehicleId,
) -> Outcome {
    run_triggers(
        world,
        engine,
        EntityRef::Vehicle(vehicle),
        EventMask::REBOOT,
        NumericGate::Percent,
        TextFilter::None,
        LoopPolicy::FirstMatch,
        &DispatchContext::new(),
    )
    .outcome
    .collapse_gone()
}

/// A purchase is being made near this vehicle
#[allow(clippy::too_many_arguments)]
pub fn buy_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    vehicle: VehicleId,
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
        vehicle: Some(vehicle),
        shopkeeper,
        object: bought,
        cost: Some(cost),
        ..DispatchContext::default()
    };
    run_triggers(
        world,
        engine,
        EntityRef::Vehicle(vehicle),
        EventMask::BUY,
        NumericGate::LocationBit(location_bits),
        TextFilter::Wordlist { text: &bought_name },
        LoopPolicy::FirstMatch,
        &ctx,
    )
    .outcome
    .collapse_gone()
}

/// The vehicle is being dismantled by its owner
pub fn dismantle_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    vehicle: VehicleId,
    actor: Option<CreatureId>,
    preventable: bool,
) -> Outcome {
    let ctx = DispatchContext {
        actor,
        vehicle: Some(vehicle),
        preventable: Some(preventable),
        ..DispatchContext::default()
    };
    let outcome = run_triggers(
        world,
        engine,
        EntityRef::Vehicle(vehicle),
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

/// A quest is being started or finished near this vehicle
pub fn quest_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    vehicle: VehicleId,
    actor: CreatureId,
    quest: &QuestContext,
    event: EventMask,
) -> Outcome {
    debug_assert!(event == EventMask::START_QUEST || event == EventMask::FINISH_QUEST);
    let ctx = DispatchContext {
        actor: Some(actor),
        vehicle: Some(vehicle),
        quest: Some(quest.clone()),
        ..DispatchContext::default()
    };
    run_triggers(
        world,
        engine,
        EntityRef::Vehicle(vehicle),
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
    use crate::core::types::{RoomVnum, TriggerVnum};
    use crate::script::engine::RecordingEngine;
    use crate::script::trigger::{AttachKind, TriggerDefinition, TriggerFlags};
    use crate::world::RoomId;

    fn setup() -> (World, RoomId, CreatureId, VehicleId) {
        let mut world = World::new(47);
        let room = world.create_room(RoomVnum(1), false);
        let player = world.spawn_creature("hero", room, true).unwrap();
        let cart = world.spawn_vehicle("ox cart", room).unwrap();
        (world, room, player, cart)
    }

    fn vehicle_def(vnum: u32, events: EventMask, numeric: i32) -> TriggerDefinition {
        TriggerDefinition {
            vnum: TriggerVnum(vnum),
            name: format!("trigger {vnum}"),
            attach: AttachKind::Vehicle,
            events,
            numeric_arg: numeric,
            text_arg: None,
            flags: TriggerFlags::empty(),
        }
    }

    #[test]
    fn test_destroy_canvass_runs_all() {
        let (mut world, _room, _player, cart) = setup();
        world.define_trigger(vehicle_def(1, EventMask::DESTROY, 100));
        world.define_trigger(vehicle_def(2, EventMask::DESTROY, 100));
        world
            .attach_trigger(EntityRef::Vehicle(cart), TriggerVnum(1))
            .unwrap();
        world
            .attach_trigger(EntityRef::Vehicle(cart), TriggerVnum(2))
            .unwrap();

        let mut engine = RecordingEngine::new();
        engine.set_result(TriggerVnum(1), 0);
        let outcome = destroy_triggers(&mut world, &mut engine, cart, Some("burned"));
        assert_eq!(engine.invocation_count(), 2);
        assert_eq!(outcome, Outcome::Blocked);
    }

    #[test]
    fn test_entry_custom_direction() {
        let (mut world, _room, _player, cart) = setup();
        world.define_trigger(vehicle_def(1, EventMask::ENTRY, 100));
        world
            .attach_trigger(EntityRef::Vehicle(cart), TriggerVnum(1))
            .unwrap();

        let mut engine = RecordingEngine::new();
        let outcome = entry_triggers(&mut world, &mut engine, cart, None, Some("downriver"));
        assert_eq!(engine.invocation_count(), 1);
        assert!(outcome.allowed());
    }

    #[test]
    fn test_vehicle_command_interception() {
        let (mut world, _room, player, cart) = setup();
        world.define_trigger(TriggerDefinition {
            text_arg: Some("board".into()),
            ..vehicle_def(1, EventMask::COMMAND, 0)
        });
        world
            .attach_trigger(EntityRef::Vehicle(cart), TriggerVnum(1))
            .unwrap();

        let mut engine = RecordingEngine::new();
        assert!(command_triggers(
            &mut world,
            &mut engine,
            cart,
            player,
            "board",
            "cart",
            CommandMatch::Exact
        ));
        assert!(!command_triggers(
            &mut world,
            &mut engine,
            cart,
            player,
            "leave",
            "",
            CommandMatch::Exact
        ));
    }
}
