//! End-to-end dispatch tests
//!
//! These drive the engine the way game code does: content is loaded from
//! TOML, attached to live entities, and events are pushed through the combo
//! and per-kind dispatch entry points.

use thornmarch::core::types::{Direction, TriggerVnum, WearSlot};
use thornmarch::dispatch::{combo, creature, item, kill};
use thornmarch::script::context::Outcome;
use thornmarch::script::engine::RecordingEngine;
use thornmarch::script::matching::CommandMatch;
use thornmarch::world::loader::ContentPack;
use thornmarch::world::{EntityRef, World};

const CONTENT: &str = r#"
    [[triggers]]
    vnum = 100
    name = "gate warden greeting"
    attach = "Creature"
    events = "GREET"
    numeric_arg = 100

    [[triggers]]
    vnum = 101
    name = "password gate"
    attach = "Creature"
    events = "SPEECH"
    numeric_arg = 100
    text_arg = "\"open sesame\""

    [[triggers]]
    vnum = 102
    name = "shrine prayer"
    attach = "Room"
    events = "COMMAND"
    text_arg = "pray"

    [[triggers]]
    vnum = 103
    name = "cursed idol"
    attach = "Item"
    events = "GET"
    numeric_arg = 100

    [[triggers]]
    vnum = 104
    name = "trophy collector"
    attach = "Item"
    events = "KILL"
    numeric_arg = 100
"#;

fn loaded_world() -> World {
    let mut world = World::new(99);
    ContentPack::from_toml(CONTENT).unwrap().install(&mut world);
    world
}

#[test]
fn test_greet_then_speech_scenario() {
    let mut world = loaded_world();
    let room = world.create_room(thornmarch::core::types::RoomVnum(1), false);
    let player = world.spawn_creature("traveler", room, true).unwrap();
    let warden = world.spawn_creature("gate warden", room, false).unwrap();
    world
        .attach_trigger(EntityRef::Creature(warden), TriggerVnum(100))
        .unwrap();
    world
        .attach_trigger(EntityRef::Creature(warden), TriggerVnum(101))
        .unwrap();

    let mut engine = RecordingEngine::new();

    let outcome = creature::greet_triggers(&mut world, &mut engine, player, Some(Direction::South));
    assert!(outcome.allowed());
    assert_eq!(engine.count_for(TriggerVnum(100)), 1);

    // Wrong password: the wordlist filter keeps the trigger silent
    creature::speech_triggers(&mut world, &mut engine, player, "let me in", None);
    assert_eq!(engine.count_for(TriggerVnum(101)), 0);

    creature::speech_triggers(&mut world, &mut engine, player, "open sesame please", None);
    assert_eq!(engine.count_for(TriggerVnum(101)), 1);
}

#[test]
fn test_command_combo_prefers_room_over_items() {
    let mut world = loaded_world();
    let room = world.create_room(thornmarch::core::types::RoomVnum(1), false);
    let player = world.spawn_creature("traveler", room, true).unwrap();
    world
        .attach_trigger(EntityRef::Room(room), TriggerVnum(102))
        .unwrap();

    let mut engine = RecordingEngine::new();
    assert!(combo::command_triggers(
        &mut world,
        &mut engine,
        player,
        "pray",
        "",
        CommandMatch::Exact
    ));
    assert_eq!(engine.count_for(TriggerVnum(102)), 1);

    // Unmatched commands fall through to the normal handler
    assert!(!combo::command_triggers(
        &mut world,
        &mut engine,
        player,
        "sleep",
        "",
        CommandMatch::Exact
    ));
}

#[test]
fn test_get_trigger_destroying_item_reports_target_gone() {
    let mut world = loaded_world();
    let room = world.create_room(thornmarch::core::types::RoomVnum(1), false);
    let player = world.spawn_creature("traveler", room, true).unwrap();
    let idol = world.spawn_item_in_room("cursed idol", room).unwrap();
    world
        .attach_trigger(EntityRef::Item(idol), TriggerVnum(103))
        .unwrap();

    let mut engine = RecordingEngine::new();
    engine.set_effect(TriggerVnum(103), move |world| world.purge_item(idol));

    let outcome = item::get_triggers(&mut world, &mut engine, idol, player);
    assert_eq!(outcome, Outcome::TargetGone);
    assert!(!world.alive(EntityRef::Item(idol)));
}

/// The full propagation scenario: killer plus one ally, each wearing one
/// container holding two nested items. Two creatures and six items all get
/// their dispatch; one nested block turns the aggregate into a block.
#[test]
fn test_kill_propagation_depth_first_with_block() {
    let mut world = loaded_world();
    let room = world.create_room(thornmarch::core::types::RoomVnum(1), false);
    let victim = world.spawn_creature("bandit", room, false).unwrap();
    let killer = world.spawn_creature("hunter", room, true).unwrap();
    let ally = world.spawn_creature("hound", room, false).unwrap();
    world.creature_mut(killer).unwrap().group = Some(7);
    world.creature_mut(ally).unwrap().group = Some(7);

    let mut attached = Vec::new();
    for ch in [killer, ally] {
        let satchel = world.spawn_item_carried("satchel", ch).unwrap();
        world.equip_item(ch, satchel, WearSlot::Waist).unwrap();
        let charm = world.spawn_item_inside("charm", satchel).unwrap();
        let fang = world.spawn_item_inside("fang", satchel).unwrap();
        for it in [satchel, charm, fang] {
            world
                .attach_trigger(EntityRef::Item(it), TriggerVnum(104))
                .unwrap();
            attached.push(it);
        }
    }

    let mut engine = RecordingEngine::new();
    let outcome = kill::run_kill_triggers(&mut world, &mut engine, victim, Some(killer), None);
    assert!(outcome.allowed());
    assert_eq!(engine.count_for(TriggerVnum(104)), 6);

    // Containers are visited before their contents
    let order: Vec<_> = engine
        .invocations
        .iter()
        .filter_map(|(e, _)| match e {
            EntityRef::Item(id) => Some(*id),
            _ => None,
        })
        .collect();
    let satchel_pos = order.iter().position(|i| *i == attached[0]).unwrap();
    let charm_pos = order.iter().position(|i| *i == attached[1]).unwrap();
    assert!(satchel_pos < charm_pos);

    // A single blocking item blocks the aggregate without silencing the rest
    let mut engine = RecordingEngine::new();
    engine.set_result(TriggerVnum(104), 0);
    let outcome = kill::run_kill_triggers(&mut world, &mut engine, victim, Some(killer), None);
    assert_eq!(outcome, Outcome::Blocked);
    assert_eq!(engine.count_for(TriggerVnum(104)), 6);
}
