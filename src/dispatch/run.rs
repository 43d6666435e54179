//! The shared trigger-evaluation loop
//!
//! All four entity kinds dispatch through `run_triggers`, so the gating
//! order, delete-safe iteration, and purge handling are identical everywhere.
//! Per-kind modules only choose the event, gates, and context.
//!
//! Iteration safety: the instance-id list is snapshotted before the loop and
//! every id is re-resolved against the live script each step, so a script
//! that detaches or attaches triggers mid-dispatch (on itself or anything
//! else) never leaves the loop holding a dangling reference. Entity liveness
//! is re-checked through its generational handle after every invocation.

use rand::Rng;

use crate::core::types::{InstanceId, TriggerVnum};
use crate::script::context::{DispatchContext, Outcome};
use crate::script::matching::{matches_command, matches_wordlist, CommandMatch};
use crate::script::trigger::EventMask;
use crate::script::engine::ScriptEngine;
use crate::world::{EntityRef, World};

/// Numeric-argument gate applied per trigger
#[derive(Debug, Clone, Copy)]
pub enum NumericGate {
    /// Roll 1..=100; pass when roll <= numeric argument
    Percent,
    /// Pass when the entity's health percent is <= the numeric argument
    HealthBelow,
    /// Pass when the offered amount is >= the numeric argument
    AmountAtLeast(i64),
    /// Pass when the numeric argument (a location bitmask) contains one of
    /// the given bits, or is zero (no restriction)
    LocationBit(u32),
    /// No numeric gate for this event kind
    Always,
}

/// Text-argument filter applied per trigger
#[derive(Debug, Clone, Copy)]
pub enum TextFilter<'a> {
    None,
    /// Match the typed command word against the trigger's command pattern
    Command { typed: &'a str, mode: CommandMatch },
    /// Match free text against the trigger's wordlist
    Wordlist { text: &'a str },
}

/// How the loop treats multiple eligible triggers on one entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPolicy {
    /// A trigger without ALLOW_MULTIPLE ends the loop once it executes,
    /// whether it allowed or blocked. ALLOW_MULTIPLE triggers never end the
    /// loop; the final result is the last evaluated trigger's outcome.
    FirstMatch,
    /// Every eligible trigger runs; the result is the AND of all outcomes.
    /// Used where each trigger must get its chance (death, kill).
    Canvass,
}

/// Outcome of one dispatch call plus how many triggers actually executed
#[derive(Debug, Clone, Copy)]
pub struct RunResult {
    pub outcome: Outcome,
    pub fired: u32,
}

impl RunResult {
    fn allowed() -> Self {
        Self {
            outcome: Outcome::Allowed,
            fired: 0,
        }
    }
}

enum Slot {
    /// An instance attached to the entity's own script
    Attached(InstanceId),
    /// A read-time overlay instance that exists only for this call
    Overlay(InstanceId, TriggerVnum),
}

/// Dispatch `event` against one entity's own triggers
pub fn run_triggers(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    entity: EntityRef,
    event: EventMask,
    gate: NumericGate,
    filter: TextFilter,
    policy: LoopPolicy,
    ctx: &DispatchContext,
) -> RunResult {
    let Some(script) = world.script(entity) else {
        return RunResult::allowed();
    };
    let listening = script.instances().iter().any(|i| {
        world
            .trigger_def(i.vnum)
            .is_some_and(|d| d.events.intersects(event))
    });
    if !listening {
        return RunResult::allowed();
    }
    let slots: Vec<Slot> = script
        .instances()
        .iter()
        .map(|i| Slot::Attached(i.id))
        .collect();
    run_slots(world, engine, entity, slots, event, gate, filter, policy, ctx)
}

/// Dispatch `event` against an entity's own triggers plus a read-time
/// overlay of additional definitions.
///
/// The overlay is merged into the iteration view only; the entity's stored
/// trigger list is never touched, so there is nothing to clean up on any
/// exit path. Definitions whose attach kind does not fit the entity are
/// skipped with a warning.
pub fn run_triggers_with_overlay(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    entity: EntityRef,
    overlay: &[TriggerVnum],
    event: EventMask,
    gate: NumericGate,
    filter: TextFilter,
    policy: LoopPolicy,
    ctx: &DispatchContext,
) -> RunResult {
    let mut slots: Vec<Slot> = world
        .script(entity)
        .map(|script| {
            script
                .instances()
                .iter()
                .map(|i| Slot::Attached(i.id))
                .collect()
        })
        .unwrap_or_default();

    for &vnum in overlay {
        match world.trigger_def(vnum) {
            Some(def) if def.attach == entity.attach_kind() => {
                let id = world.allocate_instance_id();
                slots.push(Slot::Overlay(id, vnum));
            }
            Some(def) => {
                tracing::warn!(
                    vnum = vnum.0,
                    attach = ?def.attach,
                    "overlay trigger skipped: attach kind does not fit entity"
                );
            }
            None => {
                tracing::warn!(vnum = vnum.0, "overlay trigger skipped: unknown vnum");
            }
        }
    }
    if slots.is_empty() {
        return RunResult::allowed();
    }

    // Binding needs a variable map even on a scriptless entity; tear a
    // created-empty script back down afterwards.
    let created = match world.ensure_script(entity) {
        Ok((_, created)) => created,
        Err(_) => return RunResult::allowed(),
    };

    let result = run_slots(world, engine, entity, slots, event, gate, filter, policy, ctx);

    if created && world.alive(entity) {
        let still_empty = world
            .script(entity)
            .is_some_and(|s| s.is_empty() && s.variables.is_empty());
        if still_empty {
            world.remove_script(entity);
        }
    }
    result
}

#[allow(clippy::too_many_arguments)]
fn run_slots(
    world: &mut World,
    engine: &mut dyn ScriptEngine,
    entity: EntityRef,
    slots: Vec<Slot>,
    event: EventMask,
    gate: NumericGate,
    filter: TextFilter,
    policy: LoopPolicy,
    ctx: &DispatchContext,
) -> RunResult {
    let mut players_nearby: Option<bool> = None;
    let mut last = Outcome::Allowed;
    let mut acc = Outcome::Allowed;
    let mut fired = 0u32;

    for slot in slots {
        // A previous trigger's script may have purged the entity itself
        if !world.alive(entity) {
            return finish(policy, acc.and(Outcome::TargetGone), Outcome::TargetGone, fired);
        }

        let (instance_id, vnum) = match slot {
            Slot::Attached(id) => {
                // Re-resolve: the instance may have been detached mid-loop
                let Some(instance) = world.script(entity).and_then(|s| s.find(id)) else {
                    continue;
                };
                (id, instance.vnum)
            }
            Slot::Overlay(id, vnum) => (id, vnum),
        };
        let Some(def) = world.trigger_def(vnum).cloned() else {
            continue;
        };

        if !def.events.intersects(event) || def.attach != entity.attach_kind() {
            continue;
        }

        if let EntityRef::Creature(id) = entity {
            let charmed = world.creature(id).is_some_and(|c| c.charmed);
            if charmed && !def.fires_while_charmed() {
                continue;
            }
        }

        if def.missing_text_arg(event) {
            tracing::warn!(
                vnum = def.vnum.0,
                name = %def.name,
                "trigger requires a text argument but has none; skipping"
            );
            continue;
        }

        match filter {
            TextFilter::None => {}
            TextFilter::Command { typed, mode } => {
                let pattern = def.text_arg.as_deref().unwrap_or("*");
                if !matches_command(typed, pattern, mode) {
                    continue;
                }
            }
            TextFilter::Wordlist { text } => {
                if let Some(wordlist) = def.text_arg.as_deref() {
                    if !matches_wordlist(text, wordlist) {
                        continue;
                    }
                }
            }
        }

        if event.requires_player_nearby() && !def.is_global() {
            let nearby = *players_nearby.get_or_insert_with(|| {
                world
                    .entity_room(entity)
                    .map(|room| world.player_in_room(room))
                    .unwrap_or(false)
            });
            if !nearby {
                continue;
            }
        }

        let max_roll = world.config.percent_roll_max;
        let passes = match gate {
            NumericGate::Percent => {
                let roll = world.rng.gen_range(1..=max_roll);
                roll <= def.numeric_arg
            }
            NumericGate::HealthBelow => match entity {
                EntityRef::Creature(id) => world
                    .creature(id)
                    .is_some_and(|c| c.health_percent() <= def.numeric_arg as i64),
                _ => false,
            },
            NumericGate::AmountAtLeast(amount) => amount >= def.numeric_arg as i64,
            NumericGate::LocationBit(bits) => {
                def.numeric_arg == 0 || (def.numeric_arg as u32 & bits) != 0
            }
            NumericGate::Always => true,
        };
        if !passes {
            continue;
        }

        fired += 1;
        if let Ok((script, _)) = world.ensure_script(entity) {
            ctx.bind_into(script);
        }
        let result = engine.execute(world, entity, instance_id, &def);
        if let Some(script) = world.script_mut(entity) {
            DispatchContext::unbind_from(script);
        }

        if !world.alive(entity) {
            return finish(policy, acc.and(Outcome::TargetGone), Outcome::TargetGone, fired);
        }
        if let Some(actor) = ctx.actor {
            if !world.alive(EntityRef::Creature(actor)) {
                return finish(policy, acc.and(Outcome::Blocked), Outcome::Blocked, fired);
            }
        }

        let outcome = if result == 0 {
            Outcome::Blocked
        } else {
            Outcome::Allowed
        };
        match policy {
            LoopPolicy::FirstMatch => {
                if !def.allows_multiple() {
                    return RunResult { outcome, fired };
                }
                last = outcome;
            }
            LoopPolicy::Canvass => {
                acc = acc.and(outcome);
            }
        }
    }

    RunResult {
        outcome: match policy {
            LoopPolicy::FirstMatch => last,
            LoopPolicy::Canvass => acc,
        },
        fired,
    }
}

fn finish(policy: LoopPolicy, canvass: Outcome, first_match: Outcome, fired: u32) -> RunResult {
    RunResult {
        outcome: match policy {
            LoopPolicy::Canvass => canvass,
            LoopPolicy::FirstMatch => first_match,
        },
        fired,
    }
}
