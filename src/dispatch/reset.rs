//! Periodic room-reset scheduling
//!
//! At most one pending timer per room. Scheduling is idempotent; the first
//! firing carries random jitter so rooms loaded together do not all reset on
//! the same tick, and every repeat uses the plain configured interval.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use ahash::AHashMap;
use rand::Rng;

use crate::core::types::Tick;
use crate::dispatch::room;
use crate::script::context::Outcome;
use crate::script::engine::ScriptEngine;
use crate::script::trigger::EventMask;
use crate::world::{EntityRef, RoomId, World};

/// Single-fire token returned when a delay is scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub u64);

/// Centralized delayed-event facility
///
/// The engine treats this as an external collaborator; `TickQueue` is the
/// in-crate implementation used by the game loop and tests.
pub trait DelayService {
    /// Schedule a single firing `delay` ticks from `now`
    fn schedule(&mut self, now: Tick, delay: Tick, room: RoomId) -> TimerId;
    /// Cancel a pending timer; false if it already fired or never existed
    fn cancel(&mut self, timer: TimerId) -> bool;
}

/// Min-heap of pending timers keyed by fire tick
#[derive(Default)]
pub struct TickQueue {
    heap: BinaryHeap<Reverse<(Tick, u64)>>,
    entries: AHashMap<u64, RoomId>,
    next_timer: u64,
}

impl TickQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pop the next timer due at or before `now`, skipping cancelled entries
    pub fn pop_due(&mut self, now: Tick) -> Option<(TimerId, RoomId)> {
        while let Some(Reverse((fire_at, id))) = self.heap.peek().copied() {
            if fire_at > now {
                return None;
            }
            self.heap.pop();
            if let Some(room) = self.entries.remove(&id) {
                return Some((TimerId(id), room));
            }
        }
        None
    }

    pub fn pending_count(&self) -> usize {
        self.entries.len()
    }
}

impl DelayService for TickQueue {
    fn schedule(&mut self, now: Tick, delay: Tick, room: RoomId) -> TimerId {
        let id = self.next_timer;
        self.next_timer += 1;
        self.heap.push(Reverse((now + delay, id)));
        self.entries.insert(id, room);
        TimerId(id)
    }

    fn cancel(&mut self, timer: TimerId) -> bool {
        // Lazy cancellation: the heap entry stays and is skipped on pop
        self.entries.remove(&timer.0).is_some()
    }
}

/// Per-room single-timer bookkeeping over a delay service
#[derive(Default)]
pub struct ResetScheduler {
    pending: AHashMap<RoomId, TimerId>,
}

impl ResetScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// A room qualifies while it exists, is not an instanced adventure room,
    /// and carries at least one reset trigger
    fn qualifies(world: &World, room: RoomId) -> bool {
        let Some(room_data) = world.room(room) else {
            return false;
        };
        if room_data.instanced {
            return false;
        }
        world
            .script(EntityRef::Room(room))
            .is_some_and(|script| {
                script.instances().iter().any(|i| {
                    world
                        .trigger_def(i.vnum)
                        .is_some_and(|d| d.events.contains(EventMask::RESET))
                })
            })
    }

    /// Idempotently schedule the room's first reset firing.
    ///
    /// No-op when a timer is already pending or the room does not qualify.
    /// The first firing is offset by a random jitter on top of the interval.
    pub fn ensure_scheduled(
        &mut self,
        world: &mut World,
        delays: &mut dyn DelayService,
        room: RoomId,
    ) {
        if self.pending.contains_key(&room) {
            return;
        }
        if !Self::qualifies(world, room) {
            return;
        }
        let interval = world.config.reset_interval;
        let jitter = match world.config.reset_jitter {
            0 => 0,
            max => world.rng.gen_range(0..=max),
        };
        let timer = delays.schedule(world.current_tick, interval + jitter, room);
        tracing::debug!(room = ?room, delay = interval + jitter, "reset scheduled");
        self.pending.insert(room, timer);
    }

    /// Cancel any pending timer for the room
    pub fn ensure_unscheduled(&mut self, delays: &mut dyn DelayService, room: RoomId) {
        if let Some(timer) = self.pending.remove(&room) {
            delays.cancel(timer);
            tracing::debug!(room = ?room, "reset unscheduled");
        }
    }

    /// Handle one timer firing: re-validate, dispatch, reschedule.
    ///
    /// Stale firings (timer no longer the room's pending one) are ignored.
    /// Repeat firings use the fixed interval with no jitter.
    pub fn on_fire(
        &mut self,
        world: &mut World,
        engine: &mut dyn ScriptEngine,
        delays: &mut dyn DelayService,
        room: RoomId,
        timer: TimerId,
    ) -> Outcome {
        match self.pending.get(&room) {
            Some(current) if *current == timer => {
                self.pending.remove(&room);
            }
            _ => return Outcome::Allowed,
        }
        if !Self::qualifies(world, room) {
            return Outcome::Allowed;
        }

        let outcome = room::reset_triggers(world, engine, room);

        if Self::qualifies(world, room) {
            let interval = world.config.reset_interval;
            let timer = delays.schedule(world.current_tick, interval, room);
            self.pending.insert(room, timer);
        }
        outcome
    }

    pub fn is_scheduled(&self, room: RoomId) -> bool {
        self.pending.contains_key(&room)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::TriggerConfig;
    use crate::core::types::{RoomVnum, TriggerVnum};
    use crate::script::engine::RecordingEngine;
    use crate::script::trigger::{AttachKind, TriggerDefinition, TriggerFlags};

    fn reset_def(vnum: u32) -> TriggerDefinition {
        TriggerDefinition {
            vnum: TriggerVnum(vnum),
            name: "restock".into(),
            attach: AttachKind::Room,
            events: EventMask::RESET,
            numeric_arg: 100,
            // GLOBAL: fires with no players present
            text_arg: None,
            flags: TriggerFlags::GLOBAL,
        }
    }

    fn qualifying_world() -> (World, RoomId) {
        let mut world = World::new(71);
        let room = world.create_room(RoomVnum(1), false);
        world.define_trigger(reset_def(1));
        world
            .attach_trigger(EntityRef::Room(room), TriggerVnum(1))
            .unwrap();
        (world, room)
    }

    #[test]
    fn test_ensure_scheduled_is_idempotent() {
        let (mut world, room) = qualifying_world();
        let mut queue = TickQueue::new();
        let mut scheduler = ResetScheduler::new();

        scheduler.ensure_scheduled(&mut world, &mut queue, room);
        scheduler.ensure_scheduled(&mut world, &mut queue, room);
        assert_eq!(scheduler.pending_count(), 1);
        assert_eq!(queue.pending_count(), 1);

        scheduler.ensure_unscheduled(&mut queue, room);
        assert_eq!(scheduler.pending_count(), 0);
        assert_eq!(queue.pending_count(), 0);
    }

    #[test]
    fn test_non_qualifying_rooms_never_schedule() {
        let mut world = World::new(71);
        let plain = world.create_room(RoomVnum(1), false);
        let instanced = world.create_room(RoomVnum(2), true);
        world.define_trigger(reset_def(1));
        world
            .attach_trigger(EntityRef::Room(instanced), TriggerVnum(1))
            .unwrap();

        let mut queue = TickQueue::new();
        let mut scheduler = ResetScheduler::new();
        scheduler.ensure_scheduled(&mut world, &mut queue, plain);
        scheduler.ensure_scheduled(&mut world, &mut queue, instanced);
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn test_fire_dispatches_and_reschedules_without_jitter() {
        let (mut world, room) = qualifying_world();
        let mut queue = TickQueue::new();
        let mut scheduler = ResetScheduler::new();
        scheduler.ensure_scheduled(&mut world, &mut queue, room);

        // Advance past interval plus maximum jitter
        world.current_tick = world.config.reset_interval + world.config.reset_jitter;
        let (timer, fired_room) = queue.pop_due(world.current_tick).unwrap();
        assert_eq!(fired_room, room);

        let mut engine = RecordingEngine::new();
        scheduler.on_fire(&mut world, &mut engine, &mut queue, room, timer);
        assert_eq!(engine.invocation_count(), 1);

        // Rescheduled exactly one interval out
        assert!(scheduler.is_scheduled(room));
        assert!(queue.pop_due(world.current_tick + world.config.reset_interval - 1).is_none());
        let next = queue.pop_due(world.current_tick + world.config.reset_interval);
        assert!(next.is_some());
    }

    #[test]
    fn test_fire_after_trigger_removed_does_not_reschedule() {
        let (mut world, room) = qualifying_world();
        let mut queue = TickQueue::new();
        let mut scheduler = ResetScheduler::new();
        scheduler.ensure_scheduled(&mut world, &mut queue, room);

        world.remove_script(EntityRef::Room(room));
        world.current_tick = world.config.reset_interval + world.config.reset_jitter;
        let (timer, _) = queue.pop_due(world.current_tick).unwrap();

        let mut engine = RecordingEngine::new();
        scheduler.on_fire(&mut world, &mut engine, &mut queue, room, timer);
        assert_eq!(engine.invocation_count(), 0);
        assert!(!scheduler.is_scheduled(room));
        assert_eq!(queue.pending_count(), 0);
    }

    #[test]
    fn test_stale_fire_is_ignored() {
        let (mut world, room) = qualifying_world();
        let mut queue = TickQueue::new();
        let mut scheduler = ResetScheduler::new();
        scheduler.ensure_scheduled(&mut world, &mut queue, room);

        scheduler.ensure_unscheduled(&mut queue, room);
        scheduler.ensure_scheduled(&mut world, &mut queue, room);

        // A token from before the cancel must not cancel the fresh timer
        let stale = TimerId(0);
        let mut engine = RecordingEngine::new();
        scheduler.on_fire(&mut world, &mut engine, &mut queue, room, stale);
        assert_eq!(engine.invocation_count(), 0);
        assert!(scheduler.is_scheduled(room));
    }

    #[test]
    fn test_zero_jitter_config_schedules_at_interval() {
        let config = TriggerConfig {
            reset_interval: 100,
            reset_jitter: 0,
            ..TriggerConfig::default()
        };
        let mut world = World::with_config(71, config);
        let room = world.create_room(RoomVnum(1), false);
        world.define_trigger(reset_def(1));
        world
            .attach_trigger(EntityRef::Room(room), TriggerVnum(1))
            .unwrap();

        let mut queue = TickQueue::new();
        let mut scheduler = ResetScheduler::new();
        scheduler.ensure_scheduled(&mut world, &mut queue, room);

        assert!(queue.pop_due(99).is_none());
        assert!(queue.pop_due(100).is_some());
    }
}
