//! The opaque script-execution service boundary
//!
//! The trigger engine decides *whether* a trigger fires; a `ScriptEngine`
//! implementation decides what its body does. The engine may mutate or
//! destroy any entity, including the one the trigger is attached to, and may
//! re-entrantly invoke dispatch. Its integer return is the only signal this
//! crate reacts to: nonzero continues the game action, zero blocks it.

use ahash::AHashMap;

use crate::core::types::{InstanceId, TriggerVnum};
use crate::script::trigger::TriggerDefinition;
use crate::world::{EntityRef, World};

/// Script body execution, supplied by the interpreter layer
pub trait ScriptEngine {
    fn execute(
        &mut self,
        world: &mut World,
        entity: EntityRef,
        instance: InstanceId,
        def: &TriggerDefinition,
    ) -> i64;
}

/// Side effect a [`RecordingEngine`] applies to the world before returning
pub type EngineEffect = Box<dyn FnMut(&mut World)>;

/// Test engine: records every invocation and returns scripted results.
///
/// Per-vnum results default to 1 (continue). Effects let a test simulate a
/// script purging entities or attaching triggers mid-dispatch.
#[derive(Default)]
pub struct RecordingEngine {
    pub invocations: Vec<(EntityRef, TriggerVnum)>,
    results: AHashMap<TriggerVnum, i64>,
    effects: AHashMap<TriggerVnum, EngineEffect>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the integer result for a given trigger definition
    pub fn set_result(&mut self, vnum: TriggerVnum, result: i64) {
        self.results.insert(vnum, result);
    }

    /// Script a world mutation to run whenever the given trigger executes
    pub fn set_effect(&mut self, vnum: TriggerVnum, effect: impl FnMut(&mut World) + 'static) {
        self.effects.insert(vnum, Box::new(effect));
    }

    pub fn invocation_count(&self) -> usize {
        self.invocations.len()
    }

    /// How many times a particular trigger definition executed
    pub fn count_for(&self, vnum: TriggerVnum) -> usize {
        self.invocations.iter().filter(|(_, v)| *v == vnum).count()
    }
}

impl ScriptEngine for RecordingEngine {
    fn execute(
        &mut self,
        world: &mut World,
        entity: EntityRef,
        _instance: InstanceId,
        def: &TriggerDefinition,
    ) -> i64 {
        self.invocations.push((entity, def.vnum));
        if let Some(effect) = self.effects.get_mut(&def.vnum) {
            effect(world);
        }
        self.results.get(&def.vnum).copied().unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::RoomVnum;
    use crate::script::trigger::{AttachKind, EventMask, TriggerFlags};

    #[test]
    fn test_recording_engine_defaults_to_continue() {
        let mut world = World::new(1);
        let room = world.create_room(RoomVnum(1), false);
        let def = TriggerDefinition {
            vnum: TriggerVnum(5),
            name: "test".into(),
            attach: AttachKind::Room,
            events: EventMask::RANDOM,
            numeric_arg: 100,
            text_arg: None,
            flags: TriggerFlags::empty(),
        };

        let mut engine = RecordingEngine::new();
        let result = engine.execute(&mut world, EntityRef::Room(room), InstanceId(1), &def);
        assert_eq!(result, 1);
        assert_eq!(engine.invocation_count(), 1);

        engine.set_result(TriggerVnum(5), 0);
        let result = engine.execute(&mut world, EntityRef::Room(room), InstanceId(1), &def);
        assert_eq!(result, 0);
        assert_eq!(engine.count_for(TriggerVnum(5)), 2);
    }
}
