//! Runtime script state attached to one concrete entity

use ahash::AHashMap;

use crate::core::types::{InstanceId, TriggerVnum};
use crate::script::context::ScriptValue;

/// One attached trigger: a reference to a content definition plus the
/// world-unique id that identifies this attachment across mutations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerInstance {
    pub id: InstanceId,
    pub vnum: TriggerVnum,
}

/// Mutable runtime script state owned by exactly one entity
///
/// Holds the ordered trigger attachment list and the key/value variable map
/// the script-execution service reads its context from. Scripts may attach
/// or detach triggers on any entity at any time, including the one currently
/// being dispatched; dispatch copes by snapshotting instance ids up front.
#[derive(Debug, Clone, Default)]
pub struct LiveScript {
    instances: Vec<TriggerInstance>,
    pub variables: AHashMap<String, ScriptValue>,
}

impl LiveScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, id: InstanceId, vnum: TriggerVnum) {
        self.instances.push(TriggerInstance { id, vnum });
    }

    /// Detach an instance by id. Returns true if it was present.
    pub fn detach(&mut self, id: InstanceId) -> bool {
        let before = self.instances.len();
        self.instances.retain(|instance| instance.id != id);
        self.instances.len() != before
    }

    /// Detach the first instance referencing the given definition
    pub fn detach_vnum(&mut self, vnum: TriggerVnum) -> Option<InstanceId> {
        let pos = self.instances.iter().position(|i| i.vnum == vnum)?;
        Some(self.instances.remove(pos).id)
    }

    pub fn instances(&self) -> &[TriggerInstance] {
        &self.instances
    }

    pub fn find(&self, id: InstanceId) -> Option<TriggerInstance> {
        self.instances.iter().copied().find(|i| i.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn set_var(&mut self, name: impl Into<String>, value: ScriptValue) {
        self.variables.insert(name.into(), value);
    }

    pub fn get_var(&self, name: &str) -> Option<&ScriptValue> {
        self.variables.get(name)
    }

    pub fn clear_var(&mut self, name: &str) {
        self.variables.remove(name);
    }
}
