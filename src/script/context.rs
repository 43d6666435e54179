//! Dispatch results and the per-call context bound into script variables

use crate::core::types::{AbilityId, CurrencyId, Direction, LanguageId, QuestVnum};
use crate::script::live::LiveScript;
use crate::world::{CreatureId, ItemId, RoomId, VehicleId};

/// Result of one dispatch call
///
/// Replaces the classic `1`/`0`/`-1` integer codes with named cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No trigger objected; the game action proceeds
    Allowed,
    /// A trigger blocked the action
    Blocked,
    /// The interaction target was destroyed as a script side effect
    TargetGone,
}

impl Outcome {
    pub fn allowed(self) -> bool {
        self == Outcome::Allowed
    }

    /// Combine canvass results. A loss of the target outranks a plain block,
    /// which outranks an allow.
    pub fn and(self, other: Outcome) -> Outcome {
        match (self, other) {
            (Outcome::TargetGone, _) | (_, Outcome::TargetGone) => Outcome::TargetGone,
            (Outcome::Blocked, _) | (_, Outcome::Blocked) => Outcome::Blocked,
            _ => Outcome::Allowed,
        }
    }

    /// Collapse `TargetGone` into `Blocked` for callers that do not
    /// distinguish the two
    pub fn collapse_gone(self) -> Outcome {
        match self {
            Outcome::TargetGone => Outcome::Blocked,
            other => other,
        }
    }
}

/// Value stored in a live script's variable map
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptValue {
    Int(i64),
    Str(String),
    Creature(CreatureId),
    Item(ItemId),
    Room(RoomId),
    Vehicle(VehicleId),
}

/// Quest identity threaded explicitly through quest-trigger dispatch,
/// never stored at process scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestContext {
    pub vnum: QuestVnum,
    pub name: String,
    /// Live adventure-instance id, when the quest runs inside one
    pub instance: Option<u64>,
}

/// Variable names the engine binds before invoking the script service.
///
/// Presence and spelling are a compatibility surface for existing content;
/// do not rename.
pub const BOUND_VARS: &[&str] = &[
    "actor",
    "victim",
    "object",
    "target",
    "vehicle",
    "direction",
    "method",
    "cost",
    "currency",
    "shopkeeper",
    "ability",
    "abilityname",
    "speech",
    "lang",
    "lang_vnum",
    "questvnum",
    "questname",
    "amount",
    "hit",
    "command",
    "preventable",
    "arg",
    "cmd",
    "room",
    "killer",
];

/// Ephemeral per-call bundle of typed values bound into the live script's
/// variable map immediately before script execution and cleared afterward
#[derive(Debug, Clone, Default)]
pub struct DispatchContext {
    pub actor: Option<CreatureId>,
    pub victim: Option<CreatureId>,
    pub killer: Option<CreatureId>,
    pub shopkeeper: Option<CreatureId>,
    pub object: Option<ItemId>,
    pub target: Option<ItemId>,
    pub vehicle: Option<VehicleId>,
    pub room: Option<RoomId>,
    pub direction: Option<Direction>,
    /// Non-compass movement, e.g. a vehicle's named exit
    pub custom_direction: Option<String>,
    /// How something happened: "open"/"close" for doors, "eat"/"quaff" for
    /// consumption, the death method, and similar
    pub method: Option<String>,
    pub cost: Option<i64>,
    pub currency: Option<CurrencyId>,
    pub ability: Option<AbilityId>,
    pub ability_name: Option<String>,
    pub speech: Option<String>,
    pub language: Option<LanguageId>,
    pub language_name: Option<String>,
    pub amount: Option<i64>,
    /// Health percent for low-health and fight dispatch
    pub hit: Option<i64>,
    pub command: Option<String>,
    pub argument: Option<String>,
    pub preventable: Option<bool>,
    pub quest: Option<QuestContext>,
}

impl DispatchContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write every populated field into the variable map under its fixed name
    pub fn bind_into(&self, script: &mut LiveScript) {
        if let Some(id) = self.actor {
            script.set_var("actor", ScriptValue::Creature(id));
        }
        if let Some(id) = self.victim {
            script.set_var("victim", ScriptValue::Creature(id));
        }
        if let Some(id) = self.killer {
            script.set_var("killer", ScriptValue::Creature(id));
        }
        if let Some(id) = self.shopkeeper {
            script.set_var("shopkeeper", ScriptValue::Creature(id));
        }
        if let Some(id) = self.object {
            script.set_var("object", ScriptValue::Item(id));
        }
        if let Some(id) = self.target {
            script.set_var("target", ScriptValue::Item(id));
        }
        if let Some(id) = self.vehicle {
            script.set_var("vehicle", ScriptValue::Vehicle(id));
        }
        if let Some(id) = self.room {
            script.set_var("room", ScriptValue::Room(id));
        }
        if let Some(dir) = self.direction {
            script.set_var("direction", ScriptValue::Str(dir.as_str().into()));
        } else if let Some(custom) = &self.custom_direction {
            script.set_var("direction", ScriptValue::Str(custom.clone()));
        }
        if let Some(method) = &self.method {
            script.set_var("method", ScriptValue::Str(method.clone()));
        }
        if let Some(cost) = self.cost {
            script.set_var("cost", ScriptValue::Int(cost));
        }
        if let Some(currency) = self.currency {
            script.set_var("currency", ScriptValue::Int(currency.0 as i64));
        }
        if let Some(ability) = self.ability {
            script.set_var("ability", ScriptValue::Int(ability.0 as i64));
        }
        if let Some(name) = &self.ability_name {
            script.set_var("abilityname", ScriptValue::Str(name.clone()));
        }
        if let Some(speech) = &self.speech {
            script.set_var("speech", ScriptValue::Str(speech.clone()));
        }
        if let Some(name) = &self.language_name {
            script.set_var("lang", ScriptValue::Str(name.clone()));
        }
        if let Some(lang) = self.language {
            script.set_var("lang_vnum", ScriptValue::Int(lang.0 as i64));
        }
        if let Some(quest) = &self.quest {
            script.set_var("questvnum", ScriptValue::Int(quest.vnum.0 as i64));
            script.set_var("questname", ScriptValue::Str(quest.name.clone()));
        }
        if let Some(amount) = self.amount {
            script.set_var("amount", ScriptValue::Int(amount));
        }
        if let Some(hit) = self.hit {
            script.set_var("hit", ScriptValue::Int(hit));
        }
        if let Some(command) = &self.command {
            script.set_var("command", ScriptValue::Str(command.clone()));
            script.set_var("cmd", ScriptValue::Str(command.clone()));
        }
        if let Some(argument) = &self.argument {
            script.set_var("arg", ScriptValue::Str(argument.clone()));
        }
        if let Some(preventable) = self.preventable {
            script.set_var("preventable", ScriptValue::Int(preventable as i64));
        }
    }

    /// Remove every reserved variable name from the map
    pub fn unbind_from(script: &mut LiveScript) {
        for name in BOUND_VARS {
            script.clear_var(name);
        }
    }
}
