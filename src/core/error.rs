use thiserror::Error;

use crate::core::types::{QuestVnum, TriggerVnum};
use crate::script::trigger::AttachKind;
use crate::world::{CreatureId, ItemId, RoomId, VehicleId};

#[derive(Error, Debug)]
pub enum TriggerError {
    #[error("Creature not found: {0:?}")]
    CreatureNotFound(CreatureId),

    #[error("Item not found: {0:?}")]
    ItemNotFound(ItemId),

    #[error("Room not found: {0:?}")]
    RoomNotFound(RoomId),

    #[error("Vehicle not found: {0:?}")]
    VehicleNotFound(VehicleId),

    #[error("Unknown trigger: {0:?}")]
    UnknownTrigger(TriggerVnum),

    #[error("Unknown quest: {0:?}")]
    UnknownQuest(QuestVnum),

    #[error("Trigger {vnum:?} attaches to {expected:?}, not {actual:?}")]
    AttachMismatch {
        vnum: TriggerVnum,
        expected: AttachKind,
        actual: AttachKind,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Content parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TriggerError>;
