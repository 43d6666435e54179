//! Content loading for trigger and quest definitions

use serde::Deserialize;

use crate::core::error::Result;
use crate::script::trigger::{QuestDefinition, TriggerDefinition};
use crate::world::World;

/// A parsed content file: trigger and quest definitions
#[derive(Debug, Default, Deserialize)]
pub struct ContentPack {
    #[serde(default)]
    pub triggers: Vec<TriggerDefinition>,
    #[serde(default)]
    pub quests: Vec<QuestDefinition>,
}

impl ContentPack {
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Install every definition into the world's libraries
    pub fn install(self, world: &mut World) {
        for def in self.triggers {
            world.define_trigger(def);
        }
        for def in self.quests {
            world.define_quest(def);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{QuestVnum, TriggerVnum};
    use crate::script::trigger::{AttachKind, EventMask};

    const CONTENT: &str = r#"
        [[triggers]]
        vnum = 100
        name = "door warden"
        attach = "Creature"
        events = "GREET | SPEECH"
        numeric_arg = 75
        text_arg = "password"
        flags = "ALLOW_MULTIPLE"

        [[triggers]]
        vnum = 101
        name = "crumbling altar"
        attach = "Room"
        events = "RESET"

        [[quests]]
        vnum = 300
        name = "The Lost Caravan"
        world_triggers = [101]
    "#;

    #[test]
    fn test_load_content_pack() {
        let pack = ContentPack::from_toml(CONTENT).unwrap();
        assert_eq!(pack.triggers.len(), 2);
        assert_eq!(pack.quests.len(), 1);

        let warden = &pack.triggers[0];
        assert_eq!(warden.vnum, TriggerVnum(100));
        assert_eq!(warden.attach, AttachKind::Creature);
        assert!(warden.events.contains(EventMask::GREET | EventMask::SPEECH));
        assert_eq!(warden.numeric_arg, 75);
        assert!(warden.allows_multiple());

        let altar = &pack.triggers[1];
        assert_eq!(altar.numeric_arg, 0);
        assert!(altar.text_arg.is_none());
        assert!(!altar.allows_multiple());
    }

    #[test]
    fn test_install_into_world() {
        let mut world = World::new(1);
        ContentPack::from_toml(CONTENT).unwrap().install(&mut world);

        assert!(world.trigger_def(TriggerVnum(100)).is_some());
        let quest = world.quest_def(QuestVnum(300)).unwrap();
        assert_eq!(quest.world_triggers, vec![TriggerVnum(101)]);
    }

    #[test]
    fn test_malformed_content_is_an_error() {
        assert!(ContentPack::from_toml("[[triggers]]\nvnum = \"not a number\"").is_err());
    }
}
