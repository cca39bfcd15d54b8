//! Skill registry
//!
//! Skills are named shortcuts mapping to a tool invocation with a
//! parameter template. The registry is an explicit object populated at
//! startup and handed to the engine; nothing here is global state.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// A named, reusable tool invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    /// Skill name, used by SkillExecution subtasks
    pub name: String,
    /// What the skill does
    pub description: String,
    /// Tool the skill dispatches to
    pub tool: String,
    /// Parameter template merged with the subtask's own parameters
    #[serde(default)]
    pub parameters: serde_json::Map<String, serde_json::Value>,
}

/// Registry of loaded skills
#[derive(Debug, Clone, Default)]
pub struct SkillRegistry {
    skills: HashMap<String, Skill>,
}

impl SkillRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a skill, replacing any previous one with the same name
    pub fn register(&mut self, skill: Skill) {
        debug!(name = %skill.name, tool = %skill.tool, "Registering skill");
        self.skills.insert(skill.name.clone(), skill);
    }

    /// Look up a skill by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Skill> {
        self.skills.get(name)
    }

    /// Names of all registered skills, sorted
    #[must_use]
    pub fn list_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.skills.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered skills
    #[must_use]
    pub fn len(&self) -> usize {
        self.skills.len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// Load every `*.toml` file in a directory as a skill definition.
    /// Files that fail to parse are logged and skipped; a missing
    /// directory yields an empty registry.
    ///
    /// # Errors
    /// Returns an error if the directory exists but cannot be read.
    pub fn load_dir(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut registry = Self::new();

        if !path.is_dir() {
            debug!(path = %path.display(), "Skills directory not found, starting empty");
            return Ok(registry);
        }

        let entries = std::fs::read_dir(path)
            .map_err(|e| Error::Internal(format!("cannot read skills dir: {}", e)))?;

        for entry in entries {
            let entry = entry.map_err(|e| Error::Internal(e.to_string()))?;
            let file = entry.path();
            if file.extension().and_then(|e| e.to_str()) != Some("toml") {
                continue;
            }
            match std::fs::read_to_string(&file) {
                Ok(content) => match toml::from_str::<Skill>(&content) {
                    Ok(skill) => registry.register(skill),
                    Err(e) => {
                        warn!(file = %file.display(), error = %e, "Skipping malformed skill file");
                    }
                },
                Err(e) => {
                    warn!(file = %file.display(), error = %e, "Skipping unreadable skill file");
                }
            }
        }

        Ok(registry)
    }
}
