// src/core/registry.rs

//! Static lookup of command definitions.

use crate::models::{CommandDefinition, RegistryFile};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors raised while building a registry.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The registry file could not be read.
    #[error("Could not read registry file '{path}': {source}")]
    Io {
        /// Path that failed.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The registry TOML is malformed.
    #[error("Failed to parse registry: {0}")]
    Parse(#[from] toml::de::Error),
    /// Two commands share a name or alias.
    #[error("Command name or alias '{0}' is defined more than once.")]
    Duplicate(String),
    /// The chat-mode default command is not defined.
    #[error("Default command '{0}' is not a registered command.")]
    UnknownDefault(String),
}

/// Immutable set of command definitions, indexed by name and alias.
#[derive(Debug, Default, Clone)]
pub struct CommandRegistry {
    commands: Vec<CommandDefinition>,
    // Name or alias -> index into `commands`.
    lookup: HashMap<String, usize>,
    default_command: Option<String>,
}

impl CommandRegistry {
    /// Builds a registry, rejecting duplicate names and aliases.
    pub fn new(commands: Vec<CommandDefinition>) -> Result<Self, RegistryError> {
        let mut lookup = HashMap::new();
        for (position, def) in commands.iter().enumerate() {
            for key in std::iter::once(&def.name).chain(def.aliases.iter()) {
                if lookup.insert(key.clone(), position).is_some() {
                    return Err(RegistryError::Duplicate(key.clone()));
                }
            }
        }
        Ok(Self {
            commands,
            lookup,
            default_command: None,
        })
    }

    /// Parses a registry from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, RegistryError> {
        let file: RegistryFile = toml::from_str(text)?;
        let mut registry = Self::new(file.commands)?;
        if let Some(default) = file.default_command {
            if registry.find(&default).is_none() {
                return Err(RegistryError::UnknownDefault(default));
            }
            registry.default_command = Some(default);
        }
        log::debug!("Registry loaded with {} commands", registry.commands.len());
        Ok(registry)
    }

    /// Reads and parses a registry file.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let text = fs::read_to_string(path).map_err(|e| RegistryError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml(&text)
    }

    /// Finds a command by its name or one of its aliases.
    pub fn find(&self, name_or_alias: &str) -> Option<&CommandDefinition> {
        self.lookup
            .get(name_or_alias)
            .and_then(|&position| self.commands.get(position))
    }

    /// Canonical names a caller with `level` may both see and run, in registry order.
    pub fn visible_names(&self, level: u32) -> Vec<&str> {
        self.commands
            .iter()
            .filter(|def| def.is_visible_to(level) && def.is_accessible_to(level))
            .map(|def| def.name.as_str())
            .collect()
    }

    /// Command receiving free text in chat mode.
    pub fn default_command(&self) -> Option<&CommandDefinition> {
        self.default_command.as_deref().and_then(|name| self.find(name))
    }
}
