//! Plugin descriptors - what the registry instantiates from

use std::collections::HashMap;

use crate::PluginSettings;

/// Which side of the pipeline a plugin sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginKind {
    /// Produces events
    Input,

    /// Consumes batches of completed events
    Output,
}

impl PluginKind {
    /// Lowercase label for error messages and logging
    pub fn label(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
        }
    }
}

/// A configured plugin instance awaiting instantiation
///
/// Owned by the registry layer; the coordinator only ever sees the runtime
/// instance the factory produces from this.
#[derive(Debug, Clone)]
pub struct PluginDescriptor {
    /// Input or output
    pub kind: PluginKind,

    /// Implementation type name (registry key)
    pub type_name: String,

    /// Instance name (unique per kind)
    pub name: String,

    /// Raw settings for the factory
    pub settings: HashMap<String, toml::Value>,
}

impl PluginDescriptor {
    /// Create a descriptor
    pub fn new(
        kind: PluginKind,
        type_name: impl Into<String>,
        name: impl Into<String>,
        settings: HashMap<String, toml::Value>,
    ) -> Self {
        Self {
            kind,
            type_name: type_name.into(),
            name: name.into(),
            settings,
        }
    }

    /// Typed settings accessor for the factory
    pub fn settings(&self) -> PluginSettings {
        PluginSettings::new(self.settings.clone())
    }
}
