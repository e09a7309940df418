//! Plugin registry - name-keyed factory lookup
//!
//! The registry maps implementation type names to factories, enabling
//! configuration-driven plugin instantiation. It is populated at startup
//! and never modified at runtime.
//!
//! # Design
//!
//! - **Compile-time extensibility**: embedders implement `InputFactory` /
//!   `OutputFactory` and register them before the pipeline starts
//! - **Fail fast**: factories validate settings during `create`; a bad
//!   descriptor aborts startup
//! - **Allocate, don't start**: `create_*` returns the runtime instance
//!   without starting it; the coordinator controls start order (outputs
//!   first, then inputs)

use std::collections::HashMap;

use crate::{InputPlugin, OutputPlugin, PluginDescriptor, PluginError, Result};

/// Factory for input plugin instances
pub trait InputFactory: Send + Sync {
    /// Implementation type name used in configuration
    fn type_name(&self) -> &'static str;

    /// Create an instance from a descriptor, validating its settings
    fn create(&self, descriptor: &PluginDescriptor) -> Result<Box<dyn InputPlugin>>;
}

/// Factory for output plugin instances
pub trait OutputFactory: Send + Sync {
    /// Implementation type name used in configuration
    fn type_name(&self) -> &'static str;

    /// Create an instance from a descriptor, validating its settings
    fn create(&self, descriptor: &PluginDescriptor) -> Result<Box<dyn OutputPlugin>>;
}

/// Registry of plugin factories, keyed by type name
#[derive(Default)]
pub struct Registry {
    inputs: HashMap<&'static str, Box<dyn InputFactory>>,
    outputs: HashMap<&'static str, Box<dyn OutputFactory>>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an input factory
    ///
    /// # Panics
    ///
    /// Panics if the type name is already registered. Registration happens
    /// once at startup, so a duplicate is a programming error.
    pub fn register_input<F: InputFactory + 'static>(&mut self, factory: F) {
        let name = factory.type_name();
        if self.inputs.insert(name, Box::new(factory)).is_some() {
            panic!("input factory '{}' already registered", name);
        }
    }

    /// Register an output factory
    ///
    /// # Panics
    ///
    /// Panics if the type name is already registered.
    pub fn register_output<F: OutputFactory + 'static>(&mut self, factory: F) {
        let name = factory.type_name();
        if self.outputs.insert(name, Box::new(factory)).is_some() {
            panic!("output factory '{}' already registered", name);
        }
    }

    /// Instantiate an input plugin from its descriptor
    ///
    /// The instance is allocated but not started.
    pub fn create_input(&self, descriptor: &PluginDescriptor) -> Result<Box<dyn InputPlugin>> {
        let factory = self.inputs.get(descriptor.type_name.as_str()).ok_or_else(|| {
            PluginError::config(format!(
                "unknown input type '{}', available: [{}]",
                descriptor.type_name,
                self.input_types().join(", ")
            ))
        })?;
        factory.create(descriptor)
    }

    /// Instantiate an output plugin from its descriptor
    pub fn create_output(&self, descriptor: &PluginDescriptor) -> Result<Box<dyn OutputPlugin>> {
        let factory = self.outputs.get(descriptor.type_name.as_str()).ok_or_else(|| {
            PluginError::config(format!(
                "unknown output type '{}', available: [{}]",
                descriptor.type_name,
                self.output_types().join(", ")
            ))
        })?;
        factory.create(descriptor)
    }

    /// Registered input type names, sorted
    pub fn input_types(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.inputs.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Registered output type names, sorted
    pub fn output_types(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.outputs.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Whether an input type is registered
    pub fn has_input_type(&self, type_name: &str) -> bool {
        self.inputs.contains_key(type_name)
    }

    /// Whether an output type is registered
    pub fn has_output_type(&self, type_name: &str) -> bool {
        self.outputs.contains_key(type_name)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("inputs", &self.input_types())
            .field("outputs", &self.output_types())
            .finish()
    }
}
