//! Command registry
//!
//! Maps lowercase command names to either a built-in handler or a module
//! handler, and remembers which modules are loaded.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let mut registry = CommandRegistry::new();
//!
//! // Built-ins are present from the start
//! assert!(registry.contains("get"));
//!
//! // A module's staged commands are committed all at once
//! registry.commit_module(attribs, staged)?;
//!
//! // Dispatch looks names up case-insensitively
//! let entry = registry.lookup(b"HELLO.SIMPLE");
//! ```

use std::sync::Arc;

use ember_core::{CommandFn, Error, Result};
use rustc_hash::FxHashMap;
use tracing::info;

use crate::commands::{Builtin, BUILTINS};

/// Name and versions a module declared while loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleAttribs {
    /// Module name
    pub name: String,
    /// Module's own version
    pub version: u32,
    /// Protocol version the module bound against
    pub api_version: u32,
}

/// A loaded module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    /// Name, module version and protocol version
    pub attribs: ModuleAttribs,
    /// Commands the module registered, in registration order
    pub commands: Vec<String>,
}

/// What a command name resolves to.
#[derive(Clone)]
pub(crate) enum CommandEntry {
    Builtin(&'static Builtin),
    Module { module: Arc<str>, handler: CommandFn },
}

/// Registry of every dispatchable command
pub(crate) struct CommandRegistry {
    commands: FxHashMap<String, CommandEntry>,
    modules: Vec<ModuleInfo>,
}

impl CommandRegistry {
    /// Create a registry holding the built-in commands
    pub(crate) fn new() -> Self {
        let commands = BUILTINS
            .iter()
            .map(|builtin| (builtin.name.to_string(), CommandEntry::Builtin(builtin)))
            .collect();
        CommandRegistry {
            commands,
            modules: Vec::new(),
        }
    }

    /// Look a command up, ignoring ASCII case
    pub(crate) fn lookup(&self, name: &[u8]) -> Option<CommandEntry> {
        let name = String::from_utf8_lossy(name).to_ascii_lowercase();
        self.commands.get(&name).cloned()
    }

    /// Check whether a command name is taken (case-insensitive)
    pub(crate) fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(&name.to_ascii_lowercase())
    }

    /// Check whether a module with this name is loaded
    pub(crate) fn has_module(&self, name: &str) -> bool {
        self.modules.iter().any(|m| m.attribs.name == name)
    }

    /// Register a loaded module and every command it staged.
    ///
    /// Either everything is registered or nothing is.
    pub(crate) fn commit_module(
        &mut self,
        attribs: ModuleAttribs,
        staged: Vec<(String, CommandFn)>,
    ) -> Result<()> {
        if self.has_module(&attribs.name) {
            return Err(Error::ModuleAlreadyLoaded {
                name: attribs.name,
            });
        }
        if let Some((name, _)) = staged.iter().find(|(name, _)| self.contains(name)) {
            return Err(Error::DuplicateCommand { name: name.clone() });
        }

        let module: Arc<str> = Arc::from(attribs.name.as_str());
        let mut commands = Vec::with_capacity(staged.len());
        for (name, handler) in staged {
            let key = name.to_ascii_lowercase();
            self.commands.insert(
                key,
                CommandEntry::Module {
                    module: module.clone(),
                    handler,
                },
            );
            commands.push(name);
        }
        info!(
            target: "ember::module",
            module = %attribs.name,
            version = attribs.version,
            api_version = attribs.api_version,
            commands = commands.len(),
            "module loaded"
        );
        self.modules.push(ModuleInfo { attribs, commands });
        Ok(())
    }

    /// Every loaded module, in load order
    pub(crate) fn modules(&self) -> &[ModuleInfo] {
        &self.modules
    }
}
