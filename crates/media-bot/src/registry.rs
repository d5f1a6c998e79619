//! Command registry built once at startup.

use crate::commands::Command;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A named batch of commands loaded together.
pub struct CommandGroup {
    pub name: &'static str,
    pub commands: Vec<Arc<dyn Command>>,
}

impl CommandGroup {
    pub fn new(name: &'static str, commands: Vec<Arc<dyn Command>>) -> Self {
        Self { name, commands }
    }
}

struct Registered {
    group: &'static str,
    command: Arc<dyn Command>,
}

/// Read-only mapping from lower-cased command name to handler.
#[derive(Default)]
pub struct CommandRegistry {
    commands: BTreeMap<String, Registered>,
}

impl CommandRegistry {
    /// Load groups in order. A later registration of the same name replaces the earlier one.
    pub fn load(groups: Vec<CommandGroup>) -> Self {
        info!("Loading commands...");
        let mut commands: BTreeMap<String, Registered> = BTreeMap::new();
        let mut count = 0;

        for group in groups {
            for command in group.commands {
                let name = command.name().trim().to_lowercase();
                if name.is_empty() || name.chars().any(char::is_whitespace) {
                    warn!(
                        "Skipping command with invalid name {:?} in group {}",
                        command.name(),
                        group.name
                    );
                    continue;
                }

                if let Some(previous) = commands.insert(
                    name.clone(),
                    Registered {
                        group: group.name,
                        command,
                    },
                ) {
                    warn!(
                        "Command {} from group {} replaced the one from group {}",
                        name, group.name, previous.group
                    );
                }
                debug!("Loaded command: {} ({})", name, group.name);
                count += 1;
            }
        }

        info!("{} commands loaded successfully.", count);
        Self { commands }
    }

    /// Look up a command; `name` is lower-cased first.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Command>> {
        self.commands
            .get(&name.to_lowercase())
            .map(|r| r.command.clone())
    }

    /// Commands in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn Command>)> {
        self.commands
            .iter()
            .map(|(name, r)| (name.as_str(), &r.command))
    }

    pub fn names(&self) -> Vec<&str> {
        self.commands.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
