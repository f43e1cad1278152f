//! Static command registration table.
//!
//! Commands are registered once at startup through [`CommandRegistryBuilder`].
//! Each registration fixes the handler signature at compile time: either the
//! handler takes only the [`CommandContext`], or it also takes an optional,
//! statically typed argument bound from the caller's JSON.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use super::{CommandContext, CommandError, DISPATCH_TARGET};

type Invoke =
    Box<dyn Fn(&mut CommandContext<'_>, Option<Value>) -> Result<(), CommandError> + Send + Sync>;

/// A registered command: its name, argument shape and type-erased handler.
pub struct CommandDescriptor {
    name: String,
    argument_shape: Option<&'static str>,
    invoke: Invoke,
}

impl CommandDescriptor {
    /// Name typed at the prompt.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type name of the argument shape, or `None` for commands without one.
    #[must_use]
    pub fn argument_shape(&self) -> Option<&'static str> {
        self.argument_shape
    }

    /// Whether text after the name is parsed as an argument object.
    #[must_use]
    pub fn takes_arguments(&self) -> bool {
        self.argument_shape.is_some()
    }

    /// Runs the handler. `arguments` is ignored for commands without a shape.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Binding`] when `arguments` cannot populate the
    /// shape, and propagates any error the handler returns.
    pub fn invoke(
        &self,
        context: &mut CommandContext<'_>,
        arguments: Option<Value>,
    ) -> Result<(), CommandError> {
        (self.invoke)(context, arguments)
    }
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("CommandDescriptor")
            .field("name", &self.name)
            .field("argument_shape", &self.argument_shape)
            .finish_non_exhaustive()
    }
}

/// Immutable lookup table from command name to descriptor.
#[derive(Debug)]
pub struct CommandRegistry {
    commands: BTreeMap<String, CommandDescriptor>,
    names: Vec<String>,
}

impl CommandRegistry {
    /// Starts an empty registration table.
    #[must_use]
    pub fn builder() -> CommandRegistryBuilder {
        CommandRegistryBuilder::default()
    }

    /// Looks up a command by exact name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CommandDescriptor> {
        self.commands.get(name)
    }

    /// Registered names in sorted order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of registered commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether no command is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Collects command registrations. The first registration of a name wins.
#[derive(Default)]
pub struct CommandRegistryBuilder {
    commands: BTreeMap<String, CommandDescriptor>,
}

impl CommandRegistryBuilder {
    /// Registers a command that takes no argument.
    #[must_use]
    pub fn command<F>(self, name: &str, handler: F) -> Self
    where
        F: Fn(&mut CommandContext<'_>) -> Result<(), CommandError> + Send + Sync + 'static,
    {
        self.insert(CommandDescriptor {
            name: name.to_owned(),
            argument_shape: None,
            invoke: Box::new(move |context: &mut CommandContext<'_>, _arguments: Option<Value>| {
                handler(context)
            }),
        })
    }

    /// Registers a command taking an optional argument of shape `A`.
    ///
    /// The handler receives `None` when the caller typed no argument.
    #[must_use]
    pub fn command_with_args<A, F>(self, name: &str, handler: F) -> Self
    where
        A: DeserializeOwned + 'static,
        F: Fn(&mut CommandContext<'_>, Option<A>) -> Result<(), CommandError>
            + Send
            + Sync
            + 'static,
    {
        let shape = short_type_name::<A>();
        let command = name.to_owned();
        self.insert(CommandDescriptor {
            name: name.to_owned(),
            argument_shape: Some(shape),
            invoke: Box::new(move |context: &mut CommandContext<'_>, arguments: Option<Value>| {
                let bound = arguments
                    .map(serde_json::from_value::<A>)
                    .transpose()
                    .map_err(|source| CommandError::binding(command.as_str(), shape, source))?;
                handler(context, bound)
            }),
        })
    }

    fn insert(mut self, descriptor: CommandDescriptor) -> Self {
        if self.commands.contains_key(descriptor.name()) {
            warn!(
                target: DISPATCH_TARGET,
                command = descriptor.name(),
                "duplicate command registration ignored"
            );
            return self;
        }
        self.commands.insert(descriptor.name.clone(), descriptor);
        self
    }

    /// Freezes the registrations into a lookup table.
    #[must_use]
    pub fn build(self) -> CommandRegistry {
        let names = self.commands.keys().cloned().collect();
        CommandRegistry {
            commands: self.commands,
            names,
        }
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}
