//! Command model
//!
//! Schema, typed values, execution context, the thread-safe registry, and
//! the dispatcher that validates parameters before invoking handlers.

pub mod context;
pub mod descriptor;
pub mod dispatcher;
pub mod param;
pub mod registry;

pub use context::CommandContext;
pub use descriptor::CommandDescriptor;
pub use dispatcher::CommandDispatcher;
pub use param::{ParamDescriptor, ParamType, ParamValue};
pub use registry::CommandRegistry;

/// Outcome of executing a command handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandResult {
    /// Handler ran and succeeded
    Success,
    /// Handler ran and failed, or the command was not found
    Failure,
    /// Parameter validation rejected the context; handler was not invoked
    /// (also returnable by a handler that finds a value unusable)
    InvalidParams,
    /// Handler declined to handle the command
    NotHandled,
}

/// A registered voice command's behavior.
///
/// Executed on the recognition consumer thread; hosts needing another
/// thread (e.g. UI) must marshal themselves. The registry owns the handler
/// for the lifetime of its entry.
pub trait CommandHandler: Send + Sync {
    /// Execute with the validated context
    fn execute(&self, context: &CommandContext) -> CommandResult;

    /// Human-readable name for logging
    fn name(&self) -> &str {
        "unnamed_command"
    }
}

/// Closures are handlers, so simple commands don't need a struct:
///
/// ```
/// # use voxkit::command::{CommandContext, CommandResult};
/// let handler = |_ctx: &CommandContext| CommandResult::Success;
/// ```
impl<F> CommandHandler for F
where
    F: Fn(&CommandContext) -> CommandResult + Send + Sync,
{
    fn execute(&self, context: &CommandContext) -> CommandResult {
        self(context)
    }

    fn name(&self) -> &str {
        "closure_command"
    }
}
