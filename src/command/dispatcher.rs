//! Command dispatcher
//!
//! Validates a context against the command's schema, fills defaults, and
//! invokes the handler. Runs on the recognition consumer thread.

use super::context::CommandContext;
use super::descriptor::CommandDescriptor;
use super::param::{ParamType, ParamValue};
use super::registry::CommandRegistry;
use super::CommandResult;
use std::sync::Arc;
use tracing::{debug, warn};

/// Dispatches recognized commands through the registry
pub struct CommandDispatcher {
    registry: Arc<CommandRegistry>,
}

impl CommandDispatcher {
    pub fn new(registry: Arc<CommandRegistry>) -> Self {
        Self { registry }
    }

    /// Look up `command_name`, validate and default-fill `context` against
    /// its schema, and execute the handler.
    ///
    /// Missing command: `Failure`. Validation failure: `InvalidParams`
    /// without invoking the handler. Otherwise the handler's own result.
    pub fn dispatch(&self, command_name: &str, context: &mut CommandContext) -> CommandResult {
        let Some(handler) = self.registry.find_command(command_name) else {
            warn!(command = command_name, "dispatch: command not found");
            return CommandResult::Failure;
        };
        let Some(descriptor) = self.registry.find_descriptor(command_name) else {
            return CommandResult::Failure;
        };

        if !Self::validate_and_fill_defaults(&descriptor, context) {
            debug!(command = command_name, "dispatch: parameter validation failed");
            return CommandResult::InvalidParams;
        }

        // Handler runs without any registry lock held; the Arc keeps it
        // alive even if the command is unregistered mid-flight.
        handler.execute(context)
    }

    /// Validate `context` against `descriptor`, inserting defaults for
    /// missing optional parameters. Returns false on the first failure,
    /// leaving later parameters untouched.
    pub fn validate_and_fill_defaults(
        descriptor: &CommandDescriptor,
        context: &mut CommandContext,
    ) -> bool {
        for param in &descriptor.parameters {
            let mut present = context.has_param(&param.name);

            if !present && param.required {
                return false;
            }

            if !present && !param.default_value.is_empty() {
                context.set_param(&param.name, ParamValue::new(param.default_value.clone()));
                present = true;
            }

            // Optional, absent, no default: nothing to validate
            if !present {
                continue;
            }

            let value = context
                .param(&param.name)
                .cloned()
                .unwrap_or_default();

            match param.param_type {
                ParamType::Integer => {
                    let Ok(int_value) = value.as_int() else {
                        return false;
                    };
                    if let Some(min) = param.min_value {
                        if int_value < min as i64 {
                            return false;
                        }
                    }
                    if let Some(max) = param.max_value {
                        if int_value > max as i64 {
                            return false;
                        }
                    }
                }

                ParamType::Double => {
                    let Ok(double_value) = value.as_double() else {
                        return false;
                    };
                    if let Some(min) = param.min_value {
                        if double_value < min {
                            return false;
                        }
                    }
                    if let Some(max) = param.max_value {
                        if double_value > max {
                            return false;
                        }
                    }
                }

                ParamType::Bool => {
                    if value.as_bool().is_err() {
                        return false;
                    }
                }

                ParamType::Enum => {
                    let text = value.as_str();
                    let found = param
                        .enum_values
                        .iter()
                        .any(|allowed| allowed.eq_ignore_ascii_case(text));
                    if !found {
                        return false;
                    }
                }

                ParamType::String => {}
            }
        }

        true
    }
}
