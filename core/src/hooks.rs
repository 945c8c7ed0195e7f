//! Invocation hooks: permission checks, legacy argument limits and
//! per-invocation logging.
//!
//! Hooks run in registration order at three points of every invocation.
//! Any hook may abort by returning an error, which skips the handler and
//! every later phase.

use std::sync::Arc;

use tracing::{debug, info};

use crate::command::CommandDescriptor;
use crate::error::CommandError;
use crate::line::ParsedLine;
use crate::locals::Locals;
use crate::value::BoundArgs;

/// Observer of the invocation phases.
pub trait InvokeHook: Send + Sync {
    /// Before any argument is bound.
    fn pre_process(
        &self,
        _command: &CommandDescriptor,
        _line: &ParsedLine,
        _locals: &Locals,
    ) -> Result<(), CommandError> {
        Ok(())
    }

    /// After binding, before the handler runs.
    fn pre_invoke(
        &self,
        _command: &CommandDescriptor,
        _args: &BoundArgs,
        _line: &ParsedLine,
        _locals: &Locals,
    ) -> Result<(), CommandError> {
        Ok(())
    }

    /// After the handler returned successfully.
    fn post_invoke(
        &self,
        _command: &CommandDescriptor,
        _args: &BoundArgs,
        _line: &ParsedLine,
        _locals: &Locals,
    ) -> Result<(), CommandError> {
        Ok(())
    }
}

/// Answers whether the caller described by `locals` holds a permission.
pub trait Authorizer: Send + Sync {
    fn test_permission(&self, locals: &Locals, permission: &str) -> bool;
}

impl<F> Authorizer for F
where
    F: Fn(&Locals, &str) -> bool + Send + Sync,
{
    fn test_permission(&self, locals: &Locals, permission: &str) -> bool {
        self(locals, permission)
    }
}

/// `true` if the command needs no permission or any one of its tags is
/// granted.
pub fn is_permitted(
    authorizer: &dyn Authorizer,
    command: &CommandDescriptor,
    locals: &Locals,
) -> bool {
    command.permissions().is_empty()
        || command
            .permissions()
            .iter()
            .any(|tag| authorizer.test_permission(locals, tag))
}

/// Rejects callers lacking every permission tag of the command.
#[derive(Clone)]
pub struct PermissionHook {
    authorizer: Arc<dyn Authorizer>,
}

impl PermissionHook {
    pub fn new(authorizer: Arc<dyn Authorizer>) -> Self {
        Self { authorizer }
    }

    pub fn authorizer(&self) -> &Arc<dyn Authorizer> {
        &self.authorizer
    }
}

impl InvokeHook for PermissionHook {
    fn pre_process(
        &self,
        command: &CommandDescriptor,
        _line: &ParsedLine,
        locals: &Locals,
    ) -> Result<(), CommandError> {
        if is_permitted(self.authorizer.as_ref(), command, locals) {
            Ok(())
        } else {
            debug!(command = command.primary_alias(), "permission denied");
            Err(CommandError::PermissionDenied)
        }
    }
}

/// Enforces [`CommandSpec::arg_limits`](crate::CommandSpec::arg_limits).
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyArgsHook;

impl InvokeHook for LegacyArgsHook {
    fn pre_process(
        &self,
        command: &CommandDescriptor,
        line: &ParsedLine,
        _locals: &Locals,
    ) -> Result<(), CommandError> {
        let count = line.len();
        if command.min_args().is_some_and(|min| count < min) {
            return Err(CommandError::usage(
                "Too few arguments.",
                command.full_usage(line.command()),
            ));
        }
        if command.max_args().is_some_and(|max| count > max) {
            return Err(CommandError::usage(
                "Too many arguments.",
                command.full_usage(line.command()),
            ));
        }
        Ok(())
    }
}

/// Name of whoever issued the command, for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerName(pub String);

/// Logs every successful bind at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingHook;

impl InvokeHook for LoggingHook {
    fn pre_invoke(
        &self,
        command: &CommandDescriptor,
        _args: &BoundArgs,
        line: &ParsedLine,
        locals: &Locals,
    ) -> Result<(), CommandError> {
        let caller = locals
            .get::<CallerName>()
            .map(|c| c.0.as_str())
            .unwrap_or("console");
        info!(
            caller,
            command = command.primary_alias(),
            args = %line.remaining_from(0),
            "invoking command"
        );
        Ok(())
    }
}
