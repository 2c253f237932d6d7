//! Subprocess execution for the external index tools.

use std::process::Command;

use thiserror::Error;
use tracing::info;

/// Failure of one external tool invocation.
#[derive(Error, Debug)]
pub enum ToolError {
    /// The tool ran and exited with a non-zero status.
    #[error("command failed: {command}")]
    Failed { command: String },

    /// The tool could not be started at all.
    #[error("failed to start {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Executes prepared tool invocations.
///
/// This is the only seam between the orchestration logic and the
/// operating system; tests substitute a recording implementation to
/// observe exactly which tools would run with which arguments.
pub trait Invoker {
    fn invoke(&self, cmd: &mut Command) -> std::result::Result<(), ToolError>;
}

/// The production [`Invoker`]: spawn the process, inherit stdio, block
/// until it exits, and treat any non-zero status as fatal.
pub struct Subprocess;

impl Invoker for Subprocess {
    fn invoke(&self, cmd: &mut Command) -> std::result::Result<(), ToolError> {
        let command = render_command(cmd);
        info!(command = %command, "running tool");
        let status = cmd.status().map_err(|source| ToolError::Spawn {
            command: command.clone(),
            source,
        })?;
        if !status.success() {
            return Err(ToolError::Failed { command });
        }
        Ok(())
    }
}

/// Render a command line for logs and error messages.
pub fn render_command(cmd: &Command) -> String {
    let mut rendered = cmd.get_program().to_string_lossy().into_owned();
    for arg in cmd.get_args() {
        rendered.push(' ');
        rendered.push_str(&arg.to_string_lossy());
    }
    rendered
}
