//! Operator commands typed on stdin

use std::fmt;
use std::str::FromStr;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use windmachine_core::WindMachineError;

/// A command entered at the daemon's console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorCommand {
    /// Shut down cleanly
    Stop,
    /// Mark every sensor file inactive
    Reset,
    /// Check for a newer release now
    Update,
    /// Install the release found by the last check
    Install,
    /// Restore default settings; must be entered twice
    ResetSettings,
    /// Print the current values and mode
    Status,
}

impl OperatorCommand {
    pub const ALL: [OperatorCommand; 6] = [
        OperatorCommand::Stop,
        OperatorCommand::Reset,
        OperatorCommand::Update,
        OperatorCommand::Install,
        OperatorCommand::ResetSettings,
        OperatorCommand::Status,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperatorCommand::Stop => "stop",
            OperatorCommand::Reset => "reset",
            OperatorCommand::Update => "update",
            OperatorCommand::Install => "install",
            OperatorCommand::ResetSettings => "reset-settings",
            OperatorCommand::Status => "status",
        }
    }

    pub fn help(&self) -> &'static str {
        match self {
            OperatorCommand::Stop => "close safely (or press Ctrl + C)",
            OperatorCommand::Reset => "reset sensors to -1",
            OperatorCommand::Update => "check for updates",
            OperatorCommand::Install => "install an available update",
            OperatorCommand::ResetSettings => "restore default settings (enter twice)",
            OperatorCommand::Status => "show the current fan values",
        }
    }
}

impl fmt::Display for OperatorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperatorCommand {
    type Err = WindMachineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|cmd| cmd.as_str() == input)
            .ok_or_else(|| WindMachineError::InvalidInput(format!("Unknown command '{}'", s.trim())))
    }
}

/// Forward parsed commands from `input` until it ends or the bridge hangs up.
///
/// Blank lines are ignored and unknown commands are logged and skipped.
pub async fn read_commands<R>(input: R, commands: mpsc::Sender<OperatorCommand>)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                debug!("Console input closed");
                return;
            }
            Err(e) => {
                warn!("Failed to read console input: {}", e);
                return;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<OperatorCommand>() {
            Ok(command) => {
                if commands.send(command).await.is_err() {
                    return;
                }
            }
            Err(e) => warn!("{}", e),
        }
    }
}
