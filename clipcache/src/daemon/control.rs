// Enable/disable a running daemon from another process
// The daemon disables capture on SIGUSR1 and re-enables it on SIGUSR2.

use std::io;

use crate::daemon::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Enable,
    Disable,
    Toggle,
}

/// Capture state as seen from outside the daemon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonStatus {
    Enabled,
    Disabled,
    NotRunning,
}

impl DaemonStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DaemonStatus::Enabled => "enabled",
            DaemonStatus::Disabled => "disabled",
            DaemonStatus::NotRunning => "not running",
        }
    }
}

pub fn status(config: &Config) -> DaemonStatus {
    if !config.is_daemon_running() {
        return DaemonStatus::NotRunning;
    }
    match config.read_status() {
        Some(false) => DaemonStatus::Disabled,
        // A daemon that has not written its status yet is capturing
        _ => DaemonStatus::Enabled,
    }
}

/// Resolve `Toggle` against the current status
pub fn resolve(command: ControlCommand, current: DaemonStatus) -> ControlCommand {
    match (command, current) {
        (ControlCommand::Toggle, DaemonStatus::Disabled) => ControlCommand::Enable,
        (ControlCommand::Toggle, _) => ControlCommand::Disable,
        (other, _) => other,
    }
}

/// Signal the running daemon. Returns the command actually sent.
#[cfg(unix)]
pub fn send(config: &Config, command: ControlCommand) -> io::Result<ControlCommand> {
    let current = status(config);
    let pid = match (current, config.read_pid()) {
        (DaemonStatus::NotRunning, _) | (_, None) => {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                "clipcached is not running",
            ))
        }
        (_, Some(pid)) => pid,
    };

    let command = resolve(command, current);
    let signal = match command {
        ControlCommand::Disable => libc::SIGUSR1,
        _ => libc::SIGUSR2,
    };

    if unsafe { libc::kill(pid as i32, signal) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(command)
}
