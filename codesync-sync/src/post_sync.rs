//! `postSyncCommands` runner.

use std::path::Path;
use std::process::Command;

/// Run each command through the platform shell, in order, from `cwd`.
///
/// Exit codes are logged and otherwise ignored.
pub fn run_commands(cwd: &Path, commands: &[String]) {
    for command in commands {
        tracing::info!("running post-sync command: {command}");
        match shell(command).current_dir(cwd).status() {
            Ok(status) => tracing::debug!("`{command}` exited with {status}"),
            Err(err) => tracing::warn!("could not start `{command}`: {err}"),
        }
    }
}

#[cfg(windows)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

#[cfg(not(windows))]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}
