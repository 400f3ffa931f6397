//! Internal process spawning for the launcher

use std::io;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

use super::LaunchCommand;

/// Spawn without waiting; the child gets its own session and no stdio.
pub(super) fn spawn_detached(launch: &LaunchCommand) -> io::Result<()> {
    spawn_detached_reaped(launch).map(|_| ())
}

fn spawn_detached_reaped(launch: &LaunchCommand) -> io::Result<JoinHandle<Option<ExitStatus>>> {
    debug!(
        program = %launch.program,
        args = ?launch.args,
        cwd = %launch.cwd.display(),
        "spawning detached"
    );

    let mut command = Command::new(&launch.program);
    command
        .args(&launch.args)
        .current_dir(&launch.cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        // SAFETY: setsid is async-signal-safe and touches no parent state
        unsafe {
            command.pre_exec(|| {
                libc::setsid();
                Ok(())
            });
        }
    }

    command.spawn().map(reap)
}

/// Platform command that opens a URL in the default browser
pub(super) fn opener(url: &str) -> Command {
    let mut command = if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(windows) {
        let mut command = Command::new("cmd");
        command.args(["/c", "start", ""]);
        command
    } else {
        Command::new("xdg-open")
    };
    command.arg(url);
    command
}

pub(super) fn spawn_quiet(mut command: Command) -> io::Result<()> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|child| {
            reap(child);
        })
}

/// Wait for the child on a background thread so it never lingers as a zombie
fn reap(mut child: Child) -> JoinHandle<Option<ExitStatus>> {
    let pid = child.id();
    thread::spawn(move || match child.wait() {
        Ok(status) => {
            debug!(pid, %status, "child exited");
            Some(status)
        }
        Err(e) => {
            warn!(pid, error = %e, "failed to wait on child");
            None
        }
    })
}
