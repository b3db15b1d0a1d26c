// src/exec/launcher.rs

//! Starting and signalling the command's process.
//!
//! The platform implementation is picked at build time: on unix the child
//! leads a new process group and termination signals reach the whole group;
//! elsewhere only the child itself is killed.

use std::fmt;
use std::io;
use std::process::Stdio;
use std::sync::Arc;
use std::time::SystemTime;

use tokio::process::{Child, Command};

use crate::engine::RunId;
use crate::types::CommandSpec;

/// A started run: the child process plus bookkeeping.
#[derive(Debug)]
pub struct RunHandle {
    pub run: RunId,
    pub child: Child,
    pub started: SystemTime,
}

impl RunHandle {
    /// OS process id, or `None` once the child has been reaped.
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }
}

pub trait ProcessLauncher: Send + Sync + fmt::Debug {
    /// Spawn `spec` with stdin closed and stdout/stderr piped.
    fn start_in_group(&self, spec: &CommandSpec, run: RunId) -> io::Result<RunHandle>;

    /// Ask the run to stop (`graceful`) or force it. Signalling a process
    /// that is already gone is not an error.
    fn terminate(&self, handle: &mut RunHandle, graceful: bool) -> io::Result<()>;
}

/// The launcher for the platform we were built for.
pub fn platform_launcher() -> Arc<dyn ProcessLauncher> {
    #[cfg(unix)]
    {
        Arc::new(GroupLauncher)
    }
    #[cfg(not(unix))]
    {
        Arc::new(PlainLauncher)
    }
}

fn base_command(spec: &CommandSpec) -> Command {
    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    cmd
}

/// `true` if reaping failed only because the OS no longer knows the child.
pub fn is_no_such_process(err: &io::Error) -> bool {
    #[cfg(unix)]
    {
        use nix::errno::Errno;
        matches!(
            err.raw_os_error(),
            Some(code) if code == Errno::ECHILD as i32 || code == Errno::ESRCH as i32
        )
    }
    #[cfg(not(unix))]
    {
        err.kind() == io::ErrorKind::NotFound
    }
}

#[cfg(unix)]
pub use self::unix::GroupLauncher;

#[cfg(unix)]
mod unix {
    use super::*;

    use nix::errno::Errno;
    use nix::sys::signal::{kill, killpg, Signal};
    use nix::unistd::Pid;
    use tracing::debug;

    /// Runs the child as leader of its own process group and signals the
    /// group: `SIGTERM` when graceful, `SIGKILL` otherwise.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct GroupLauncher;

    impl ProcessLauncher for GroupLauncher {
        fn start_in_group(&self, spec: &CommandSpec, run: RunId) -> io::Result<RunHandle> {
            let mut cmd = base_command(spec);
            cmd.process_group(0);
            let child = cmd.spawn()?;
            debug!(run, pid = ?child.id(), "spawned process group");
            Ok(RunHandle {
                run,
                child,
                started: SystemTime::now(),
            })
        }

        fn terminate(&self, handle: &mut RunHandle, graceful: bool) -> io::Result<()> {
            let Some(pid) = handle.pid() else {
                debug!(run = handle.run, "already reaped; nothing to signal");
                return Ok(());
            };
            let signal = if graceful {
                Signal::SIGTERM
            } else {
                Signal::SIGKILL
            };
            let pid = Pid::from_raw(pid as i32);

            debug!(run = handle.run, %pid, ?signal, "signalling process group");
            match killpg(pid, signal) {
                Ok(()) => Ok(()),
                // The group may be gone while the leader lingers as a zombie.
                Err(Errno::ESRCH) => match kill(pid, signal) {
                    Ok(()) | Err(Errno::ESRCH) => Ok(()),
                    Err(err) => Err(io::Error::from(err)),
                },
                Err(err) => Err(io::Error::from(err)),
            }
        }
    }
}

#[cfg(not(unix))]
pub use self::plain::PlainLauncher;

#[cfg(not(unix))]
mod plain {
    use super::*;

    use tracing::debug;

    /// No process groups: both graceful and forceful termination kill the
    /// child directly.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct PlainLauncher;

    impl ProcessLauncher for PlainLauncher {
        fn start_in_group(&self, spec: &CommandSpec, run: RunId) -> io::Result<RunHandle> {
            let child = base_command(spec).spawn()?;
            Ok(RunHandle {
                run,
                child,
                started: SystemTime::now(),
            })
        }

        fn terminate(&self, handle: &mut RunHandle, graceful: bool) -> io::Result<()> {
            debug!(run = handle.run, graceful, "killing process");
            match handle.child.start_kill() {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == io::ErrorKind::InvalidInput => Ok(()),
                Err(err) => Err(err),
            }
        }
    }
}
