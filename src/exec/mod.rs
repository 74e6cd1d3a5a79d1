/*!
Child process execution.

Two modes:
  - buffered: `Command::run` (or `start` + `Execution::wait`) captures stdout /
    stderr, enforces an optional timeout and returns an `ExecutionResult`.
  - attached: `Command::run_attached` hands the terminal to the child through
    the platform shell and captures nothing.

A `Command` is a single shell-style command line plus execution options
(timeout, acting user, working directory, replacement environment). The line
is split with shell-word rules, so arguments built with `escape` round-trip
exactly.

Spawn problems (bad program, unknown user) are `ExecError`s. A child that runs
and fails is reported through `ExecutionResult::failed`, never as an error.

The buffered API must be used from inside a Tokio runtime.
*/

mod credentials;
mod error;
mod usage;

pub use error::ExecError;
pub use usage::ResourceUsage;

use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Child;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// How long output drains may run on after a timed-out child was killed.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Join `program` and `args` into one shell-quoted command line.
pub fn escape(program: &str, args: &[String]) -> String {
    shell_words::join(std::iter::once(program).chain(args.iter().map(String::as_str)))
}

/// A command line plus the options it should run with.
#[derive(Debug, Clone, Default)]
pub struct Command {
    line: String,
    timeout: Option<Duration>,
    user: Option<String>,
    working_dir: Option<PathBuf>,
    environment: Option<Vec<(OsString, OsString)>>,
}

impl Command {
    pub fn new(line: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            ..Default::default()
        }
    }

    /// Build a command from a program and an argument vector, quoting as needed.
    pub fn from_args(program: &str, args: &[String]) -> Self {
        Self::new(escape(program, args))
    }

    pub fn line(&self) -> &str {
        &self.line
    }

    /// Kill the child if it is still running after `timeout`.
    pub fn timeout(&mut self, timeout: Duration) -> &mut Self {
        self.timeout = Some(timeout);
        self
    }

    /// Run the child as `user` (name or numeric uid).
    pub fn user(&mut self, user: impl Into<String>) -> &mut Self {
        self.user = Some(user.into());
        self
    }

    pub fn working_dir(&mut self, dir: impl Into<PathBuf>) -> &mut Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Replace the inherited environment entirely.
    pub fn environment<I, K, V>(&mut self, vars: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<OsString>,
        V: Into<OsString>,
    {
        self.environment = Some(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Spawn the child with captured output. Does not wait for it.
    pub fn start(&self) -> Result<Execution, ExecError> {
        let words = shell_words::split(&self.line).map_err(|source| {
            ExecError::InvalidCommandLine {
                line: self.line.clone(),
                source,
            }
        })?;
        let (program, args) = words.split_first().ok_or(ExecError::EmptyCommand)?;
        // Unresolvable names are left for the OS to reject at spawn time.
        let path = which::which(program).unwrap_or_else(|_| PathBuf::from(program));

        let mut cmd = tokio::process::Command::new(&path);
        cmd.args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        self.configure(&mut cmd)?;
        // Own process group so a timeout reaches grandchildren too. Only with
        // a timeout: a background group is stopped if it reads the terminal.
        #[cfg(unix)]
        if self.timeout.is_some() {
            cmd.process_group(0);
        }

        let usage_before = ResourceUsage::children();
        let mut child = cmd.spawn().map_err(|source| ExecError::Spawn {
            program: path.display().to_string(),
            source,
        })?;
        let started = Instant::now();
        let pid = child.id().unwrap_or_default();
        debug!(pid, program = %path.display(), "spawned");

        let stdout = child.stdout.take().map(|out| tokio::spawn(drain(out)));
        let stderr = child.stderr.take().map(|err| tokio::spawn(drain(err)));

        Ok(Execution {
            child,
            pid,
            started,
            usage_before,
            stdout,
            stderr,
            timeout: self.timeout,
            user: self.user.clone(),
        })
    }

    /// Spawn and wait; see `Execution::wait`.
    pub async fn run(&self) -> Result<ExecutionResult, ExecError> {
        self.start()?.wait().await
    }

    /// Run the line through the platform shell with the caller's terminal
    /// attached. Nothing is captured and no timeout applies.
    pub async fn run_attached(&self) -> Result<ExitStatus, ExecError> {
        let mut cmd = shell_command(&self.line);
        cmd.stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        self.configure(&mut cmd)?;

        let mut child = cmd.spawn().map_err(|source| ExecError::Spawn {
            program: self.line.clone(),
            source,
        })?;
        debug!(pid = child.id().unwrap_or_default(), line = %self.line, "spawned attached");
        child.wait().await.map_err(ExecError::Wait)
    }

    fn configure(&self, cmd: &mut tokio::process::Command) -> Result<(), ExecError> {
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        if let Some(vars) = &self.environment {
            cmd.env_clear();
            cmd.envs(vars.iter().map(|(k, v)| (k.as_os_str(), v.as_os_str())));
        }
        if let Some(user) = &self.user {
            let creds = credentials::lookup(user)?;
            debug!(user = %user, uid = creds.uid, gid = creds.gid, "dropping privileges");
            #[cfg(unix)]
            {
                cmd.uid(creds.uid).gid(creds.gid);
            }
        }
        Ok(())
    }
}

#[cfg(unix)]
fn shell_command(line: &str) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new("sh");
    cmd.arg("-c").arg(line);
    cmd
}

#[cfg(windows)]
fn shell_command(line: &str) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new("cmd");
    cmd.arg("/C").arg(line);
    cmd
}

async fn drain<R: AsyncRead + Unpin>(mut reader: R) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).await?;
    Ok(buf)
}

/// Join a drain task. With `grace`, give up after that long and keep
/// nothing; a surviving process may still hold the pipe open.
async fn collect(
    handle: Option<JoinHandle<io::Result<Vec<u8>>>>,
    grace: Option<Duration>,
) -> Result<Vec<u8>, ExecError> {
    let Some(mut h) = handle else {
        return Ok(Vec::new());
    };
    let joined = match grace {
        Some(limit) => match tokio::time::timeout(limit, &mut h).await {
            Ok(joined) => joined,
            Err(_) => {
                debug!("output still open after kill, dropping it");
                h.abort();
                return Ok(Vec::new());
            }
        },
        None => h.await,
    };
    joined
        .map_err(|e| ExecError::Capture(io::Error::other(e)))?
        .map_err(ExecError::Capture)
}

/// Kill the child and, when it leads its own group, everything in it.
fn kill_tree(child: &mut Child, pid: u32) {
    #[cfg(unix)]
    if pid != 0 {
        let rc = unsafe { libc::killpg(pid as libc::pid_t, libc::SIGKILL) };
        if rc == 0 {
            return;
        }
        debug!(pid, error = %io::Error::last_os_error(), "killpg failed, killing child only");
    }
    // The child may have exited on its own in the meantime.
    if let Err(e) = child.start_kill() {
        debug!(pid, error = %e, "kill skipped");
    }
}

/// A running child started by `Command::start`.
#[derive(Debug)]
pub struct Execution {
    child: Child,
    pid: u32,
    started: Instant,
    usage_before: ResourceUsage,
    stdout: Option<JoinHandle<io::Result<Vec<u8>>>>,
    stderr: Option<JoinHandle<io::Result<Vec<u8>>>>,
    timeout: Option<Duration>,
    user: Option<String>,
}

impl Execution {
    /// Wait for the child to terminate and assemble its result.
    ///
    /// With a timeout, the wait races a timer; if the timer wins the child is
    /// killed and the result is marked failed with exit code -1.
    pub async fn wait(mut self) -> Result<ExecutionResult, ExecError> {
        let mut timed_out = false;
        let status = match self.timeout {
            Some(limit) => {
                tokio::select! {
                    status = self.child.wait() => status,
                    _ = tokio::time::sleep(limit) => {
                        timed_out = true;
                        warn!(pid = self.pid, ?limit, "timed out, killing child");
                        kill_tree(&mut self.child, self.pid);
                        self.child.wait().await
                    }
                }
            }
            None => self.child.wait().await,
        }
        .map_err(ExecError::Wait)?;

        let real_time = self.started.elapsed();
        let usage = ResourceUsage::children().since(&self.usage_before);
        let grace = timed_out.then_some(DRAIN_GRACE);
        let stdout = collect(self.stdout.take(), grace).await?;
        let stderr = collect(self.stderr.take(), grace).await?;

        let (code, signal) = exit_details(&status);
        let exit_code = if timed_out { -1 } else { code };
        let failed = timed_out || !status.success();
        debug!(pid = self.pid, exit_code, failed, ?real_time, "child finished");

        Ok(ExecutionResult {
            real_time,
            user_time: usage.user_time,
            sys_time: usage.sys_time,
            usage,
            stdout,
            stderr,
            pid: self.pid,
            exit_code,
            signal,
            timed_out,
            failed,
            user: self.user,
        })
    }
}

#[cfg(unix)]
fn exit_details(status: &ExitStatus) -> (i32, Option<i32>) {
    use std::os::unix::process::ExitStatusExt;
    (status.code().unwrap_or(-1), status.signal())
}

#[cfg(not(unix))]
fn exit_details(status: &ExitStatus) -> (i32, Option<i32>) {
    (status.code().unwrap_or(-1), None)
}

/// Outcome of a buffered run, built once after the child terminated.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub real_time: Duration,
    pub user_time: Duration,
    pub sys_time: Duration,
    pub usage: ResourceUsage,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub pid: u32,
    /// Exit code, or -1 when killed (by signal or on timeout).
    pub exit_code: i32,
    /// Terminating signal, when the child did not exit on its own.
    pub signal: Option<i32>,
    pub timed_out: bool,
    pub failed: bool,
    pub user: Option<String>,
}

impl ExecutionResult {
    /// Captured stdout without its trailing newline.
    pub fn stdout_string(&self) -> String {
        trim_newline(&self.stdout)
    }

    /// Captured stderr without its trailing newline.
    pub fn stderr_string(&self) -> String {
        trim_newline(&self.stderr)
    }
}

fn trim_newline(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    text.strip_suffix('\n').unwrap_or(&text).to_string()
}

/* ---- Tests ---- */
