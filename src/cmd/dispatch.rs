/*!
dispatch.rs - turn a resolution into output and an exit code.

  PassThrough / CorrectedPassThrough -> confirmation gate (apply, delete),
                                        buffered run of the real tool
  PluginDispatch                     -> terminal-attached run of the plugin
  Ambiguous* / Unresolvable          -> diagnostic on stderr, exit 1

Messages go to the supplied writers so the whole flow is testable without a
terminal. Spawn failures propagate as errors; they are not user mistakes.
*/

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::cmd::format::{Role, StyleOptions, color};
use crate::cmd::names;
use crate::cmd::resolve::{Correction, ResolvedAction, Resolver, TokenKind};
use crate::exec::Command;
use crate::kubeconfig::Confirm;

/// Execution options shared by every child this run may start.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub timeout: Option<Duration>,
    pub user: Option<String>,
    pub working_dir: Option<PathBuf>,
    /// Full child environment; `None` inherits ours.
    pub environment: Option<Vec<(OsString, OsString)>>,
}

impl RunOptions {
    fn command(&self, program: &str, args: &[String]) -> Command {
        let mut cmd = Command::from_args(program, args);
        if let Some(t) = self.timeout {
            cmd.timeout(t);
        }
        if let Some(user) = &self.user {
            cmd.user(user.clone());
        }
        if let Some(dir) = &self.working_dir {
            cmd.working_dir(dir.clone());
        }
        if let Some(vars) = &self.environment {
            cmd.environment(vars.iter().cloned());
        }
        cmd
    }
}

/// Output streams and their styles.
pub struct Io<'a> {
    pub out: &'a mut dyn Write,
    pub err: &'a mut dyn Write,
    pub out_style: StyleOptions,
    pub err_style: StyleOptions,
}

/// Resolve `args`, run whatever they resolve to, and return the exit code.
pub async fn dispatch(
    resolver: &Resolver,
    args: &[String],
    opts: &RunOptions,
    confirm: &mut dyn Confirm,
    io: &mut Io<'_>,
) -> Result<i32> {
    let resolution = resolver.resolve(args);
    debug!(action = ?resolution.action, "resolved");

    for correction in &resolution.corrections {
        let notice = correction_notice(resolver.tool(), correction);
        writeln!(io.out, "{}", color(Role::Warning, notice, &io.out_style))?;
    }

    match resolution.action {
        ResolvedAction::PassThrough(args) | ResolvedAction::CorrectedPassThrough(args) => {
            run_tool(resolver.tool(), &args, opts, confirm, io).await
        }
        ResolvedAction::PluginDispatch { path, args } => run_plugin(&path, &args, opts, io).await,
        ResolvedAction::AmbiguousResource { token, candidates } => {
            report(
                io,
                format!("{token}: no such resource"),
                format!("The most similar resources are {candidates:?}"),
            )
        }
        ResolvedAction::AmbiguousCommand { token, candidates } => report(
            io,
            format!("{token}: no such command"),
            format!("The most similar commands are {candidates:?}"),
        ),
        ResolvedAction::AmbiguousPlugin { token, candidates } => {
            debug!(%token, count = candidates.len(), "several plugins match");
            let headline = format!("Some commands are found: {candidates:?}");
            writeln!(io.err, "{}", color(Role::Error, headline, &io.err_style))?;
            Ok(1)
        }
        ResolvedAction::Unresolvable(token) => {
            let headline = format!("{token}: no such command in {}", resolver.tool());
            writeln!(io.err, "{}", color(Role::Error, headline, &io.err_style))?;
            Ok(1)
        }
    }
}

fn correction_notice(tool: &str, c: &Correction) -> String {
    let what = match c.kind {
        TokenKind::Command => format!("{tool} command"),
        TokenKind::Resource => "k8s resource".to_string(),
    };
    format!(
        "You called a {what} named '{}', which does not exist.\nContinuing under the assumption that you meant '{}'",
        c.from, c.to
    )
}

fn report(io: &mut Io<'_>, headline: String, detail: String) -> Result<i32> {
    writeln!(io.err, "{}", color(Role::Error, headline, &io.err_style))?;
    writeln!(io.err, "{detail}")?;
    Ok(1)
}

async fn run_tool(
    tool: &str,
    args: &[String],
    opts: &RunOptions,
    confirm: &mut dyn Confirm,
    io: &mut Io<'_>,
) -> Result<i32> {
    if names::requires_confirmation(args) {
        confirm.confirm().context("confirmation failed")?;
    }

    let cmd = opts.command(tool, args);
    info!(line = %cmd.line(), "running");
    let res = cmd
        .run()
        .await
        .with_context(|| format!("failed to run {tool}"))?;

    if res.failed {
        if res.timed_out {
            info!(pid = res.pid, "child killed after timeout");
        } else {
            debug!(pid = res.pid, code = res.exit_code, signal = ?res.signal, "child failed");
        }
        writeln!(
            io.err,
            "{} {}",
            color(Role::Error, "Error:", &io.err_style),
            res.stderr_string()
        )?;
        return Ok(res.exit_code);
    }

    let out = res.stdout_string();
    if !out.is_empty() {
        writeln!(io.out, "{out}")?;
    }
    debug!(
        real = ?res.real_time,
        user = ?res.user_time,
        sys = ?res.sys_time,
        max_rss_kb = res.usage.max_rss_kb,
        as_user = ?res.user,
        "finished"
    );
    Ok(res.exit_code)
}

async fn run_plugin(path: &Path, args: &[String], opts: &RunOptions, io: &mut Io<'_>) -> Result<i32> {
    let cmd = opts.command(&path.to_string_lossy(), args);
    info!(line = %cmd.line(), "running plugin");
    match cmd.run_attached().await {
        Ok(status) => Ok(status.code().unwrap_or(1)),
        Err(e) => {
            writeln!(
                io.err,
                "{} {e}",
                color(Role::Error, "Error:", &io.err_style)
            )?;
            Ok(1)
        }
    }
}

/* ---- Tests ---- */
