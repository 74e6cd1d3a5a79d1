use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;

mod cmd;
mod exec;
mod kubeconfig;
mod utils;

use cmd::format::StyleOptions;
use cmd::{Io, Resolver, RunOptions};
use kubeconfig::{AssumeYes, Confirm, PromptConfirm};

/// kube - kubectl front-end with typo correction and plugin dispatch
///
/// Usage:
///   kube [--kube-* options] <token> [args...]
///
/// Everything from the first positional argument on is forwarded untouched,
/// including flags such as --help or -n. Wrapper options must come first.
///
/// Resolution:
///   kube kubectl ARGS     -> kubectl ARGS
///   kube get pods         -> kubectl get pods
///   kube get pdos         -> kubectl get pods (resource typo corrected)
///   kube dscribe pods     -> kubectl describe pods (command typo corrected)
///   kube foo ARGS         -> kubefoo / kube-foo / kubectl-foo ARGS (plugin, terminal attached)
///
/// `apply` and `delete` show the current kubeconfig context and wait for
/// Return before running (skip with --kube-yes).
///
/// Environment:
///   KUBE_TOOL, KUBE_TIMEOUT, KUBE_USER, KUBE_DIR, KUBE_PLUGIN_PATH,
///   KUBE_ASSUME_YES (1/0, yes/no, true/false), KUBECONFIG
///   KUBE_LOG   tracing filter (overrides --kube-verbose / --kube-quiet)
#[derive(Parser, Debug)]
#[command(
    name = "kube",
    version,
    about = "kubectl front-end with typo correction and plugin dispatch",
    disable_help_flag = true,
    disable_version_flag = true,
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Real tool to forward to
    #[arg(long = "kube-tool", env = "KUBE_TOOL", default_value = "kubectl", value_name = "NAME")]
    tool: String,

    /// Kill the real tool after this long (500ms, 30s, 2m; 0 disables)
    #[arg(
        long = "kube-timeout",
        env = "KUBE_TIMEOUT",
        value_name = "DURATION",
        value_parser = utils::parse_duration
    )]
    timeout: Option<Duration>,

    /// Run children as this user
    #[arg(long = "kube-user", env = "KUBE_USER", value_name = "USER")]
    user: Option<String>,

    /// Working directory for children
    #[arg(long = "kube-dir", env = "KUBE_DIR", value_name = "PATH")]
    dir: Option<PathBuf>,

    /// Set a variable for children (KEY=VALUE, repeatable)
    #[arg(long = "kube-env", value_name = "KEY=VALUE", value_parser = utils::parse_env_pair)]
    env: Vec<(String, String)>,

    /// Where to look for plugins instead of PATH (PATH syntax)
    #[arg(long = "kube-plugin-path", env = "KUBE_PLUGIN_PATH", value_name = "DIRS")]
    plugin_path: Option<OsString>,

    /// Do not ask before apply / delete
    #[arg(
        long = "kube-yes",
        env = "KUBE_ASSUME_YES",
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    assume_yes: bool,

    /// Kubeconfig used for the confirmation prompt
    #[arg(long = "kube-config", env = "KUBECONFIG", value_name = "PATH")]
    kubeconfig: Option<String>,

    /// Increase log verbosity (repeatable)
    #[arg(long = "kube-verbose", action = clap::ArgAction::Count)]
    verbose: u8,

    /// Errors only
    #[arg(long = "kube-quiet")]
    quiet: bool,

    /// Token and arguments forwarded to the resolver
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
    args: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = utils::derive_level(cli.verbose, cli.quiet);
    utils::init_logging(level);
    debug!(?cli, "starting");

    let code = run(cli)?;
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<i32> {
    let mut resolver = Resolver::new(cli.tool);
    if let Some(search) = cli.plugin_path {
        resolver = resolver.with_search_path(search);
    }
    let opts = RunOptions {
        timeout: cli.timeout.filter(|t| !t.is_zero()),
        user: cli.user,
        working_dir: cli.dir,
        environment: (!cli.env.is_empty())
            .then(|| utils::overlay_environment(std::env::vars_os(), &cli.env)),
    };
    let mut confirm: Box<dyn Confirm> = if cli.assume_yes {
        Box::new(AssumeYes)
    } else {
        Box::new(PromptConfirm::stdio(cli.kubeconfig))
    };

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create Tokio runtime")?;

    let stdout = std::io::stdout();
    let stderr = std::io::stderr();
    let mut out = stdout.lock();
    let mut err = stderr.lock();
    let mut io = Io {
        out_style: StyleOptions::detect(&stdout),
        err_style: StyleOptions::detect(&stderr),
        out: &mut out,
        err: &mut err,
    };

    rt.block_on(cmd::dispatch(
        &resolver,
        &cli.args,
        &opts,
        confirm.as_mut(),
        &mut io,
    ))
}
