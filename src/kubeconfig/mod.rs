//! Kubeconfig access and the confirmation gate.
//!
//! locate  -> path of the active kubeconfig (`--kube-config` / KUBECONFIG / ~/.kube/config)
//! current_context -> the `current-context` entry of that file
//! Confirm / PromptConfirm -> "press Return" gate shown before mutating subcommands
//!
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum KubeconfigError {
    #[error("cannot determine home directory for the default kubeconfig")]
    NoHome,

    #[error("failed to read kubeconfig {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse kubeconfig {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// The only part of a kubeconfig this crate reads.
#[derive(Debug, Default, Deserialize)]
struct Kubeconfig {
    #[serde(rename = "current-context", default)]
    current_context: Option<String>,
}

/// Pick the kubeconfig path: an explicit value wins, otherwise `~/.kube/config`.
///
/// `explicit` follows KUBECONFIG list syntax; the first non-empty entry is used.
pub fn locate(explicit: Option<&str>) -> Result<PathBuf, KubeconfigError> {
    if let Some(list) = explicit
        && let Some(first) = std::env::split_paths(list).find(|p| !p.as_os_str().is_empty())
    {
        return Ok(first);
    }
    let home = dirs::home_dir().ok_or(KubeconfigError::NoHome)?;
    Ok(home.join(".kube").join("config"))
}

/// Read the `current-context` of the kubeconfig at `path` (empty if unset).
pub fn current_context(path: &Path) -> Result<String, KubeconfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| KubeconfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let cfg: Kubeconfig = if raw.trim().is_empty() {
        Kubeconfig::default()
    } else {
        serde_yaml::from_str(&raw).map_err(|source| KubeconfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?
    };
    debug!(path = %path.display(), context = ?cfg.current_context, "read kubeconfig");
    Ok(cfg.current_context.unwrap_or_default())
}

/// Gate run between resolution and execution of mutating subcommands.
pub trait Confirm {
    fn confirm(&mut self) -> anyhow::Result<()>;
}

/// Shows the current context and blocks until a line is read.
///
/// The kubeconfig is located lazily so commands that never prompt do not
/// depend on it.
pub struct PromptConfirm<R, W> {
    kubeconfig: Option<String>,
    input: R,
    output: W,
}

impl PromptConfirm<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio(kubeconfig: Option<String>) -> Self {
        Self::new(kubeconfig, io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> PromptConfirm<R, W> {
    pub fn new(kubeconfig: Option<String>, input: R, output: W) -> Self {
        Self {
            kubeconfig,
            input,
            output,
        }
    }
}

impl<R: BufRead, W: Write> Confirm for PromptConfirm<R, W> {
    fn confirm(&mut self) -> anyhow::Result<()> {
        let path = locate(self.kubeconfig.as_deref())?;
        let context = current_context(&path)?;
        write!(
            self.output,
            "Press Return key to continue\n-> current context {context:?}"
        )?;
        self.output.flush()?;
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(())
    }
}

/// Confirmation disabled (`--kube-yes`).
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}
