/*!
resolve.rs - decide what an argument vector should run.

Resolution order:
  1. empty input            -> `<tool> help`
  2. argv[1] resource typo  -> corrected in place (or ambiguous)
  3. argv[0] == tool name   -> pass through the remaining args
  4. argv[0] is a subcommand -> pass through
  5. plugin on the search path (`kube<x>`, `kube-<x>`, `kubectl-<x>`)
  6. argv[0] subcommand typo -> corrected pass-through (or ambiguous)

Nothing here spawns a process; plugin probing only stats the search path.
*/

use std::ffi::OsString;
use std::path::PathBuf;

use tracing::{debug, trace};

use crate::cmd::names::{self, RESOURCES, SUBCOMMANDS};
use crate::cmd::similar::best_matches;

/// Name prefixes probed, in order, when looking for an external plugin.
pub const PLUGIN_PREFIXES: &[&str] = &["kube", "kube-", "kubectl-"];

/// Which table a correction came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Command,
    Resource,
}

/// A single-token substitution applied during resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correction {
    pub kind: TokenKind,
    pub from: String,
    pub to: String,
}

/// Outcome of resolving an argument vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedAction {
    /// Run the real tool with these arguments, untouched.
    PassThrough(Vec<String>),
    /// Run the real tool with these arguments after a typo was fixed.
    CorrectedPassThrough(Vec<String>),
    /// Run an external plugin attached to the terminal.
    PluginDispatch { path: PathBuf, args: Vec<String> },
    AmbiguousResource { token: String, candidates: Vec<String> },
    AmbiguousCommand { token: String, candidates: Vec<String> },
    /// More than one plugin executable matched the token.
    AmbiguousPlugin { token: String, candidates: Vec<PathBuf> },
    Unresolvable(String),
}

/// The chosen action plus every correction applied on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub action: ResolvedAction,
    pub corrections: Vec<Correction>,
}

/// Classifies argument vectors against the known tables and the search path.
#[derive(Debug, Clone)]
pub struct Resolver {
    tool: String,
    search_path: Option<OsString>,
    cwd: PathBuf,
}

impl Resolver {
    /// Resolver for `tool`, probing the process `PATH`.
    pub fn new(tool: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            search_path: std::env::var_os("PATH"),
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Probe `path` (a `PATH`-style list) instead of the process `PATH`.
    pub fn with_search_path(mut self, path: impl Into<OsString>) -> Self {
        self.search_path = Some(path.into());
        self
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    pub fn resolve(&self, args: &[String]) -> Resolution {
        let mut args = args.to_vec();
        let mut corrections = Vec::new();

        if args.is_empty() {
            return Resolution {
                action: ResolvedAction::PassThrough(vec!["help".to_string()]),
                corrections,
            };
        }

        if args.len() > 1 && !names::is_resource(&args[1]) {
            let matches = best_matches(&args[1], RESOURCES);
            trace!(token = %args[1], candidates = matches.len(), "resource matches");
            if let Some(name) = matches.unique() {
                corrections.push(Correction {
                    kind: TokenKind::Resource,
                    from: std::mem::replace(&mut args[1], name.to_string()),
                    to: name.to_string(),
                });
            } else if !matches.is_empty() {
                return Resolution {
                    action: ResolvedAction::AmbiguousResource {
                        token: args[1].clone(),
                        candidates: matches.names(),
                    },
                    corrections,
                };
            }
        }

        if let Some(action) = self.classify_known(&args, !corrections.is_empty()) {
            return Resolution {
                action,
                corrections,
            };
        }

        let mut plugins = self.find_plugins(&args[0]);
        match plugins.len() {
            0 => {}
            1 => {
                let path = plugins.remove(0);
                debug!(plugin = %path.display(), "dispatching to plugin");
                return Resolution {
                    action: ResolvedAction::PluginDispatch {
                        path,
                        args: args[1..].to_vec(),
                    },
                    corrections,
                };
            }
            _ => {
                return Resolution {
                    action: ResolvedAction::AmbiguousPlugin {
                        token: args[0].clone(),
                        candidates: plugins,
                    },
                    corrections,
                };
            }
        }

        let matches = best_matches(&args[0], SUBCOMMANDS);
        trace!(token = %args[0], candidates = matches.len(), "command matches");
        let action = if let Some(name) = matches.unique() {
            corrections.push(Correction {
                kind: TokenKind::Command,
                from: std::mem::replace(&mut args[0], name.to_string()),
                to: name.to_string(),
            });
            self.classify_known(&args, true)
                .unwrap_or_else(|| ResolvedAction::CorrectedPassThrough(args.clone()))
        } else if matches.is_empty() {
            ResolvedAction::Unresolvable(args[0].clone())
        } else {
            ResolvedAction::AmbiguousCommand {
                token: args[0].clone(),
                candidates: matches.names(),
            }
        };

        Resolution {
            action,
            corrections,
        }
    }

    /// Steps that need nothing but exact comparisons: the tool itself and
    /// known subcommands.
    fn classify_known(&self, args: &[String], corrected: bool) -> Option<ResolvedAction> {
        let wrap = |v: Vec<String>| {
            if corrected {
                ResolvedAction::CorrectedPassThrough(v)
            } else {
                ResolvedAction::PassThrough(v)
            }
        };
        if args[0] == self.tool {
            return Some(wrap(args[1..].to_vec()));
        }
        if names::is_subcommand(&args[0]) {
            return Some(wrap(args.to_vec()));
        }
        None
    }

    /// Every `<prefix><token>` executable found on the search path.
    pub fn find_plugins(&self, token: &str) -> Vec<PathBuf> {
        // Path-like tokens would escape the search path.
        if token.is_empty() || token.contains(std::path::is_separator) {
            return Vec::new();
        }
        PLUGIN_PREFIXES
            .iter()
            .filter_map(|prefix| {
                let name = format!("{prefix}{token}");
                match which::which_in(&name, self.search_path.as_ref(), &self.cwd) {
                    Ok(path) => Some(path),
                    Err(e) => {
                        trace!(%name, error = %e, "plugin not found");
                        None
                    }
                }
            })
            .collect()
    }
}

/* ---- Tests ---- */
