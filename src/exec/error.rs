use std::io;

use thiserror::Error;

/// Failures that prevent an `ExecutionResult` from being produced.
///
/// A child that runs and exits non-zero (or is killed on timeout) is not an
/// error; see `ExecutionResult::failed`.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("empty command line")]
    EmptyCommand,

    #[error("failed to parse command line '{line}': {source}")]
    InvalidCommandLine {
        line: String,
        #[source]
        source: shell_words::ParseError,
    },

    #[error("unknown user '{0}'")]
    UnknownUser(String),

    #[error("failed to look up user '{user}': {source}")]
    UserLookup {
        user: String,
        #[source]
        source: io::Error,
    },

    #[cfg(not(unix))]
    #[error("running as another user is not supported on this platform")]
    UserUnsupported,

    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to capture child output: {0}")]
    Capture(#[source] io::Error),

    #[error("failed to wait for child: {0}")]
    Wait(#[source] io::Error),
}
