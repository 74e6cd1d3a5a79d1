/*!
Command resolution and dispatch.

Layout:
  src/cmd/
    mod.rs       (this file)
    names.rs     (fixed subcommand / resource tables)
    similar.rs   (edit-distance scoring + best-match selection)
    resolve.rs   (Resolver: argv -> ResolvedAction)
    dispatch.rs  (ResolvedAction -> child process, output, exit code)
    format.rs    (diagnostic styling)

Conventions:
  - Resolution is pure apart from read-only search-path probing.
  - Only `dispatch` writes to the user; it takes its writers as arguments.
  - Nothing in here exits the process; `main` owns the exit code.
*/

pub mod dispatch;
pub mod format;
pub mod names;
pub mod resolve;
pub mod similar;

pub use dispatch::{Io, RunOptions, dispatch};
pub use resolve::{ResolvedAction, Resolver};
