//! Directory synchronization library behind the `dirsync` tool
//!
//! Makes a destination directory tree mirror a source tree: missing directories are created,
//! new or changed files are copied and, optionally, destination entries absent from the source
//! are removed. Per-entry failures never stop a run, every processed entry produces one
//! [`Outcome`] line instead.
//!
//! # Layout
//!
//! - [`fileops`] - the [`FileOps`] seam, every filesystem access of the engines goes through it
//! - [`copy`] - the copy engine, walks the source and copies files with bounded concurrency
//! - [`delete`] - the delete engine, prunes destination entries missing from the source
//! - [`strategy`] - copy-only or copy-and-delete, the latter runs both engines concurrently
//! - [`sync`] - [`DirSync`], the entry point used by the binary
//!
//! # Change detection
//!
//! Files are compared using metadata only: by default a destination file is up to date when it
//! has the same size and the same modification time (down to the nanosecond) as its source.
//! Copied files get the source's access and modification times so that a second run finds
//! nothing to do.

pub mod config;
pub mod copy;
pub mod delete;
pub mod filecmp;
pub mod fileops;
pub mod outcome;
pub mod path;
pub mod rm;
pub mod strategy;
pub mod sync;

#[cfg(test)]
mod testutils;

pub use config::{OutputConfig, RuntimeConfig, ThrottleConfig};
pub use fileops::{DirEntry, FileOps, LocalFileOps};
pub use outcome::{Outcome, OutcomeLog};
pub use sync::DirSync;

fn init_tracing(output: &OutputConfig) {
    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(output.level().into())
        .from_env_lossy();
    if let Err(error) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
    {
        eprintln!("Failed to initialize logging: {error}");
    }
}

/// Sets up logging, the tokio runtime and throttling, then runs `func` to completion.
///
/// Returns `None` if the runtime could not be created or `func` failed, the error is logged.
pub fn run<Fut, T>(
    output: OutputConfig,
    runtime: RuntimeConfig,
    throttle: ThrottleConfig,
    func: impl FnOnce() -> Fut,
) -> Option<T>
where
    Fut: std::future::Future<Output = anyhow::Result<T>>,
{
    init_tracing(&output);
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if runtime.max_workers > 0 {
        builder.worker_threads(runtime.max_workers);
    }
    if runtime.max_blocking_threads > 0 {
        builder.max_blocking_threads(runtime.max_blocking_threads);
    }
    let tokio_runtime = match builder.build() {
        Ok(tokio_runtime) => tokio_runtime,
        Err(error) => {
            tracing::error!("Failed to create tokio runtime: {:#}", &error);
            return None;
        }
    };
    let res = tokio_runtime.block_on(async move {
        if throttle.ops_throttle > 0 {
            let (replenish, interval) = throttle.replenish_schedule();
            throttle::init_ops_tokens(replenish);
            tokio::spawn(throttle::run_ops_replenish_thread(replenish, interval));
        }
        func().await
    });
    match res {
        Ok(value) => Some(value),
        Err(error) => {
            tracing::error!("{:#}", &error);
            None
        }
    }
}
