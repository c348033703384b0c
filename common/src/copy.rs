use anyhow::Result;
use async_recursion::async_recursion;
use tracing::instrument;

use crate::fileops::FileOps;
use crate::outcome::{Outcome, OutcomeLog};

pub const DEFAULT_MAX_CONCURRENT_FILES: usize = 5;

#[derive(Debug, Copy, Clone)]
pub struct Settings {
    /// Maximum number of file copies in flight, 0 means no limit
    pub max_concurrent_files: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_concurrent_files: DEFAULT_MAX_CONCURRENT_FILES,
        }
    }
}

/// Mirrors a source tree into a destination tree.
///
/// Directories are walked depth-first by the calling task. Every file found is handed off to
/// its own task, at most `max_concurrent_files` of those run at once. Errors never escape the
/// engine: each one is reported as a skipped entry and the walk carries on with the siblings.
#[derive(Clone)]
pub struct CopyEngine {
    fileops: std::sync::Arc<dyn FileOps>,
    slots: throttle::SlotPool,
    log: OutcomeLog,
}

impl std::fmt::Debug for CopyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CopyEngine")
            .field("slots", &self.slots)
            .field("log", &self.log)
            .finish()
    }
}

impl CopyEngine {
    #[must_use]
    pub fn new(
        fileops: std::sync::Arc<dyn FileOps>,
        settings: &Settings,
        log: OutcomeLog,
    ) -> Self {
        Self {
            fileops,
            slots: throttle::SlotPool::new(settings.max_concurrent_files),
            log,
        }
    }

    /// Copies everything missing or changed from `src` into `dst`.
    ///
    /// Returns once the whole tree was walked and every file copy it started has finished.
    #[instrument(skip(self))]
    pub async fn sync_directories(&self, src: &std::path::Path, dst: &std::path::Path) {
        let mut join_set = tokio::task::JoinSet::new();
        self.sync_over_directory(&mut join_set, src, dst).await;
        while let Some(res) = join_set.join_next().await {
            log_join_error(res);
        }
    }

    #[async_recursion]
    async fn sync_over_directory(
        &self,
        join_set: &mut tokio::task::JoinSet<()>,
        src: &std::path::Path,
        dst: &std::path::Path,
    ) {
        tracing::debug!("process contents of {:?}", src);
        let entries = match self.fileops.read_directory(src).await {
            Ok(entries) => entries,
            Err(error) => {
                self.log.report(Outcome::skipped(src, &error)).await;
                return;
            }
        };
        for entry in entries {
            throttle::get_ops_token().await;
            let src_path = src.join(&entry.name);
            let dst_path = dst.join(&entry.name);
            if entry.is_dir {
                self.sync_directory(join_set, &src_path, &dst_path).await;
                continue;
            }
            // waiting for a slot here keeps the walk from racing ahead of the copies
            let slot = self.slots.acquire().await;
            let engine = self.clone();
            join_set.spawn(async move {
                let _slot = slot;
                engine.sync_file(&src_path, &dst_path).await;
            });
            while let Some(res) = join_set.try_join_next() {
                log_join_error(res);
            }
        }
    }

    async fn sync_directory(
        &self,
        join_set: &mut tokio::task::JoinSet<()>,
        src: &std::path::Path,
        dst: &std::path::Path,
    ) {
        match self.fileops.exists(dst).await {
            Ok(true) => {}
            Ok(false) => {
                if let Err(error) = self.fileops.recreate_directory(src, dst).await {
                    self.log.report(Outcome::skipped(src, &error)).await;
                    return;
                }
                self.log.report(Outcome::Created(src.to_owned())).await;
            }
            Err(error) => {
                self.log.report(Outcome::skipped(src, &error)).await;
                return;
            }
        }
        self.sync_over_directory(join_set, src, dst).await;
    }

    #[instrument(skip(self))]
    async fn sync_file(&self, src: &std::path::Path, dst: &std::path::Path) {
        let outcome = match self.copy_if_changed(src, dst).await {
            Ok(outcome) => outcome,
            Err(error) => Outcome::skipped(src, &error),
        };
        self.log.report(outcome).await;
    }

    async fn copy_if_changed(
        &self,
        src: &std::path::Path,
        dst: &std::path::Path,
    ) -> Result<Outcome> {
        if self.fileops.exists(dst).await? && self.fileops.is_the_same(src, dst).await? {
            tracing::debug!("file is identical, skipping");
            return Ok(Outcome::Unchanged(src.to_owned()));
        }
        self.fileops.copy_file(src, dst).await?;
        Ok(Outcome::Copied(src.to_owned()))
    }
}

fn log_join_error(res: Result<(), tokio::task::JoinError>) {
    if let Err(error) = res {
        tracing::error!("file copy task failed: {}", &error);
    }
}
