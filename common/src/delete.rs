use async_recursion::async_recursion;
use tracing::instrument;

use crate::fileops::FileOps;
use crate::outcome::{Outcome, OutcomeLog};

/// Removes destination entries that have no counterpart in the source.
///
/// An entry missing from the source is removed with everything beneath it in one call. A
/// directory present on both sides is descended into and never removed itself.
#[derive(Clone)]
pub struct DeleteEngine {
    fileops: std::sync::Arc<dyn FileOps>,
    log: OutcomeLog,
}

impl std::fmt::Debug for DeleteEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeleteEngine")
            .field("log", &self.log)
            .finish()
    }
}

impl DeleteEngine {
    #[must_use]
    pub fn new(fileops: std::sync::Arc<dyn FileOps>, log: OutcomeLog) -> Self {
        Self { fileops, log }
    }

    #[instrument(skip(self))]
    #[async_recursion]
    pub async fn delete_not_in_source(&self, src: &std::path::Path, dst: &std::path::Path) {
        let entries = match self.fileops.read_directory(dst).await {
            Ok(entries) => entries,
            Err(error) => {
                self.log
                    .report(Outcome::delete_skipped(dst, &error))
                    .await;
                return;
            }
        };
        for entry in entries {
            throttle::get_ops_token().await;
            let src_path = src.join(&entry.name);
            let dst_path = dst.join(&entry.name);
            match self.fileops.exists(&src_path).await {
                Ok(true) if entry.is_dir => {
                    self.delete_not_in_source(&src_path, &dst_path).await;
                }
                Ok(true) => {}
                Ok(false) => {
                    let outcome = match self.fileops.delete_all(&dst_path).await {
                        Ok(()) => Outcome::Deleted(dst_path),
                        Err(error) => Outcome::delete_skipped(&dst_path, &error),
                    };
                    self.log.report(outcome).await;
                }
                Err(error) => {
                    // never delete what could not be confirmed missing
                    self.log
                        .report(Outcome::delete_skipped(&src_path, &error))
                        .await;
                }
            }
        }
    }
}
