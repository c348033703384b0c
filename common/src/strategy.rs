use tracing::instrument;

use crate::copy::{self, CopyEngine};
use crate::delete::DeleteEngine;
use crate::fileops::FileOps;
use crate::outcome::OutcomeLog;

#[derive(Debug, Clone)]
pub enum SyncStrategy {
    /// Copy new and changed entries, leave everything else in the destination alone
    CopyOnly(CopyEngine),
    /// Also remove destination entries missing from the source. Both passes run concurrently.
    CopyAndDelete {
        copy: CopyEngine,
        delete: DeleteEngine,
    },
}

impl SyncStrategy {
    #[must_use]
    pub fn copy_only(
        fileops: std::sync::Arc<dyn FileOps>,
        settings: &copy::Settings,
        log: OutcomeLog,
    ) -> Self {
        Self::CopyOnly(CopyEngine::new(fileops, settings, log))
    }

    #[must_use]
    pub fn copy_and_delete(
        fileops: std::sync::Arc<dyn FileOps>,
        settings: &copy::Settings,
        log: OutcomeLog,
    ) -> Self {
        Self::CopyAndDelete {
            copy: CopyEngine::new(fileops.clone(), settings, log.clone()),
            delete: DeleteEngine::new(fileops, log),
        }
    }

    /// Returns when every pass of the strategy has finished.
    #[instrument(skip(self))]
    pub async fn sync_directories(&self, src: &std::path::Path, dst: &std::path::Path) {
        match self {
            Self::CopyOnly(copy) => copy.sync_directories(src, dst).await,
            Self::CopyAndDelete { copy, delete } => {
                let mut join_set = tokio::task::JoinSet::new();
                {
                    let copy = copy.clone();
                    let src = src.to_owned();
                    let dst = dst.to_owned();
                    join_set.spawn(async move { copy.sync_directories(&src, &dst).await });
                }
                {
                    let delete = delete.clone();
                    let src = src.to_owned();
                    let dst = dst.to_owned();
                    join_set.spawn(async move { delete.delete_not_in_source(&src, &dst).await });
                }
                while let Some(res) = join_set.join_next().await {
                    if let Err(error) = res {
                        tracing::error!("sync pass failed: {}", &error);
                    }
                }
            }
        }
    }
}
