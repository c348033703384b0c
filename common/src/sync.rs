use crate::copy;
use crate::fileops::FileOps;
use crate::outcome::OutcomeLog;
use crate::strategy::SyncStrategy;

/// Entry point for synchronizing directory pairs.
///
/// The strategy is chosen once at construction, the same instance may then be used for any
/// number of source/destination pairs.
#[derive(Debug, Clone)]
pub struct DirSync {
    strategy: SyncStrategy,
}

impl DirSync {
    #[must_use]
    pub fn new(
        delete_missing: bool,
        fileops: std::sync::Arc<dyn FileOps>,
        settings: &copy::Settings,
        log: OutcomeLog,
    ) -> Self {
        let strategy = if delete_missing {
            SyncStrategy::copy_and_delete(fileops, settings, log)
        } else {
            SyncStrategy::copy_only(fileops, settings, log)
        };
        Self { strategy }
    }

    #[must_use]
    pub fn strategy(&self) -> &SyncStrategy {
        &self.strategy
    }

    /// Makes `dst` mirror `src`. Per-entry failures are reported through the outcome log and
    /// never abort the run.
    pub async fn sync(&self, src: &std::path::Path, dst: &std::path::Path) {
        tracing::info!("synchronizing {:?} -> {:?}", src, dst);
        self.strategy.sync_directories(src, dst).await;
    }
}
