use anyhow::{Context, Result};
use tokio::io::AsyncWriteExt;

/// Result of processing a single entry, one line of user visible output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Directory was missing in the destination and got created
    Created(std::path::PathBuf),
    Copied(std::path::PathBuf),
    /// Destination file has the same size and mtime, nothing to do
    Unchanged(std::path::PathBuf),
    Skipped {
        path: std::path::PathBuf,
        error: String,
    },
    Deleted(std::path::PathBuf),
    DeleteSkipped {
        path: std::path::PathBuf,
        error: String,
    },
}

impl Outcome {
    #[must_use]
    pub fn skipped(path: &std::path::Path, error: &anyhow::Error) -> Self {
        Self::Skipped {
            path: path.to_owned(),
            error: format!("{error:#}"),
        }
    }

    #[must_use]
    pub fn delete_skipped(path: &std::path::Path, error: &anyhow::Error) -> Self {
        Self::DeleteSkipped {
            path: path.to_owned(),
            error: format!("{error:#}"),
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Outcome::Created(path) => write!(f, "[Created] {path:?}"),
            Outcome::Copied(path) => write!(f, "[Copied] {path:?}"),
            Outcome::Unchanged(path) => write!(f, "[Unchanged] {path:?}"),
            Outcome::Skipped { path, error } => write!(f, "[Skipped] {path:?}: {error}"),
            Outcome::Deleted(path) => write!(f, "[Deleted] {path:?}"),
            Outcome::DeleteSkipped { path, error } => {
                write!(f, "[DeleteSkipped] {path:?}: {error}")
            }
        }
    }
}

type Sink = tokio::io::BufWriter<Box<dyn tokio::io::AsyncWrite + Send + Unpin>>;

/// Cloneable writer shared by all tasks of a run.
///
/// Lines go either to a log file, to stdout, or nowhere.
#[derive(Clone)]
pub struct OutcomeLog {
    sink: Option<std::sync::Arc<tokio::sync::Mutex<Sink>>>,
    // stdout is flushed after every line so progress is visible as it happens
    line_flush: bool,
}

impl std::fmt::Debug for OutcomeLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutcomeLog")
            .field("enabled", &self.sink.is_some())
            .finish()
    }
}

impl OutcomeLog {
    pub async fn new(log_path: Option<&std::path::Path>, use_stdout: bool) -> Result<Self> {
        if let Some(log_path) = log_path {
            let log_file = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(log_path)
                .await
                .with_context(|| format!("Failed to open log file: {log_path:?}"))?;
            Ok(Self::from_writer(Box::new(log_file), false))
        } else if use_stdout {
            Ok(Self::from_writer(Box::new(tokio::io::stdout()), true))
        } else {
            Ok(Self::silent())
        }
    }

    #[must_use]
    pub fn silent() -> Self {
        Self {
            sink: None,
            line_flush: false,
        }
    }

    fn from_writer(writer: Box<dyn tokio::io::AsyncWrite + Send + Unpin>, line_flush: bool) -> Self {
        Self {
            sink: Some(std::sync::Arc::new(tokio::sync::Mutex::new(
                tokio::io::BufWriter::new(writer),
            ))),
            line_flush,
        }
    }

    /// Records an outcome. Failing to write is logged and otherwise ignored, the run goes on.
    pub async fn report(&self, outcome: Outcome) {
        tracing::debug!("{}", &outcome);
        if let Err(error) = self.write_line(&outcome.to_string()).await {
            tracing::error!("{:#}", &error);
        }
    }

    pub async fn write_line(&self, msg: &str) -> Result<()> {
        if let Some(sink) = &self.sink {
            let mut sink = sink.lock().await;
            sink.write_all(msg.as_bytes())
                .await
                .context("Failed to write outcome")?;
            sink.write_all(b"\n")
                .await
                .context("Failed to write outcome")?;
            if self.line_flush {
                sink.flush().await.context("Failed to flush outcome log")?;
            }
        }
        Ok(())
    }

    pub async fn flush(&self) -> Result<()> {
        if let Some(sink) = &self.sink {
            let mut sink = sink.lock().await;
            sink.flush().await.context("Failed to flush outcome log")?;
        }
        Ok(())
    }
}
