use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::fileops::{DirEntry, FileOps};
use crate::outcome::OutcomeLog;

pub async fn create_temp_dir() -> anyhow::Result<PathBuf> {
    let mut idx = 0;
    loop {
        let tmp_dir = std::env::temp_dir().join(format!("dirsync_test{}", &idx));
        if let Err(error) = tokio::fs::create_dir(&tmp_dir).await {
            match error.kind() {
                std::io::ErrorKind::AlreadyExists => {
                    idx += 1;
                }
                _ => return Err(error.into()),
            }
        } else {
            return Ok(tmp_dir);
        }
    }
}

pub async fn setup_test_dir() -> anyhow::Result<PathBuf> {
    // create a temporary directory
    let tmp_dir = create_temp_dir().await?;
    // foo
    // |- 0.txt
    // |- bar
    //    |- 1.txt
    //    |- 2.txt
    //    |- 3.txt
    // |- baz
    //    |- 4.txt
    let foo_path = tmp_dir.join("foo");
    tokio::fs::create_dir(&foo_path).await?;
    tokio::fs::write(foo_path.join("0.txt"), "0").await?;
    let bar_path = foo_path.join("bar");
    tokio::fs::create_dir(&bar_path).await?;
    tokio::fs::write(bar_path.join("1.txt"), "1").await?;
    tokio::fs::write(bar_path.join("2.txt"), "2").await?;
    tokio::fs::write(bar_path.join("3.txt"), "3").await?;
    let baz_path = foo_path.join("baz");
    tokio::fs::create_dir(&baz_path).await?;
    tokio::fs::write(baz_path.join("4.txt"), "4").await?;
    Ok(tmp_dir)
}

pub fn running_as_root() -> bool {
    use std::os::unix::fs::MetadataExt;
    std::fs::metadata("/proc/self")
        .map(|md| md.uid() == 0)
        .unwrap_or(false)
}

/// All paths beneath `root`, relative to it.
pub fn list_tree(root: &Path) -> anyhow::Result<BTreeSet<PathBuf>> {
    fn walk(root: &Path, dir: &Path, out: &mut BTreeSet<PathBuf>) -> anyhow::Result<()> {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            out.insert(path.strip_prefix(root)?.to_owned());
            if entry.file_type()?.is_dir() {
                walk(root, &path, out)?;
            }
        }
        Ok(())
    }
    let mut out = BTreeSet::new();
    walk(root, root, &mut out)?;
    Ok(out)
}

pub fn path_set(items: &[&str]) -> BTreeSet<PathBuf> {
    items.iter().map(PathBuf::from).collect()
}

/// Creates a log file in `dir` to capture outcome lines.
pub async fn outcome_log(dir: &Path) -> anyhow::Result<(OutcomeLog, PathBuf)> {
    let path = dir.join("outcome.log");
    Ok((OutcomeLog::new(Some(&path), false).await?, path))
}

pub async fn read_outcomes(log: &OutcomeLog, path: &Path) -> anyhow::Result<Vec<String>> {
    log.flush().await?;
    Ok(tokio::fs::read_to_string(path)
        .await?
        .lines()
        .map(str::to_owned)
        .collect())
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Op {
    Exists,
    ReadDirectory,
    RecreateDirectory,
    IsTheSame,
    CopyFile,
    DeleteAll,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Dir,
    File { size: u64, mtime: u64 },
}

#[derive(Default)]
struct FakeState {
    nodes: BTreeMap<PathBuf, Node>,
    calls: Vec<(Op, PathBuf)>,
    failures: HashSet<(Op, PathBuf)>,
}

/// In-memory filesystem for exercising the engines without touching the disk.
///
/// Calls are recorded against, and failures injected for, the path an operation acts on:
/// the destination for `RecreateDirectory`, `IsTheSame` and `CopyFile`, the only path
/// for the rest.
#[derive(Default)]
pub struct FakeFs {
    state: std::sync::Mutex<FakeState>,
    copy_delay: std::time::Duration,
    copies_in_flight: AtomicUsize,
    max_copies_in_flight: AtomicUsize,
}

impl FakeFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_copy_delay(copy_delay: std::time::Duration) -> Self {
        Self {
            copy_delay,
            ..Default::default()
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        self.state().nodes.insert(path.as_ref().to_owned(), Node::Dir);
    }

    pub fn add_file(&self, path: impl AsRef<Path>, size: u64, mtime: u64) {
        self.state()
            .nodes
            .insert(path.as_ref().to_owned(), Node::File { size, mtime });
    }

    pub fn fail(&self, op: Op, path: impl AsRef<Path>) {
        self.state().failures.insert((op, path.as_ref().to_owned()));
    }

    pub fn node(&self, path: impl AsRef<Path>) -> Option<Node> {
        self.state().nodes.get(path.as_ref()).copied()
    }

    pub fn calls(&self, op: Op) -> Vec<PathBuf> {
        self.state()
            .calls
            .iter()
            .filter(|(call_op, _)| *call_op == op)
            .map(|(_, path)| path.clone())
            .collect()
    }

    pub fn max_copies_in_flight(&self) -> usize {
        self.max_copies_in_flight.load(Ordering::SeqCst)
    }

    /// All paths beneath `root`, relative to it.
    pub fn tree(&self, root: impl AsRef<Path>) -> BTreeSet<PathBuf> {
        let root = root.as_ref();
        self.state()
            .nodes
            .keys()
            .filter(|path| path.as_path() != root)
            .filter_map(|path| path.strip_prefix(root).ok())
            .map(Path::to_path_buf)
            .collect()
    }

    fn record(&self, op: Op, path: &Path) -> anyhow::Result<()> {
        let mut state = self.state();
        state.calls.push((op, path.to_owned()));
        if state.failures.contains(&(op, path.to_owned())) {
            return Err(anyhow::anyhow!("injected {:?} failure for {:?}", op, path));
        }
        Ok(())
    }

    fn is_dir(state: &FakeState, path: &Path) -> bool {
        matches!(state.nodes.get(path), Some(Node::Dir))
    }

    fn parent_is_dir(state: &FakeState, path: &Path) -> bool {
        path.parent()
            .is_some_and(|parent| Self::is_dir(state, parent))
    }
}

#[async_trait]
impl FileOps for FakeFs {
    async fn exists(&self, path: &Path) -> anyhow::Result<bool> {
        self.record(Op::Exists, path)?;
        Ok(self.state().nodes.contains_key(path))
    }

    async fn read_directory(&self, path: &Path) -> anyhow::Result<Vec<DirEntry>> {
        self.record(Op::ReadDirectory, path)?;
        let state = self.state();
        if !Self::is_dir(&state, path) {
            return Err(anyhow::anyhow!("{:?} is not a directory", path));
        }
        Ok(state
            .nodes
            .iter()
            .filter(|(child, _)| child.parent() == Some(path))
            .filter_map(|(child, node)| {
                child.file_name().map(|name| DirEntry {
                    name: name.to_owned(),
                    is_dir: *node == Node::Dir,
                })
            })
            .collect())
    }

    async fn recreate_directory(&self, src: &Path, dst: &Path) -> anyhow::Result<()> {
        self.record(Op::RecreateDirectory, dst)?;
        let mut state = self.state();
        if !Self::is_dir(&state, src) {
            return Err(anyhow::anyhow!("{:?} is not a directory", src));
        }
        if !Self::parent_is_dir(&state, dst) || state.nodes.contains_key(dst) {
            return Err(anyhow::anyhow!("cannot create directory {:?}", dst));
        }
        state.nodes.insert(dst.to_owned(), Node::Dir);
        Ok(())
    }

    async fn is_the_same(&self, src: &Path, dst: &Path) -> anyhow::Result<bool> {
        self.record(Op::IsTheSame, dst)?;
        let state = self.state();
        match (state.nodes.get(src), state.nodes.get(dst)) {
            (Some(src_node), Some(dst_node)) => Ok(src_node == dst_node),
            _ => Err(anyhow::anyhow!("failed reading metadata")),
        }
    }

    async fn copy_file(&self, src: &Path, dst: &Path) -> anyhow::Result<()> {
        self.record(Op::CopyFile, dst)?;
        let in_flight = self.copies_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_copies_in_flight
            .fetch_max(in_flight, Ordering::SeqCst);
        tokio::time::sleep(self.copy_delay).await;
        self.copies_in_flight.fetch_sub(1, Ordering::SeqCst);
        let mut state = self.state();
        let node = match state.nodes.get(src) {
            Some(node @ Node::File { .. }) => *node,
            _ => return Err(anyhow::anyhow!("cannot open {:?} for reading", src)),
        };
        if !Self::parent_is_dir(&state, dst) || Self::is_dir(&state, dst) {
            return Err(anyhow::anyhow!("cannot open {:?} for writing", dst));
        }
        state.nodes.insert(dst.to_owned(), node);
        Ok(())
    }

    async fn delete_all(&self, path: &Path) -> anyhow::Result<()> {
        self.record(Op::DeleteAll, path)?;
        self.state()
            .nodes
            .retain(|node_path, _| !node_path.starts_with(path));
        Ok(())
    }
}
