use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::commands::report::BugReport;
use crate::error::{ReportError, Result};
use crate::util::write_atomic;

/// File name of the pending-queue slot.
pub const PENDING_QUEUE_FILE: &str = "pending_bugs.json";

/// Local durable list of reports that could not be delivered.
#[async_trait]
pub trait PendingQueue: Send + Sync + 'static {
    /// Append a report. Returns the queue length afterwards.
    async fn enqueue(&self, report: &BugReport) -> Result<usize>;

    /// Every queued report, oldest first.
    async fn pending(&self) -> Result<Vec<BugReport>>;
}

/// A JSON array in a single file, rewritten whole (temp file plus rename) on every append.
///
/// A missing file is an empty queue. A file that doesn't parse is an error and
/// is left untouched. There is no cross-process locking.
pub struct FilePendingQueue {
    path: PathBuf,
}

impl FilePendingQueue {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data-local-dir>/bugdesk/pending_bugs.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_local_dir().map(|d| d.join("bugdesk").join(PENDING_QUEUE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Vec<BugReport>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(vec![]);
        }
        serde_json::from_str(&content).map_err(|e| {
            ReportError::Custom(format!(
                "Pending queue {} is corrupt: {e}",
                self.path.display()
            ))
        })
    }
}

#[async_trait]
impl PendingQueue for FilePendingQueue {
    async fn enqueue(&self, report: &BugReport) -> Result<usize> {
        let mut reports = self.read_all().await?;
        reports.push(report.clone());

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(&reports)?;
        write_atomic(&self.path, json.as_bytes()).await?;

        Ok(reports.len())
    }

    async fn pending(&self) -> Result<Vec<BugReport>> {
        self.read_all().await
    }
}

/// In-process queue. Can be switched to fail every append.
#[derive(Default)]
pub struct MemoryPendingQueue {
    reports: Mutex<Vec<BugReport>>,
    failing: AtomicBool,
}

impl MemoryPendingQueue {
    /// A queue whose appends always fail, as if local storage were full.
    pub fn failing() -> Self {
        let queue = Self::default();
        queue.failing.store(true, Ordering::SeqCst);
        queue
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<BugReport>>> {
        self.reports
            .lock()
            .map_err(|_| ReportError::Custom("pending queue lock poisoned".into()))
    }
}

#[async_trait]
impl PendingQueue for MemoryPendingQueue {
    async fn enqueue(&self, report: &BugReport) -> Result<usize> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ReportError::Io(std::io::Error::other(
                "local storage quota exceeded",
            )));
        }
        let mut reports = self.lock()?;
        reports.push(report.clone());
        Ok(reports.len())
    }

    async fn pending(&self) -> Result<Vec<BugReport>> {
        Ok(self.lock()?.clone())
    }
}
