use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::extension::catalog::CatalogEntry;
use crate::extension::error::ExtensionError;
use crate::extension::fetcher::{CancelToken, Fetcher, Progress};
use crate::extension::installer::install;
use crate::extension::verifier::{ChecksumKind, checksum, verify};

#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    Pending,
    Downloading,
    Verifying,
    Installed,
    Failed(String),
}

impl JobStatus {
    pub fn label(&self) -> &str {
        match self {
            JobStatus::Pending => "ready",
            JobStatus::Downloading => "downloading",
            JobStatus::Verifying => "verifying",
            JobStatus::Installed => "installed",
            JobStatus::Failed(_) => "failed",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, JobStatus::Downloading | JobStatus::Verifying)
    }
}

/// What a worker reports back to the job's owner.
#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    Progress(f64),
    Verifying,
    Installed,
    Failed(String),
}

/// Stamps every started worker so events from an older run are recognisable.
static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy)]
pub struct VerifyPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Installed,
    Cancelled,
}

/// Fetch, verify and install, wired to one profile and scratch directory.
pub struct Pipeline {
    fetcher: Arc<dyn Fetcher>,
    profile_dir: PathBuf,
    scratch_dir: PathBuf,
    verify: VerifyPolicy,
}

impl Pipeline {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        profile_dir: PathBuf,
        scratch_dir: PathBuf,
        verify: VerifyPolicy,
    ) -> Self {
        Self {
            fetcher,
            profile_dir,
            scratch_dir,
            verify,
        }
    }

    pub fn profile_dir(&self) -> &Path {
        &self.profile_dir
    }

    /// Creates the temp file a single fetch streams into.
    fn create_temp_file(&self, id: &str) -> Result<PathBuf, ExtensionError> {
        let io_err = |source| ExtensionError::Io {
            path: self.scratch_dir.clone(),
            source,
        };

        fs::create_dir_all(&self.scratch_dir).map_err(io_err)?;
        let (_file, path) = tempfile::Builder::new()
            .prefix(&format!("{id}-"))
            .suffix(".tar")
            .tempfile_in(&self.scratch_dir)
            .map_err(io_err)?
            .keep()
            .map_err(|err| io_err(err.error))?;
        Ok(path)
    }

    /// Runs one job to completion on the calling thread.
    ///
    /// The archive at `temp_path` is unpacked only after its checksum matched.
    pub fn run(
        &self,
        entry: &CatalogEntry,
        temp_path: &Path,
        cancel: &CancelToken,
        report: &mut dyn FnMut(JobEvent),
    ) -> Result<Outcome, ExtensionError> {
        let mut last_percent = None;
        let fetched = self.fetcher.fetch(
            &entry.url,
            temp_path,
            &mut |progress: Progress| {
                if cancel.is_cancelled() {
                    return;
                }
                tracing::trace!(
                    "{}: +{} bytes ({} of {:?})",
                    entry.url,
                    progress.chunk_size,
                    progress.bytes_read,
                    progress.total_size
                );
                let percent = (progress.fraction() * 100.0).floor() as u32;
                if last_percent != Some(percent) {
                    last_percent = Some(percent);
                    report(JobEvent::Progress(progress.fraction()));
                }
            },
            cancel,
        );

        match fetched {
            Ok(()) => {}
            Err(err) if err.is_cancelled() => return Ok(Outcome::Cancelled),
            Err(err) => return Err(err.into()),
        }

        if cancel.is_cancelled() {
            return Ok(Outcome::Cancelled);
        }
        report(JobEvent::Verifying);
        if !self.verify_with_retries(temp_path, &entry.checksum, cancel)? {
            return Ok(Outcome::Cancelled);
        }

        install(temp_path, &self.profile_dir)?;
        Ok(Outcome::Installed)
    }

    /// Bounded re-checks of the digest. `Ok(false)` means cancelled.
    fn verify_with_retries(
        &self,
        path: &Path,
        expected: &str,
        cancel: &CancelToken,
    ) -> Result<bool, ExtensionError> {
        let attempts = self.verify.attempts.max(1);
        for attempt in 1..=attempts {
            if cancel.is_cancelled() {
                return Ok(false);
            }
            if verify(path, expected) {
                tracing::info!("checksum verified for {}", path.display());
                return Ok(true);
            }

            tracing::warn!(
                "checksum mismatch for {} (attempt {attempt}/{attempts})",
                path.display()
            );
            if attempt < attempts {
                thread::sleep(self.verify.interval);
            }
        }

        let actual = match ChecksumKind::for_expected(expected) {
            Some(kind) => checksum(path, kind).unwrap_or_else(|err| err.to_string()),
            None => "unsupported checksum format".to_string(),
        };
        Err(ExtensionError::ChecksumMismatch {
            expected: expected.to_string(),
            actual,
        })
    }
}

/// One catalog entry's download, from activation to a terminal state.
#[derive(Debug)]
pub struct DownloadJob {
    pub id: String,
    pub entry: CatalogEntry,
    pub temp_path: Option<PathBuf>,
    pub progress: f64,
    pub status: JobStatus,
    generation: u64,
    cancel: Option<CancelToken>,
    worker: Option<JoinHandle<()>>,
}

impl DownloadJob {
    pub fn new(id: impl Into<String>, entry: CatalogEntry) -> Self {
        Self {
            id: id.into(),
            entry,
            temp_path: None,
            progress: 0.0,
            status: JobStatus::Pending,
            generation: 0,
            cancel: None,
            worker: None,
        }
    }

    /// Starts a worker unless one is already running. Returns whether it started.
    ///
    /// `notify` receives every event from the worker thread together with the
    /// run's generation; feed both back through [`DownloadJob::apply`].
    pub fn start(
        &mut self,
        pipeline: &Arc<Pipeline>,
        notify: impl Fn(u64, JobEvent) + Send + 'static,
    ) -> Result<bool, ExtensionError> {
        if self.status.is_active() {
            return Ok(false);
        }
        if self.entry.checksum_kind().is_none() {
            let err = ExtensionError::UnsupportedChecksum {
                checksum: self.entry.checksum.clone(),
            };
            self.status = JobStatus::Failed(err.to_string());
            return Err(err);
        }

        let temp_path = pipeline.create_temp_file(&self.id)?;
        let cancel = CancelToken::new();
        let generation = NEXT_GENERATION.fetch_add(1, Ordering::Relaxed);

        self.generation = generation;
        self.temp_path = Some(temp_path.clone());
        self.cancel = Some(cancel.clone());
        self.progress = 0.0;
        self.status = JobStatus::Downloading;

        tracing::info!(
            "downloading {} from {} into {}",
            self.id,
            self.entry.url,
            temp_path.display()
        );

        let id = self.id.clone();
        let entry = self.entry.clone();
        let pipeline = Arc::clone(pipeline);
        self.worker = Some(thread::spawn(move || {
            let mut report = |event| notify(generation, event);
            match pipeline.run(&entry, &temp_path, &cancel, &mut report) {
                Ok(Outcome::Installed) => {
                    tracing::info!("installed {id} into {}", pipeline.profile_dir().display());
                    let _ = fs::remove_file(&temp_path);
                    if cancel.is_cancelled() {
                        tracing::info!("download of {id} cancelled after extraction");
                    } else {
                        notify(generation, JobEvent::Installed);
                    }
                }
                Ok(Outcome::Cancelled) => {
                    tracing::info!("download of {id} cancelled");
                    let _ = fs::remove_file(&temp_path);
                }
                Err(_) if cancel.is_cancelled() => {
                    let _ = fs::remove_file(&temp_path);
                }
                Err(err) => {
                    tracing::error!("download of {id} failed: {err}");
                    notify(generation, JobEvent::Failed(err.to_string()));
                }
            }
        }));

        Ok(true)
    }

    /// Applies a worker event. Events from an earlier run, or that do not fit
    /// the current state, are dropped and `false` is returned.
    pub fn apply(&mut self, generation: u64, event: JobEvent) -> bool {
        if generation != self.generation {
            tracing::debug!("{}: dropping {event:?} from run {generation}", self.id);
            return false;
        }
        let next = match (&self.status, event) {
            (JobStatus::Downloading, JobEvent::Progress(fraction)) => {
                self.progress = fraction.clamp(0.0, 1.0);
                return true;
            }
            (JobStatus::Downloading, JobEvent::Verifying) => {
                self.progress = 1.0;
                JobStatus::Verifying
            }
            (JobStatus::Verifying, JobEvent::Installed) => JobStatus::Installed,
            (JobStatus::Downloading | JobStatus::Verifying, JobEvent::Failed(reason)) => {
                JobStatus::Failed(reason)
            }
            (status, event) => {
                tracing::debug!("{}: ignoring {event:?} while {}", self.id, status.label());
                return false;
            }
        };

        self.status = next;
        if !self.status.is_active() {
            self.cancel = None;
            self.worker = None;
        }
        true
    }

    /// Stops an active worker. Its temp file is deleted by the worker.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
        if self.status.is_active() {
            self.status = JobStatus::Failed("cancelled".to_string());
        }
    }

    #[cfg(test)]
    fn join(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.join().unwrap();
        }
    }
}

impl Drop for DownloadJob {
    fn drop(&mut self) {
        self.cancel();
    }
}
