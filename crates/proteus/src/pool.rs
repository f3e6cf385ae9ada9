//! Concurrent extraction over a batch of files.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      ParserPool::process                      │
//! ├──────────────────────────────────────────────────────────────┤
//! │  Dispatching: job channel pre-loaded with every file; W      │
//! │               workers, each with its own ExtractorSet        │
//! │  Draining:    results collected and reported as workers      │
//! │               finish them; workers joined when drained       │
//! │  Resolution:  header/implementation pairs linked (optional)  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Parsers are never shared: a worker builds its extractors once and owns
//! them until its queue is empty. Workers share only the channels and the
//! read-only grammar registry.
//!
//! Every input file produces exactly one result, a `ParsedFile`, an
//! `ExtractionError`, or both. A worker whose extractors cannot be built
//! still drains its share of the queue, reporting an error per file, and a
//! panicking extractor is contained to the file it was working on.

use std::num::NonZeroUsize;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use crossbeam_channel::{Receiver, Sender, bounded};
use tracing::{debug, warn};

use crate::error::{ExtractionError, Result};
use crate::languages::ExtractorSet;
use crate::resolver;
use crate::types::{ParsedFile, ScannedFile};

/// Upper bound on worker threads, configured or automatic.
pub const MAX_WORKERS: usize = 16;

/// Number of workers for a batch of `files`.
///
/// A `configured` count of zero picks automatically: small batches get at
/// most two workers, medium ones half the CPUs, large ones every CPU. The
/// result never exceeds [`MAX_WORKERS`] or the file count and is at least 1.
#[must_use]
pub fn worker_count(files: usize, configured: usize) -> usize {
    let cpus = std::thread::available_parallelism().map_or(1, NonZeroUsize::get);
    worker_count_for(files, configured, cpus)
}

fn worker_count_for(files: usize, configured: usize, cpus: usize) -> usize {
    let wanted = if configured > 0 {
        configured
    } else if files < 10 {
        cpus.min(2)
    } else if files < 50 {
        (cpus / 2).max(1)
    } else {
        cpus
    };
    wanted.min(MAX_WORKERS).min(files).max(1)
}

/// Shared flag that stops a running batch.
///
/// Jobs picked up after cancellation are not extracted; each yields a
/// `Cancelled` error so the result count still matches the input.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// A token that has not been cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Configuration for a [`ParserPool`].
#[derive(Debug, Clone)]
pub struct PoolOptions {
    /// Worker threads; 0 picks a count from the batch size
    pub workers: usize,
    /// Link header and implementation files after extraction
    pub resolve_pairs: bool,
    /// Checked before every job
    pub cancel: Option<CancellationToken>,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            workers: 0,
            resolve_pairs: true,
            cancel: None,
        }
    }
}

impl PoolOptions {
    /// Use exactly `workers` threads (capped at [`MAX_WORKERS`]); 0 means automatic.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Enable or disable header/implementation linking.
    #[must_use]
    pub fn with_resolve_pairs(mut self, resolve_pairs: bool) -> Self {
        self.resolve_pairs = resolve_pairs;
        self
    }

    /// Stop the batch when `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Receives progress as results are collected.
///
/// Called on the thread that invoked [`ParserPool::process`], once per
/// input file, in completion order.
pub trait ProgressReporter: Send + Sync {
    /// `current` of `total` files have been collected; `path` was the latest.
    fn on_progress(&self, current: usize, total: usize, path: &Path);

    /// `path` produced an error. Partial results may still follow in the output.
    fn on_error(&self, path: &Path, error: &ExtractionError) {
        let _ = (path, error);
    }
}

/// Builds the extractors owned by one worker.
pub type ExtractorFactory = Box<dyn Fn() -> Result<ExtractorSet> + Send + Sync>;

/// Lifecycle of a pool, observable through [`ParserPool::state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PoolState {
    /// No batch has started
    Idle = 0,
    /// Jobs are being queued and workers started
    Dispatching = 1,
    /// Workers are extracting; results are collected as they arrive
    Draining = 2,
    /// The last batch completed
    Done = 3,
}

impl PoolState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Dispatching,
            2 => Self::Draining,
            3 => Self::Done,
            _ => Self::Idle,
        }
    }
}

/// Aggregated results of one batch.
///
/// `files` and `errors` are in completion order; correlate them by path. A
/// file with a syntax error appears in both.
#[derive(Debug, Default)]
pub struct PoolOutput {
    /// Every file that produced a `ParsedFile`, complete or partial
    pub files: Vec<ParsedFile>,
    /// Every file-level error
    pub errors: Vec<ExtractionError>,
}

struct JobResult {
    path: PathBuf,
    file: Option<ParsedFile>,
    error: Option<ExtractionError>,
}

/// Drives extraction of many files across worker threads.
pub struct ParserPool {
    options: PoolOptions,
    reporter: Option<Box<dyn ProgressReporter>>,
    factory: ExtractorFactory,
    state: AtomicU8,
}

impl Default for ParserPool {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ParserPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserPool")
            .field("options", &self.options)
            .field("has_reporter", &self.reporter.is_some())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl ParserPool {
    /// A pool with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(PoolOptions::default())
    }

    /// A pool with the given options.
    #[must_use]
    pub fn with_options(options: PoolOptions) -> Self {
        Self {
            options,
            reporter: None,
            factory: Box::new(ExtractorSet::new),
            state: AtomicU8::new(PoolState::Idle as u8),
        }
    }

    /// Report progress to `reporter`.
    #[must_use]
    pub fn with_reporter(mut self, reporter: impl ProgressReporter + 'static) -> Self {
        self.reporter = Some(Box::new(reporter));
        self
    }

    /// Build each worker's extractors with `factory` instead of
    /// [`ExtractorSet::new`].
    #[must_use]
    pub fn with_factory(
        mut self,
        factory: impl Fn() -> Result<ExtractorSet> + Send + Sync + 'static,
    ) -> Self {
        self.factory = Box::new(factory);
        self
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> PoolState {
        PoolState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// The options this pool was built with.
    #[must_use]
    pub fn options(&self) -> &PoolOptions {
        &self.options
    }

    fn transition(&self, next: PoolState) {
        let previous = PoolState::from_u8(self.state.swap(next as u8, Ordering::AcqRel));
        debug!(from = ?previous, to = ?next, "Parser pool state change");
    }

    /// Record one result and report it.
    fn collect(&self, output: &mut PoolOutput, current: usize, total: usize, result: JobResult) {
        if let Some(reporter) = &self.reporter {
            reporter.on_progress(current, total, &result.path);
        }
        if let Some(error) = result.error {
            if let Some(reporter) = &self.reporter {
                reporter.on_error(&result.path, &error);
            }
            output.errors.push(error);
        }
        if let Some(file) = result.file {
            output.files.push(file);
        }
    }

    /// Extract every file in `files`.
    ///
    /// Never fails as a whole: per-file problems are returned in
    /// [`PoolOutput::errors`] next to whatever was extracted.
    pub fn process(&self, files: &[ScannedFile]) -> PoolOutput {
        if files.is_empty() {
            self.transition(PoolState::Done);
            return PoolOutput::default();
        }

        let total = files.len();
        let workers = worker_count(total, self.options.workers);
        self.transition(PoolState::Dispatching);
        debug!(files = total, workers, "Dispatching extraction jobs");

        let (job_tx, job_rx) = bounded::<&ScannedFile>(total);
        for file in files {
            if job_tx.send(file).is_err() {
                break;
            }
        }
        drop(job_tx);

        let (result_tx, result_rx) = bounded::<JobResult>(total);
        let mut output = PoolOutput::default();
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|id| {
                    let jobs = job_rx.clone();
                    let results = result_tx.clone();
                    let factory = &self.factory;
                    let cancel = self.options.cancel.as_ref();
                    scope.spawn(move || run_worker(id, &jobs, &results, factory, cancel))
                })
                .collect();
            drop(result_tx);
            self.transition(PoolState::Draining);

            // Ends once every worker has dropped its sender.
            for (index, result) in result_rx.iter().enumerate() {
                self.collect(&mut output, index + 1, total, result);
            }

            for (id, handle) in handles.into_iter().enumerate() {
                if handle.join().is_err() {
                    warn!(worker = id, "Extraction worker terminated abnormally");
                }
            }
        });

        if self.options.resolve_pairs {
            resolver::resolve_pairs(&mut output.files, files);
        }

        debug!(
            files = output.files.len(),
            errors = output.errors.len(),
            "Extraction batch complete"
        );
        self.transition(PoolState::Done);
        output
    }
}

fn run_worker(
    id: usize,
    jobs: &Receiver<&ScannedFile>,
    results: &Sender<JobResult>,
    factory: &ExtractorFactory,
    cancel: Option<&CancellationToken>,
) {
    let mut extractors = match factory() {
        Ok(set) => Some(set),
        Err(e) => {
            warn!(worker = id, error = %e, "Failed to create extractors, draining queue");
            None
        }
    };

    for file in jobs {
        let (parsed, error) = if cancel.is_some_and(CancellationToken::is_cancelled) {
            (None, Some(ExtractionError::cancelled(file.path.clone())))
        } else {
            match extractors.as_mut() {
                Some(set) => extract_guarded(set, file),
                None => (
                    None,
                    Some(ExtractionError::parse(
                        file.path.clone(),
                        format!("worker {id}: failed to create extractors"),
                    )),
                ),
            }
        };

        let result = JobResult {
            path: file.path.clone(),
            file: parsed,
            error,
        };
        if results.send(result).is_err() {
            break;
        }
    }
}

/// Run one extraction, turning a panic into a parse error for that file.
fn extract_guarded(
    set: &mut ExtractorSet,
    file: &ScannedFile,
) -> (Option<ParsedFile>, Option<ExtractionError>) {
    match catch_unwind(AssertUnwindSafe(|| set.extract(file))) {
        Ok(extraction) => extraction.into_parts(),
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(ToString::to_string)
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            warn!(file = %file.path.display(), reason = %reason, "Extractor panicked");
            (
                None,
                Some(ExtractionError::parse(
                    file.path.clone(),
                    format!("extractor panicked: {reason}"),
                )),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ExtractionErrorKind};
    use crate::languages::{Extraction, Extractor};
    use crate::types::Language;
    use rstest::rstest;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tempfile::TempDir;

    fn go_files(dir: &TempDir, count: usize) -> Vec<ScannedFile> {
        (0..count)
            .map(|i| {
                let name = format!("f{i}.go");
                std::fs::write(dir.path().join(&name), format!("package p\n\nfunc F{i}() {{}}\n")).unwrap();
                ScannedFile::under(dir.path(), name, "go")
            })
            .collect()
    }

    #[rstest]
    #[case(5, 0, 8, 2)]
    #[case(5, 0, 1, 1)]
    #[case(20, 0, 8, 4)]
    #[case(20, 0, 1, 1)]
    #[case(100, 0, 8, 8)]
    #[case(100, 0, 64, 16)]
    #[case(100, 40, 8, 16)]
    #[case(3, 8, 8, 3)]
    #[case(1, 0, 8, 1)]
    fn worker_count_rules(
        #[case] files: usize,
        #[case] configured: usize,
        #[case] cpus: usize,
        #[case] expected: usize,
    ) {
        assert_eq!(worker_count_for(files, configured, cpus), expected);
    }

    #[test]
    fn empty_batch_spawns_nothing() {
        let pool = ParserPool::with_options(PoolOptions::default()).with_factory(|| {
            panic!("no worker should start for an empty batch");
        });
        assert_eq!(pool.state(), PoolState::Idle);

        let output = pool.process(&[]);
        assert!(output.files.is_empty());
        assert!(output.errors.is_empty());
        assert_eq!(pool.state(), PoolState::Done);
    }

    #[test]
    fn every_file_is_extracted() {
        let dir = TempDir::new().unwrap();
        let files = go_files(&dir, 12);
        let pool = ParserPool::with_options(PoolOptions::default().with_workers(3));

        let output = pool.process(&files);
        assert_eq!(output.files.len(), 12);
        assert!(output.errors.is_empty());
        assert_eq!(pool.state(), PoolState::Done);
    }

    #[test]
    fn construction_failure_reports_every_file() {
        let dir = TempDir::new().unwrap();
        let files = go_files(&dir, 4);
        let pool = ParserPool::with_options(PoolOptions::default().with_workers(2))
            .with_factory(|| Err(Error::Extraction("no grammars".to_string())));

        let output = pool.process(&files);
        assert!(output.files.is_empty());
        assert_eq!(output.errors.len(), 4);
        for error in &output.errors {
            assert_eq!(error.kind, ExtractionErrorKind::Parse);
            assert!(error.message.contains("failed to create extractors"));
        }
    }

    #[test]
    fn cancelled_batch_yields_cancelled_errors() {
        let dir = TempDir::new().unwrap();
        let files = go_files(&dir, 5);
        let token = CancellationToken::new();
        token.cancel();
        let pool = ParserPool::with_options(PoolOptions::default().with_cancellation(token));

        let output = pool.process(&files);
        assert!(output.files.is_empty());
        assert_eq!(output.errors.len(), 5);
        assert!(output.errors.iter().all(|e| e.kind == ExtractionErrorKind::Cancelled));
    }

    struct Panicking;

    impl Extractor for Panicking {
        fn languages(&self) -> &'static [Language] {
            &[Language::Python]
        }

        fn extract(&mut self, _file: &ScannedFile) -> Extraction {
            panic!("grammar exploded");
        }
    }

    #[test]
    fn panicking_extractor_is_contained() {
        let dir = TempDir::new().unwrap();
        let mut files = go_files(&dir, 2);
        std::fs::write(dir.path().join("boom.py"), "x = 1\n").unwrap();
        files.push(ScannedFile::under(dir.path(), "boom.py", "python"));

        let pool = ParserPool::with_options(PoolOptions::default().with_workers(1)).with_factory(|| {
            Ok(ExtractorSet::from_extractors(vec![
                Box::new(crate::languages::GoExtractor::new()?),
                Box::new(Panicking),
            ]))
        });

        let output = pool.process(&files);
        assert_eq!(output.files.len(), 2);
        assert_eq!(output.errors.len(), 1);
        assert_eq!(output.errors[0].path, PathBuf::from("boom.py"));
        assert!(output.errors[0].message.contains("grammar exploded"));
    }

    #[derive(Default)]
    struct Recorder {
        progress: Mutex<Vec<(usize, usize)>>,
        errors: AtomicUsize,
    }

    impl ProgressReporter for Arc<Recorder> {
        fn on_progress(&self, current: usize, total: usize, _path: &Path) {
            self.progress.lock().unwrap().push((current, total));
        }

        fn on_error(&self, _path: &Path, _error: &ExtractionError) {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn reporter_sees_every_result() {
        let dir = TempDir::new().unwrap();
        let mut files = go_files(&dir, 3);
        files.push(ScannedFile::under(dir.path(), "notes.txt", "plaintext"));
        let recorder = Arc::new(Recorder::default());

        let pool = ParserPool::new().with_reporter(Arc::clone(&recorder));
        let output = pool.process(&files);

        assert_eq!(output.errors.len(), 1);
        assert_eq!(output.errors[0].kind, ExtractionErrorKind::UnsupportedLanguage);
        let progress = recorder.progress.lock().unwrap().clone();
        assert_eq!(progress, vec![(1, 4), (2, 4), (3, 4), (4, 4)]);
        assert_eq!(recorder.errors.load(Ordering::Relaxed), 1);
    }

    /// Holds its file until the reporter has seen another file finish.
    struct Gated {
        signals: Receiver<()>,
        released: Arc<AtomicBool>,
    }

    impl Extractor for Gated {
        fn languages(&self) -> &'static [Language] {
            &[Language::Python]
        }

        fn extract(&mut self, file: &ScannedFile) -> Extraction {
            let released = self.signals.recv_timeout(Duration::from_secs(10)).is_ok();
            self.released.store(released, Ordering::SeqCst);
            Extraction::Complete(ParsedFile::new(file.path.clone(), Language::Python, Vec::new()))
        }
    }

    struct Signal(Sender<()>);

    impl ProgressReporter for Signal {
        fn on_progress(&self, _current: usize, _total: usize, _path: &Path) {
            let _ = self.0.send(());
        }
    }

    #[test]
    fn progress_is_reported_while_workers_run() {
        let dir = TempDir::new().unwrap();
        let mut files = go_files(&dir, 4);
        std::fs::write(dir.path().join("slow.py"), "x = 1\n").unwrap();
        files.insert(0, ScannedFile::under(dir.path(), "slow.py", "python"));

        let (signal_tx, signal_rx) = crossbeam_channel::unbounded();
        let released = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&released);
        let pool = ParserPool::with_options(PoolOptions::default().with_workers(2))
            .with_reporter(Signal(signal_tx))
            .with_factory(move || {
                Ok(ExtractorSet::from_extractors(vec![
                    Box::new(crate::languages::GoExtractor::new()?),
                    Box::new(Gated {
                        signals: signal_rx.clone(),
                        released: Arc::clone(&flag),
                    }),
                ]))
            });

        let output = pool.process(&files);

        assert_eq!(output.files.len(), 5);
        assert!(output.errors.is_empty());
        assert!(
            released.load(Ordering::SeqCst),
            "slow file should be released by progress from the other worker"
        );
    }
}
