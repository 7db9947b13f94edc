use crate::client::RewriteClient;
use crate::config::{Config, FailurePolicy};
use crate::docx;
use crate::error::{Error, Result};
use crate::progress::{ChannelSink, ProgressEvent, ProgressSink};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// One input file scheduled for processing.
///
/// Created when the input directory is listed; immutable for the rest of
/// the run.
#[derive(Debug, Clone)]
pub struct Job {
    /// Absolute or run-relative path to the input file
    pub path: PathBuf,

    /// Bare filename, reused for the output document
    pub file_name: String,

    /// 1-based position in the directory listing
    pub index: usize,
}

impl Job {
    /// Returns true if the filename carries the recognized document
    /// extension (ASCII case-insensitive).
    #[must_use]
    pub fn is_eligible(&self, extension: &str) -> bool {
        self.path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
    }
}

/// A per-file failure recorded under [`FailurePolicy::Skip`].
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    /// Filename of the document that failed
    pub file_name: String,

    /// Human-readable error message
    pub error: String,
}

/// Aggregate outcome of one completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Directory entries counted at run start, eligible or not
    pub total_entries: usize,

    /// Documents read, rewritten, and written out
    pub rewritten: usize,

    /// Entries without the document extension, counted but untouched
    pub ignored: usize,

    /// Per-file failures (always empty under [`FailurePolicy::Abort`])
    pub failures: Vec<FileFailure>,

    /// Wall-clock duration of the run
    pub duration: Duration,

    /// Output directory path
    pub output_directory: String,
}

impl RunReport {
    /// Returns true if every eligible document was rewritten.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Prints a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!("\n╔═══════════════════════════════════════════════╗");
        println!("║             Rewrite Run Summary               ║");
        println!("╠═══════════════════════════════════════════════╣");
        println!("║ Entries scanned:     {:>8}                 ║", self.total_entries);
        println!("║ Documents rewritten: {:>8}                 ║", self.rewritten);
        println!("║ Entries ignored:     {:>8}                 ║", self.ignored);
        println!("║ Failures:            {:>8}                 ║", self.failures.len());
        println!(
            "║ Duration:            {:>8.2}s                ║",
            self.duration.as_secs_f64()
        );
        println!("║ Output directory:                             ║");
        println!("║   {}", self.output_directory);
        println!("╚═══════════════════════════════════════════════╝\n");
    }
}

/// Terminal notification delivered to the progress sink.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// The run walked the whole directory (possibly with skipped failures).
    Completed(RunReport),

    /// The run aborted on a setup or per-file error.
    Failed(String),
}

/// Drives one batch rewrite run.
///
/// Walks the input directory once, in listing order, strictly one file at
/// a time: read the document, rewrite it through the client, write the
/// result under the same filename in the output directory, then report
/// progress. Ineligible entries are counted but otherwise untouched. What
/// happens on a per-file error is decided by the configured
/// [`FailurePolicy`].
#[derive(Debug)]
pub struct BatchRunner {
    config: Config,
    client: RewriteClient,
}

impl BatchRunner {
    /// Creates a runner, validating the configuration.
    ///
    /// # Errors
    ///
    /// Returns a setup error if the input directory is missing or the
    /// configuration is otherwise invalid. No file is touched in that case.
    pub fn new(config: Config, client: RewriteClient) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, client })
    }

    /// Executes the run, reporting through `sink`.
    ///
    /// Exactly one `on_complete` is delivered, on success and on failure
    /// alike. The call blocks until the run is over; use [`Self::spawn`] to
    /// keep a foreground surface responsive.
    ///
    /// # Errors
    ///
    /// Returns the first error under [`FailurePolicy::Abort`], or any
    /// setup/listing error. Output files already written stay in place.
    #[instrument(skip(self, sink), fields(input_dir = %self.config.input_dir.display()))]
    pub fn run(&self, sink: &dyn ProgressSink) -> Result<RunReport> {
        match self.execute(sink) {
            Ok(report) => {
                info!(
                    "Run completed: {}/{} entries rewritten in {:.2}s",
                    report.rewritten,
                    report.total_entries,
                    report.duration.as_secs_f64()
                );
                sink.on_complete(&RunOutcome::Completed(report.clone()));
                Ok(report)
            }
            Err(e) => {
                sink.on_complete(&RunOutcome::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    /// Moves the runner to a background thread.
    ///
    /// Returns the join handle and the receiving end of the progress
    /// channel. The foreground consumer drains [`ProgressEvent`]s at its
    /// own pace; a run cannot be cancelled once started.
    #[must_use]
    pub fn spawn(self) -> (JoinHandle<Result<RunReport>>, Receiver<ProgressEvent>) {
        let (sink, events) = ChannelSink::new();
        let handle = std::thread::spawn(move || self.run(&sink));
        (handle, events)
    }

    fn execute(&self, sink: &dyn ProgressSink) -> Result<RunReport> {
        let start = Instant::now();

        fs::create_dir_all(&self.config.output_dir)
            .map_err(|e| Error::io(&self.config.output_dir, e))?;

        let jobs = self.list_jobs()?;
        let total = jobs.len();
        info!("Found {} directory entries in {}", total, self.config.input_dir.display());

        let mut rewritten = 0;
        let mut ignored = 0;
        let mut failures = Vec::new();

        for job in &jobs {
            if job.is_eligible(&self.config.extension) {
                match self.process(job) {
                    Ok(()) => rewritten += 1,
                    Err(e) => match self.config.failure_policy {
                        FailurePolicy::Abort => {
                            warn!("Aborting run: '{}' failed: {e}", job.file_name);
                            return Err(e);
                        }
                        FailurePolicy::Skip => {
                            warn!("Skipping '{}': {e}", job.file_name);
                            failures.push(FileFailure {
                                file_name: job.file_name.clone(),
                                error: e.to_string(),
                            });
                        }
                    },
                }
            } else {
                debug!("Ignoring '{}' (no .{} extension)", job.file_name, self.config.extension);
                ignored += 1;
            }

            sink.on_progress(job.index, total);
        }

        Ok(RunReport {
            total_entries: total,
            rewritten,
            ignored,
            failures,
            duration: start.elapsed(),
            output_directory: self.config.output_dir.display().to_string(),
        })
    }

    /// Lists the input directory once, in the order the filesystem
    /// returns entries. No sort is imposed.
    fn list_jobs(&self) -> Result<Vec<Job>> {
        let entries = fs::read_dir(&self.config.input_dir)
            .map_err(|e| Error::io(&self.config.input_dir, e))?;

        let mut jobs = Vec::new();
        for (i, entry) in entries.enumerate() {
            let entry = entry.map_err(|e| Error::io(&self.config.input_dir, e))?;
            jobs.push(Job {
                file_name: entry.file_name().to_string_lossy().into_owned(),
                path: entry.path(),
                index: i + 1,
            });
        }

        Ok(jobs)
    }

    fn process(&self, job: &Job) -> Result<()> {
        debug!("Reading '{}'", job.file_name);
        let original = docx::read_docx(&job.path)?;

        let generated = self.client.rewrite(&original)?;

        let output_path = self.config.output_dir.join(&job.file_name);
        docx::write_docx(&output_path, &generated)?;

        info!(
            "Rewrote '{}' ({} -> {} chars)",
            job.file_name,
            original.len(),
            generated.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ChatBackend;
    use crate::config::RetryPolicy;
    use assert_fs::prelude::*;
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    /// Backend that answers every prompt with a fixed marker.
    struct EchoBackend;

    impl ChatBackend for EchoBackend {
        fn complete(&self, _prompt: &str) -> crate::Result<String> {
            Ok("generated text".to_string())
        }
    }

    /// Backend that always fails.
    struct DownBackend;

    impl ChatBackend for DownBackend {
        fn complete(&self, _prompt: &str) -> crate::Result<String> {
            Err(Error::api("service down"))
        }
    }

    /// Sink recording every callback for later assertions.
    #[derive(Default)]
    struct RecordingSink {
        progress: Mutex<Vec<(usize, usize)>>,
        outcomes: Mutex<Vec<RunOutcome>>,
    }

    impl ProgressSink for RecordingSink {
        fn on_progress(&self, current: usize, total: usize) {
            self.progress.lock().unwrap().push((current, total));
        }

        fn on_complete(&self, outcome: &RunOutcome) {
            self.outcomes.lock().unwrap().push(outcome.clone());
        }
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 2,
            pause: Duration::ZERO,
            retry_delay: Duration::ZERO,
        }
    }

    fn echo_client() -> RewriteClient {
        RewriteClient::with_backend(Arc::new(EchoBackend), fast_retry())
    }

    fn config_for(input: &Path, output: &Path) -> Config {
        Config::builder().input_dir(input).output_dir(output).build()
    }

    #[test]
    fn test_outputs_mirror_inputs() {
        let temp = assert_fs::TempDir::new().unwrap();
        let input = temp.child("articles");
        input.create_dir_all().unwrap();
        docx::write_docx(&input.path().join("a.docx"), "first article").unwrap();
        docx::write_docx(&input.path().join("b.docx"), "second article").unwrap();
        let output = temp.child("rewritten");

        let runner =
            BatchRunner::new(config_for(input.path(), output.path()), echo_client()).unwrap();
        let sink = RecordingSink::default();
        let report = runner.run(&sink).unwrap();

        assert_eq!(report.total_entries, 2);
        assert_eq!(report.rewritten, 2);
        assert_eq!(report.ignored, 0);
        assert!(report.is_clean());

        assert_eq!(
            docx::read_docx(&output.path().join("a.docx")).unwrap(),
            "generated text"
        );
        assert!(output.path().join("b.docx").exists());
        assert_eq!(*sink.progress.lock().unwrap(), vec![(1, 2), (2, 2)]);
    }

    #[test]
    fn test_ineligible_entries_count_toward_progress_only() {
        let temp = assert_fs::TempDir::new().unwrap();
        let input = temp.child("articles");
        input.create_dir_all().unwrap();
        docx::write_docx(&input.path().join("a.docx"), "Hello world").unwrap();
        input.child("notes.txt").write_str("scratch notes").unwrap();
        let output = temp.child("rewritten");
        assert!(!output.path().exists());

        let runner =
            BatchRunner::new(config_for(input.path(), output.path()), echo_client()).unwrap();
        let sink = RecordingSink::default();
        let report = runner.run(&sink).unwrap();

        assert!(output.path().exists());
        assert!(output.path().join("a.docx").exists());
        assert!(!output.path().join("notes.txt").exists());

        assert_eq!(report.total_entries, 2);
        assert_eq!(report.rewritten, 1);
        assert_eq!(report.ignored, 1);
        assert_eq!(*sink.progress.lock().unwrap(), vec![(1, 2), (2, 2)]);

        let outcomes = sink.outcomes.lock().unwrap();
        assert_eq!(outcomes.len(), 1);
        assert!(matches!(outcomes[0], RunOutcome::Completed(_)));
    }

    #[test]
    fn test_extension_match_is_case_insensitive() {
        let temp = assert_fs::TempDir::new().unwrap();
        let input = temp.child("articles");
        input.create_dir_all().unwrap();
        docx::write_docx(&input.path().join("UPPER.DOCX"), "shouting").unwrap();
        let output = temp.child("rewritten");

        let runner =
            BatchRunner::new(config_for(input.path(), output.path()), echo_client()).unwrap();
        let report = runner.run(&RecordingSink::default()).unwrap();

        assert_eq!(report.rewritten, 1);
        assert!(output.path().join("UPPER.DOCX").exists());
    }

    #[test]
    fn test_runner_debug_names_the_type() {
        let temp = assert_fs::TempDir::new().unwrap();
        let input = temp.child("articles");
        input.create_dir_all().unwrap();
        let output = temp.child("rewritten");

        let runner =
            BatchRunner::new(config_for(input.path(), output.path()), echo_client()).unwrap();

        assert!(format!("{runner:?}").contains("BatchRunner"));
    }

    #[test]
    fn test_missing_input_dir_is_setup_error() {
        let temp = assert_fs::TempDir::new().unwrap();
        let output = temp.child("rewritten");

        let config = config_for(&temp.path().join("absent"), output.path());
        let err = BatchRunner::new(config, echo_client()).unwrap_err();

        assert!(err.is_setup());
        assert!(!output.path().exists());
    }

    #[test]
    fn test_existing_output_dir_contents_untouched() {
        let temp = assert_fs::TempDir::new().unwrap();
        let input = temp.child("articles");
        input.create_dir_all().unwrap();
        docx::write_docx(&input.path().join("a.docx"), "article").unwrap();
        let output = temp.child("rewritten");
        output.create_dir_all().unwrap();
        output.child("unrelated.txt").write_str("keep me").unwrap();

        let runner =
            BatchRunner::new(config_for(input.path(), output.path()), echo_client()).unwrap();
        runner.run(&RecordingSink::default()).unwrap();

        output.child("unrelated.txt").assert("keep me");
        assert!(output.path().join("a.docx").exists());
    }

    #[test]
    fn test_abort_policy_stops_on_bad_document() {
        let temp = assert_fs::TempDir::new().unwrap();
        let input = temp.child("articles");
        input.create_dir_all().unwrap();
        input.child("bad.docx").write_str("not an archive").unwrap();
        let output = temp.child("rewritten");

        let runner =
            BatchRunner::new(config_for(input.path(), output.path()), echo_client()).unwrap();
        let sink = RecordingSink::default();
        let err = runner.run(&sink).unwrap_err();

        assert!(matches!(err, Error::Document { .. }));
        let outcomes = sink.outcomes.lock().unwrap();
        assert_eq!(outcomes.len(), 1);
        assert!(matches!(outcomes[0], RunOutcome::Failed(_)));
    }

    #[test]
    fn test_skip_policy_continues_past_bad_document() {
        let temp = assert_fs::TempDir::new().unwrap();
        let input = temp.child("articles");
        input.create_dir_all().unwrap();
        input.child("bad.docx").write_str("not an archive").unwrap();
        docx::write_docx(&input.path().join("good.docx"), "fine article").unwrap();
        let output = temp.child("rewritten");

        let config = Config::builder()
            .input_dir(input.path())
            .output_dir(output.path())
            .failure_policy(FailurePolicy::Skip)
            .build();
        let runner = BatchRunner::new(config, echo_client()).unwrap();
        let sink = RecordingSink::default();
        let report = runner.run(&sink).unwrap();

        assert_eq!(report.rewritten, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].file_name, "bad.docx");
        assert!(output.path().join("good.docx").exists());
        assert!(!output.path().join("bad.docx").exists());
        assert_eq!(sink.progress.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_exhausted_retries_surface_as_file_failure() {
        let temp = assert_fs::TempDir::new().unwrap();
        let input = temp.child("articles");
        input.create_dir_all().unwrap();
        docx::write_docx(&input.path().join("a.docx"), "article").unwrap();
        let output = temp.child("rewritten");

        let config = Config::builder()
            .input_dir(input.path())
            .output_dir(output.path())
            .failure_policy(FailurePolicy::Skip)
            .build();
        let client = RewriteClient::with_backend(Arc::new(DownBackend), fast_retry());
        let runner = BatchRunner::new(config, client).unwrap();
        let report = runner.run(&RecordingSink::default()).unwrap();

        assert_eq!(report.rewritten, 0);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].error.contains("2 attempts"));
        // No empty document is ever written on persistent failure.
        assert!(!output.path().join("a.docx").exists());
    }

    #[test]
    fn test_spawn_delivers_events_over_channel() {
        let temp = assert_fs::TempDir::new().unwrap();
        let input = temp.child("articles");
        input.create_dir_all().unwrap();
        docx::write_docx(&input.path().join("a.docx"), "article").unwrap();
        let output = temp.child("rewritten");

        let runner =
            BatchRunner::new(config_for(input.path(), output.path()), echo_client()).unwrap();
        let (handle, events) = runner.spawn();

        let events: Vec<_> = events.iter().collect();
        let report = handle.join().unwrap().unwrap();

        assert_eq!(report.rewritten, 1);
        assert!(matches!(
            events.first(),
            Some(ProgressEvent::Progress { current: 1, total: 1 })
        ));
        assert!(matches!(
            events.last(),
            Some(ProgressEvent::Complete(RunOutcome::Completed(_)))
        ));
    }

    #[test]
    fn test_job_eligibility() {
        let job = Job {
            path: PathBuf::from("/in/article.docx"),
            file_name: "article.docx".to_string(),
            index: 1,
        };
        assert!(job.is_eligible("docx"));
        assert!(!job.is_eligible("txt"));

        let job = Job {
            path: PathBuf::from("/in/no_extension"),
            file_name: "no_extension".to_string(),
            index: 2,
        };
        assert!(!job.is_eligible("docx"));
    }
}
