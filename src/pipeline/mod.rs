use async_trait::async_trait;
use console::style;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;
use uuid::Uuid;

use crate::config::{Configuration, Job};
use crate::extraction::{ExtractionClient, ExtractionResult, JobMetadata};
use crate::gemini::GenerationService;
use crate::output::DocumentWriter;
use crate::sources::{PollPolicy, SourceRegistry};
use crate::utils::format_duration;
use crate::Result;

/// Inter-job throttle
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, delay: Duration);
}

/// Sleeps on the Tokio timer
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, delay: Duration) {
        if !delay.is_zero() {
            tracing::debug!("Waiting {:?} before next video", delay);
            tokio::time::sleep(delay).await;
        }
    }
}

/// Restricts a batch to jobs whose id, path or YouTube URL is listed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobFilter {
    wanted: Vec<String>,
}

impl JobFilter {
    /// No restriction
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new(wanted: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            wanted: wanted.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.wanted.is_empty()
    }

    /// Jobs selected by this filter, in configuration order
    pub fn select<'a>(&self, jobs: &'a [Job]) -> Vec<&'a Job> {
        jobs.iter()
            .filter(|job| self.is_empty() || job.matches_any(&self.wanted))
            .collect()
    }
}

/// A job that did not produce a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFailure {
    pub job_title: String,
    pub source: String,
    pub reason: String,
}

/// Outcome of one batch run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<JobFailure>,
}

impl BatchSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }

    /// Print processing summary
    pub fn print(&self) {
        let rule = "=".repeat(70);
        println!("\n{}", rule);
        println!("PROCESSING SUMMARY");
        println!("{}", rule);
        println!("Total videos: {}", self.total);
        println!("{} Successful: {}", style("✓").green(), self.succeeded);
        println!("{} Failed: {}", style("✗").red(), self.failed);

        if !self.failures.is_empty() {
            println!("\nFailed videos:");
            for failure in &self.failures {
                println!("  - {} ({}): {}", failure.job_title, failure.source, failure.reason);
            }
        }
    }
}

/// Runs prepare → extract → write for each job, one at a time
pub struct BatchOrchestrator {
    config: Configuration,
    sources: SourceRegistry,
    client: ExtractionClient,
    writer: DocumentWriter,
    pacer: Box<dyn Pacer>,
}

impl BatchOrchestrator {
    /// Build the standard pipeline against `service`
    pub fn new(
        config: Configuration,
        service: Arc<dyn GenerationService>,
        poll: PollPolicy,
        show_progress: bool,
    ) -> Self {
        let sources = SourceRegistry::new(service.clone(), poll, show_progress);
        Self::from_parts(config, sources, service)
    }

    /// Assemble around an existing source registry. The extraction client is
    /// built from `config`, the same config that supplies jobs and pacing.
    pub fn from_parts(
        config: Configuration,
        sources: SourceRegistry,
        service: Arc<dyn GenerationService>,
    ) -> Self {
        let client = ExtractionClient::new(&config, service);
        Self {
            config,
            sources,
            client,
            writer: DocumentWriter::new(),
            pacer: Box::new(TokioPacer),
        }
    }

    pub fn with_pacer(mut self, pacer: Box<dyn Pacer>) -> Self {
        self.pacer = pacer;
        self
    }

    /// Process the selected jobs. Per-job failures are recorded, never propagated.
    pub async fn run(&mut self, filter: &JobFilter) -> BatchSummary {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("batch", run_id = %run_id);
        self.run_jobs(filter).instrument(span).await
    }

    async fn run_jobs(&mut self, filter: &JobFilter) -> BatchSummary {
        let jobs: Vec<Job> = filter
            .select(&self.config.jobs)
            .into_iter()
            .cloned()
            .collect();
        let mut summary = BatchSummary {
            total: jobs.len(),
            ..Default::default()
        };

        if jobs.is_empty() {
            tracing::info!("No videos to process.");
            return summary;
        }

        tracing::info!("BATCH PROCESSING: {} videos", jobs.len());
        let start_time = Instant::now();
        let delay = self.config.rate_limit_delay;

        for (i, job) in jobs.iter().enumerate() {
            let title = job.display_title();
            tracing::info!("[{}/{}] Processing: {}", i + 1, jobs.len(), title);

            match self.process_job(job).await {
                Ok(_) => {
                    summary.succeeded += 1;
                    tracing::info!("Successfully processed: {}", title);
                }
                Err(e) => {
                    let source = job.source.descriptor();
                    tracing::error!("Failed to process {}: {}", source, e);
                    summary.failed += 1;
                    summary.failures.push(JobFailure {
                        job_title: title,
                        source,
                        reason: e.to_string(),
                    });
                }
            }

            // Respect rate limits
            if i + 1 < jobs.len() {
                self.pacer.pause(delay).await;
            }
        }

        tracing::info!(
            "Batch finished in {}: {} succeeded, {} failed",
            format_duration(start_time.elapsed().as_secs_f64()),
            summary.succeeded,
            summary.failed
        );

        summary
    }

    /// One unit of work: prepare, extract, write
    async fn process_job(&mut self, job: &Job) -> Result<ExtractionResult> {
        let metadata = JobMetadata::from(job);

        let prepared = self.sources.prepare(&job.source, job.title.as_deref()).await?;
        let result = self.client.extract(&prepared, &metadata).await?;
        self.writer.write(&result, &metadata, &job.output_path).await?;

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VideoSource;
    use crate::gemini::{FileState, MockGenerationService, RemoteFile};
    use crate::sources::{MemorySourceCache, OriginKind, PreparedSource, ReadinessState, SourceCache};
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts pauses instead of sleeping
    #[derive(Clone, Default)]
    struct CountingPacer {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Pacer for CountingPacer {
        async fn pause(&self, _delay: Duration) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn job(id: &str, source: VideoSource, out_dir: &Path) -> Job {
        Job {
            id: Some(id.to_string()),
            title: Some(format!("Title {}", id)),
            section: Some("Section".to_string()),
            source,
            output_path: out_dir.join(format!("{}.md", id)),
        }
    }

    fn youtube(id: &str) -> VideoSource {
        VideoSource::Remote(format!("https://youtu.be/{}", id))
    }

    fn config(jobs: Vec<Job>) -> Configuration {
        Configuration {
            model: "gemini-test".to_string(),
            rate_limit_delay: Duration::from_secs(2),
            prompt_template: "Extract {title}".to_string(),
            course_context: String::new(),
            output_format: String::new(),
            api_key: "k".to_string(),
            jobs,
        }
    }

    fn echo_service() -> MockGenerationService {
        let mut service = MockGenerationService::new();
        service
            .expect_generate()
            .returning(|_, _, prompt, _| Ok(Some(format!("content for {}", prompt))));
        service
    }

    fn fast_poll() -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(1),
            timeout: None,
        }
    }

    fn orchestrator(
        config: Configuration,
        service: MockGenerationService,
        pacer: CountingPacer,
    ) -> BatchOrchestrator {
        BatchOrchestrator::new(config, Arc::new(service), fast_poll(), false)
            .with_pacer(Box::new(pacer))
    }

    #[tokio::test]
    async fn test_failure_is_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let jobs = vec![
            job("a", youtube("aaa"), dir.path()),
            job("b", VideoSource::Local(PathBuf::from("/missing/video.mp4")), dir.path()),
            job("c", youtube("ccc"), dir.path()),
            job("d", youtube("ddd"), dir.path()),
        ];
        let config = config(jobs);
        let pacer = CountingPacer::default();

        let summary = orchestrator(config, echo_service(), pacer.clone())
            .run(&JobFilter::all())
            .await;

        assert_eq!(summary.total, 4);
        assert_eq!(summary.succeeded, 3);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].job_title, "Title b");
        assert_eq!(summary.failures[0].source, "/missing/video.mp4");
        assert!(summary.failures[0].reason.contains("not found"));

        assert!(dir.path().join("a.md").exists());
        assert!(!dir.path().join("b.md").exists());
        assert!(dir.path().join("c.md").exists());
        assert!(dir.path().join("d.md").exists());
        assert!(!summary.all_succeeded());
    }

    #[tokio::test]
    async fn test_pacing_between_jobs_only() {
        let dir = tempfile::tempdir().unwrap();
        let jobs = (0..5)
            .map(|i| job(&format!("j{}", i), youtube(&format!("v{}", i)), dir.path()))
            .collect();
        let config = config(jobs);
        let pacer = CountingPacer::default();

        let summary = orchestrator(config, echo_service(), pacer.clone())
            .run(&JobFilter::all())
            .await;

        assert_eq!(summary.succeeded, 5);
        assert_eq!(pacer.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_single_job_never_pauses() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(vec![job("only", youtube("x1"), dir.path())]);
        let pacer = CountingPacer::default();

        orchestrator(config, echo_service(), pacer.clone())
            .run(&JobFilter::all())
            .await;

        assert_eq!(pacer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_filter_selects_by_id_and_source() {
        let dir = tempfile::tempdir().unwrap();
        let jobs = (0..5)
            .map(|i| job(&format!("j{}", i), youtube(&format!("v{}", i)), dir.path()))
            .collect();
        let config = config(jobs);

        let filter = JobFilter::new(["j1", "https://youtu.be/v3"]);
        let summary = orchestrator(config, echo_service(), CountingPacer::default())
            .run(&filter)
            .await;

        assert_eq!(summary.total, 2);
        assert_eq!(summary.succeeded, 2);
        assert!(dir.path().join("j1.md").exists());
        assert!(dir.path().join("j3.md").exists());
        assert!(!dir.path().join("j0.md").exists());
    }

    #[tokio::test]
    async fn test_filter_matching_nothing_is_empty_batch() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(vec![job("a", youtube("aaa"), dir.path())]);
        let mut service = MockGenerationService::new();
        service.expect_generate().never();

        let summary = orchestrator(config, service, CountingPacer::default())
            .run(&JobFilter::new(["nope"]))
            .await;

        assert_eq!(summary, BatchSummary::default());
    }

    #[tokio::test]
    async fn test_repeated_local_source_uploaded_once() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("lecture.mp4");
        std::fs::write(&video, b"video").unwrap();

        let mut service = echo_service();
        service.expect_upload_file().times(1).returning(|_, _, _| {
            Ok(RemoteFile {
                name: "files/lecture".to_string(),
                display_name: None,
                mime_type: Some("video/mp4".to_string()),
                uri: "https://generativelanguage.googleapis.com/v1beta/files/lecture".to_string(),
                state: FileState::Active,
                error: None,
            })
        });

        let config = config(vec![
            job("first", VideoSource::Local(video.clone()), dir.path()),
            job("second", VideoSource::Local(video.clone()), dir.path()),
        ]);

        let summary = orchestrator(config, service, CountingPacer::default())
            .run(&JobFilter::all())
            .await;

        assert_eq!(summary.succeeded, 2);
    }

    #[tokio::test]
    async fn test_injected_cache_skips_upload() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("lecture.mp4");
        std::fs::write(&video, b"video").unwrap();

        let mut cache = MemorySourceCache::new();
        cache.insert(
            VideoSource::Local(video.clone()).identity(),
            PreparedSource {
                uri: "https://generativelanguage.googleapis.com/v1beta/files/earlier".to_string(),
                mime_type: "video/mp4".to_string(),
                display_name: "lecture".to_string(),
                origin_kind: OriginKind::Local,
                readiness: ReadinessState::Ready,
                remote_name: Some("files/earlier".to_string()),
            },
        );

        let mut service = MockGenerationService::new();
        service.expect_upload_file().never();
        service.expect_get_file().never();
        service
            .expect_generate()
            .withf(|_, source, _, _| source.uri.ends_with("/files/earlier"))
            .times(1)
            .returning(|_, _, _, _| Ok(Some("BODY".to_string())));
        let service: Arc<dyn GenerationService> = Arc::new(service);

        let sources =
            SourceRegistry::new(service.clone(), fast_poll(), false).with_cache(Box::new(cache));
        let config = config(vec![job("cached", VideoSource::Local(video), dir.path())]);

        let summary = BatchOrchestrator::from_parts(config, sources, service)
            .with_pacer(Box::new(CountingPacer::default()))
            .run(&JobFilter::all())
            .await;

        assert!(summary.all_succeeded());
        assert!(dir.path().join("cached.md").exists());
    }

    #[tokio::test]
    async fn test_written_document_has_header_and_body() {
        let dir = tempfile::tempdir().unwrap();
        let mut j = job("doc", youtube("abc123"), dir.path());
        j.title = Some("T".to_string());
        j.section = Some("S".to_string());
        let config = config(vec![j]);

        let mut service = MockGenerationService::new();
        service
            .expect_generate()
            .returning(|_, _, _, _| Ok(Some("BODY".to_string())));

        let summary = orchestrator(config, service, CountingPacer::default())
            .run(&JobFilter::all())
            .await;
        assert!(summary.all_succeeded());

        let content = std::fs::read_to_string(dir.path().join("doc.md")).unwrap();
        assert!(content.starts_with("# T\n"));
        assert!(content.contains("**Section:** S"));
        assert!(content.contains("**YouTube URL:** https://youtu.be/abc123"));
        assert!(content.ends_with("BODY"));
    }
}
