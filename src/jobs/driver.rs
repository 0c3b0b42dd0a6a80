use std::sync::Arc;
use std::time::Duration;

use super::{Job, JobId, JobStatus, JobStore, JobUpdate};
use crate::error::AppError;
use crate::script::Script;
use crate::tts::SpeechBackend;

#[derive(Debug, Clone, Copy)]
pub struct StageTimings {
    /// Wait between acceptance and the start of generation.
    pub start_delay: Duration,
    /// Ceiling on the whole lifecycle of one job.
    pub job_timeout: Duration,
}

/// Launches and supervises the background work for each accepted job.
pub struct JobRunner {
    store: Arc<JobStore>,
    backend: Arc<dyn SpeechBackend>,
    timings: StageTimings,
}

impl JobRunner {
    pub fn new(store: Arc<JobStore>, backend: Arc<dyn SpeechBackend>, timings: StageTimings) -> Self {
        Self {
            store,
            backend,
            timings,
        }
    }

    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    /// Create a job for `script` and start driving it in the background.
    ///
    /// Returns the freshly created (`pending`) record without waiting on any
    /// stage. The driver runs under a supervisor that moves the job to `failed`
    /// if the driver errors, panics or overruns the job timeout.
    pub fn submit(&self, script: Script) -> Job {
        let job = self.store.create();
        tracing::info!(
            job_id = %job.id,
            model = ?script.model,
            segments = script.segments.len(),
            "Job accepted"
        );

        tokio::spawn(supervise(
            Arc::clone(&self.store),
            Arc::clone(&self.backend),
            self.timings,
            job.id.clone(),
            script,
        ));

        job
    }
}

async fn supervise(
    store: Arc<JobStore>,
    backend: Arc<dyn SpeechBackend>,
    timings: StageTimings,
    job_id: JobId,
    script: Script,
) {
    let mut worker = tokio::spawn(drive(
        Arc::clone(&store),
        backend,
        job_id.clone(),
        script,
        timings.start_delay,
    ));

    let failure = match tokio::time::timeout(timings.job_timeout, &mut worker).await {
        Ok(Ok(Ok(()))) => return,
        Ok(Ok(Err(AppError::NotFound(_)))) => {
            tracing::warn!(job_id = %job_id, "Job evicted before completion, abandoning");
            return;
        }
        Ok(Ok(Err(e))) => e,
        Ok(Err(e)) => AppError::Internal(format!("job worker crashed: {}", e)),
        Err(_) => {
            worker.abort();
            AppError::UpstreamFailure(format!(
                "job timed out after {}s",
                timings.job_timeout.as_secs()
            ))
        }
    };

    tracing::warn!(job_id = %job_id, "Job failed: {}", failure);

    if store
        .update(
            &job_id,
            JobUpdate::Failed {
                error: failure.to_string(),
            },
        )
        .is_none()
    {
        tracing::warn!(job_id = %job_id, "Failed job was already evicted");
    }
}

async fn drive(
    store: Arc<JobStore>,
    backend: Arc<dyn SpeechBackend>,
    job_id: JobId,
    script: Script,
    start_delay: Duration,
) -> Result<(), AppError> {
    tokio::time::sleep(start_delay).await;

    advance(&store, &job_id, JobStatus::Generating)?;
    let audio = backend.generate(&job_id, &script).await?;

    advance(&store, &job_id, JobStatus::Uploading)?;
    let audio_url = backend.upload(&job_id, audio).await?;

    store
        .update(&job_id, JobUpdate::Completed { audio_url })
        .ok_or_else(|| AppError::NotFound("Job".into()))?;
    tracing::info!(job_id = %job_id, "Job completed");

    Ok(())
}

fn advance(store: &JobStore, job_id: &JobId, status: JobStatus) -> Result<(), AppError> {
    store
        .update(job_id, JobUpdate::Advance(status))
        .ok_or_else(|| AppError::NotFound("Job".into()))?;
    tracing::info!(job_id = %job_id, %status, "Job advanced");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::script::Mode;
    use crate::tts::{BackendError, Model, SimulatedBackend, VoiceConfig};

    const RETENTION: Duration = Duration::from_secs(300);

    enum Behaviour {
        FailGenerate,
        FailUpload,
        Panic,
        Hang,
    }

    struct FaultyBackend(Behaviour);

    #[async_trait]
    impl SpeechBackend for FaultyBackend {
        async fn generate(&self, _: &JobId, _: &Script) -> Result<Vec<u8>, BackendError> {
            match self.0 {
                Behaviour::FailGenerate => Err(BackendError::Synthesis("model offline".into())),
                Behaviour::Panic => panic!("synthesizer exploded"),
                Behaviour::Hang => std::future::pending().await,
                Behaviour::FailUpload => Ok(vec![1, 2, 3]),
            }
        }

        async fn upload(&self, _: &JobId, _: Vec<u8>) -> Result<String, BackendError> {
            Err(BackendError::Upload("bucket unavailable".into()))
        }
    }

    fn timings() -> StageTimings {
        StageTimings {
            start_delay: Duration::from_secs(2),
            job_timeout: Duration::from_secs(60),
        }
    }

    fn simulated_runner(retention: Duration) -> JobRunner {
        let backend = SimulatedBackend::new(
            Duration::from_secs(3),
            Duration::from_secs(2),
            "https://example.com/audio".into(),
        );
        JobRunner::new(
            Arc::new(JobStore::new(retention)),
            Arc::new(backend),
            timings(),
        )
    }

    fn faulty_runner(behaviour: Behaviour) -> JobRunner {
        JobRunner::new(
            Arc::new(JobStore::new(RETENTION)),
            Arc::new(FaultyBackend(behaviour)),
            timings(),
        )
    }

    fn script() -> Script {
        let voices = [VoiceConfig {
            speaker_name: None,
            voice: "alloy".into(),
        }];
        Script::compile(Model::Flash, Mode::Single, "Hello world", &voices).unwrap()
    }

    async fn status_after(runner: &JobRunner, id: &JobId, wait: Duration) -> Option<Job> {
        tokio::time::sleep(wait).await;
        runner.store().get(id)
    }

    #[tokio::test(start_paused = true)]
    async fn walks_through_every_stage() {
        let runner = simulated_runner(RETENTION);
        let job = runner.submit(script());
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(runner.store().get(&job.id).unwrap().status, JobStatus::Pending);

        let at_1s = status_after(&runner, &job.id, Duration::from_secs(1)).await.unwrap();
        assert_eq!(at_1s.status, JobStatus::Pending);

        let at_3s = status_after(&runner, &job.id, Duration::from_secs(2)).await.unwrap();
        assert_eq!(at_3s.status, JobStatus::Generating);

        let at_6s = status_after(&runner, &job.id, Duration::from_secs(3)).await.unwrap();
        assert_eq!(at_6s.status, JobStatus::Uploading);

        let at_8s = status_after(&runner, &job.id, Duration::from_secs(2)).await.unwrap();
        assert_eq!(at_8s.status, JobStatus::Completed);
        assert_eq!(
            at_8s.audio_url,
            Some(format!("https://example.com/audio/{}.wav", job.id))
        );
        assert!(at_8s.error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn completed_jobs_expire_after_retention() {
        let runner = simulated_runner(RETENTION);
        let job = runner.submit(script());

        let done = status_after(&runner, &job.id, Duration::from_secs(8)).await.unwrap();
        assert_eq!(done.status, JobStatus::Completed);

        assert!(status_after(&runner, &job.id, RETENTION).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn generation_error_fails_the_job() {
        let runner = faulty_runner(Behaviour::FailGenerate);
        let job = runner.submit(script());

        let failed = status_after(&runner, &job.id, Duration::from_secs(3)).await.unwrap();
        assert_eq!(failed.status, JobStatus::Failed);
        assert_eq!(
            failed.error.as_deref(),
            Some("Upstream failure: synthesis failed: model offline")
        );
        assert!(failed.audio_url.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn upload_error_fails_the_job() {
        let runner = faulty_runner(Behaviour::FailUpload);
        let job = runner.submit(script());

        let failed = status_after(&runner, &job.id, Duration::from_secs(3)).await.unwrap();
        assert_eq!(failed.status, JobStatus::Failed);
        assert_eq!(
            failed.error.as_deref(),
            Some("Upstream failure: upload failed: bucket unavailable")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_worker_fails_the_job() {
        let runner = faulty_runner(Behaviour::Panic);
        let job = runner.submit(script());

        let failed = status_after(&runner, &job.id, Duration::from_secs(3)).await.unwrap();
        assert_eq!(failed.status, JobStatus::Failed);
        assert!(failed
            .error
            .unwrap()
            .starts_with("Internal error: job worker crashed"));
    }

    #[tokio::test(start_paused = true)]
    async fn hung_worker_times_out() {
        let runner = faulty_runner(Behaviour::Hang);
        let job = runner.submit(script());

        let stuck = status_after(&runner, &job.id, Duration::from_secs(30)).await.unwrap();
        assert_eq!(stuck.status, JobStatus::Generating);

        let failed = status_after(&runner, &job.id, Duration::from_secs(31)).await.unwrap();
        assert_eq!(failed.status, JobStatus::Failed);
        assert_eq!(
            failed.error.as_deref(),
            Some("Upstream failure: job timed out after 60s")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn evicted_jobs_are_abandoned_not_recreated() {
        let runner = simulated_runner(Duration::from_secs(1));
        let job = runner.submit(script());

        assert!(status_after(&runner, &job.id, Duration::from_secs(10)).await.is_none());
        runner.store().evict_expired();
        assert!(runner.store().is_empty());
    }
}
