// THEORY:
// Decoding a JPEG dominates the cost of the whole benchmark, and every image is
// independent, so the sampling stage runs on a small worker pool:
//
//   caller --SampleTask--> dispatcher --round robin--> worker 0..N
//                                                        |
//   caller <----------- oneshot result ------------------+
//
// A single dispatcher task owns the shared queue and hands tasks to the workers
// in turn. Each worker moves the decode onto tokio's blocking pool so that the
// async runtime threads are never stalled by image work. Every task carries its
// own `oneshot` sender, so results find their caller regardless of which worker
// ran them or in what order they finished.
//
// The pool only samples. Clustering, aggregation and assignment stay sequential
// in `pipeline`.

use crate::core_modules::patch_sampler::{ColorSample, PatchSampler};
use crate::core_modules::pixel::pixel::ChannelDepth;
use crate::error::{BenchmarkError, Result};
use crate::utils::image_helper::image_helper::{ImageEntry, sample_file};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

/// Every Nth finished image is logged while a directory is being sampled.
pub const PROGRESS_INTERVAL: usize = 5000;

/// The per-image work a worker runs on the blocking pool.
pub type SampleFn = Arc<dyn Fn(&ImageEntry) -> Result<ColorSample> + Send + Sync>;

pub struct SampleTask {
    pub entry: ImageEntry,
    pub result_sender: oneshot::Sender<Result<ColorSample>>,
}

pub struct SamplerPool {
    task_sender: mpsc::UnboundedSender<SampleTask>,
    workers: Vec<tokio::task::JoinHandle<()>>,
}

impl SamplerPool {
    /// Spawns the dispatcher and `worker_count` workers that decode and sample image files.
    pub fn new(sampler: PatchSampler, depth: ChannelDepth, worker_count: usize) -> Result<Self> {
        let sample_fn: SampleFn =
            Arc::new(move |entry: &ImageEntry| sample_file(&sampler, depth, entry));
        Self::with_sampler(worker_count, sample_fn)
    }

    /// Spawns the pool around arbitrary per-image work. Must be called inside a tokio runtime.
    pub fn with_sampler(worker_count: usize, sample_fn: SampleFn) -> Result<Self> {
        if worker_count == 0 {
            return Err(BenchmarkError::Config(
                "the sampler pool needs at least one worker".to_string(),
            ));
        }

        let (task_sender, mut task_receiver) = mpsc::unbounded_channel::<SampleTask>();
        let mut workers = Vec::with_capacity(worker_count);

        let (worker_senders, worker_receivers): (Vec<_>, Vec<_>) = (0..worker_count)
            .map(|_| mpsc::unbounded_channel::<SampleTask>())
            .unzip();

        tokio::spawn(async move {
            let mut worker_idx = 0;
            while let Some(task) = task_receiver.recv().await {
                // A closed worker drops the task, and with it the reply sender.
                let _ = worker_senders[worker_idx].send(task);
                worker_idx = (worker_idx + 1) % worker_count;
            }
        });

        for (worker_id, mut worker_receiver) in worker_receivers.into_iter().enumerate() {
            let sample_fn = Arc::clone(&sample_fn);
            let worker = tokio::spawn(async move {
                while let Some(task) = worker_receiver.recv().await {
                    let SampleTask {
                        entry,
                        result_sender,
                    } = task;
                    debug!("Worker {} sampling {}", worker_id, entry.path.display());

                    let sample_fn = Arc::clone(&sample_fn);
                    let result = tokio::task::spawn_blocking(move || sample_fn(&entry))
                        .await
                        .unwrap_or_else(|err| {
                            Err(BenchmarkError::WorkerPool(format!(
                                "sampling task failed: {}",
                                err
                            )))
                        });

                    let _ = result_sender.send(result);
                }
            });
            workers.push(worker);
        }

        Ok(Self {
            task_sender,
            workers,
        })
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub async fn sample(&self, entry: ImageEntry) -> Result<ColorSample> {
        let (result_sender, result_receiver) = oneshot::channel();

        self.task_sender
            .send(SampleTask {
                entry,
                result_sender,
            })
            .map_err(|_| {
                BenchmarkError::WorkerPool("failed to send task to the sampler pool".to_string())
            })?;

        result_receiver.await.map_err(|_| {
            BenchmarkError::WorkerPool("failed to receive result from a sampler worker".to_string())
        })?
    }

    /// Samples every entry, keeping at most one image per worker in flight.
    /// The first failure stops dispatch and is returned. The samples come back
    /// ordered by identifier.
    pub async fn sample_all(&self, entries: Vec<ImageEntry>) -> Result<Vec<ColorSample>> {
        let mut completed = 0usize;
        let mut samples: Vec<ColorSample> = stream::iter(entries)
            .map(|entry| self.sample(entry))
            .buffer_unordered(self.worker_count())
            .inspect_ok(|sample| {
                if completed % PROGRESS_INTERVAL == 0 {
                    info!("i = {}, Galaxy Id = {}", completed, sample.identifier());
                }
                completed += 1;
            })
            .try_collect()
            .await?;

        samples.sort_by(|a, b| a.identifier().cmp(b.identifier()));
        Ok(samples)
    }

    /// Closes the queue and waits for every worker to drain.
    pub async fn shutdown(self) -> Result<()> {
        drop(self.task_sender);
        for worker in self.workers {
            worker
                .await
                .map_err(|err| BenchmarkError::WorkerPool(format!("worker panicked: {}", err)))?;
        }
        Ok(())
    }
}
