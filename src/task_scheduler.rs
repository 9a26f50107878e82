use std::collections::BinaryHeap;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use crate::errors::{FrameError, Result};
use crate::image_source::{DefaultImageSource, ImageRequest, ImageSource, LoadedImage};
use crate::playlist::Locator;
use crate::scan::{self, FileEnumerator, ScanReport, WalkDirEnumerator};
use crate::settings::SortOrder;

/// Priority levels for background work
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TaskPriority {
    Low = 0,
    Medium = 1,
    High = 2,
    /// The image the user is waiting for
    Critical = 3,
}

#[derive(Debug)]
struct PrioritizedTask {
    priority: TaskPriority,
    task_id: u64,
    task: FrameTask,
}

impl PartialEq for PrioritizedTask {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.task_id == other.task_id
    }
}

impl Eq for PrioritizedTask {}

impl PartialOrd for PrioritizedTask {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PrioritizedTask {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Max-heap: higher priority first, then earlier submissions
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.task_id.cmp(&self.task_id))
    }
}

#[derive(Debug)]
pub enum FrameTask {
    LoadImage {
        locator: Locator,
        request: ImageRequest,
        /// Lets the receiver drop results of superseded loads
        generation: u64,
    },
    ScanDirectories {
        roots: Vec<PathBuf>,
        order: SortOrder,
        cancel: Arc<AtomicBool>,
    },
}

#[derive(Debug)]
pub enum TaskResult {
    ImageLoaded {
        locator: Locator,
        generation: u64,
        image: LoadedImage,
    },
    ImageFailed {
        locator: Locator,
        generation: u64,
        error: FrameError,
    },
    ScanCompleted {
        report: ScanReport,
    },
}

struct QueueState {
    heap: BinaryHeap<PrioritizedTask>,
    next_task_id: u64,
    running: bool,
}

struct Shared {
    queue: Mutex<QueueState>,
    available: Condvar,
}

fn lock(shared: &Shared) -> MutexGuard<'_, QueueState> {
    shared.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Priority worker pool for image loads and directory scans. Results are
/// collected by polling on the interactive thread.
pub struct TaskScheduler {
    shared: Arc<Shared>,
    result_rx: Receiver<TaskResult>,
    workers: Vec<thread::JoinHandle<()>>,
}

pub fn default_worker_count() -> usize {
    num_cpus::get().max(2)
}

impl TaskScheduler {
    pub fn new(
        num_workers: usize,
        source: Arc<dyn ImageSource>,
        enumerator: Arc<dyn FileEnumerator>,
    ) -> Result<Self> {
        let (result_tx, result_rx) = mpsc::channel();
        let shared = Arc::new(Shared {
            queue: Mutex::new(QueueState {
                heap: BinaryHeap::new(),
                next_task_id: 0,
                running: true,
            }),
            available: Condvar::new(),
        });

        let mut scheduler = Self {
            shared,
            result_rx,
            workers: Vec::with_capacity(num_workers),
        };

        for i in 0..num_workers.max(1) {
            let shared = Arc::clone(&scheduler.shared);
            let result_tx = result_tx.clone();
            let source = Arc::clone(&source);
            let enumerator = Arc::clone(&enumerator);

            let worker = thread::Builder::new()
                .name(format!("frame-worker-{}", i))
                .spawn(move || Self::worker_loop(&shared, &result_tx, source.as_ref(), enumerator.as_ref()))?;
            scheduler.workers.push(worker);
        }

        tracing::debug!(workers = scheduler.workers.len(), "task scheduler started");
        Ok(scheduler)
    }

    /// Local files and `walkdir` scanning on one worker per core.
    pub fn with_defaults() -> Result<Self> {
        Self::new(
            default_worker_count(),
            Arc::new(DefaultImageSource::new()?),
            Arc::new(WalkDirEnumerator),
        )
    }

    fn worker_loop(
        shared: &Shared,
        result_tx: &Sender<TaskResult>,
        source: &dyn ImageSource,
        enumerator: &dyn FileEnumerator,
    ) {
        loop {
            let next = {
                let mut state = lock(shared);
                loop {
                    if !state.running {
                        return;
                    }
                    if let Some(task) = state.heap.pop() {
                        break task;
                    }
                    state = shared
                        .available
                        .wait(state)
                        .unwrap_or_else(|poisoned| poisoned.into_inner());
                }
            };

            tracing::trace!(task_id = next.task_id, priority = ?next.priority, "running task");
            let result = Self::execute_task(next.task, source, enumerator);
            if result_tx.send(result).is_err() {
                // Receiver gone, nobody wants results any more
                return;
            }
        }
    }

    fn execute_task(task: FrameTask, source: &dyn ImageSource, enumerator: &dyn FileEnumerator) -> TaskResult {
        match task {
            FrameTask::LoadImage {
                locator,
                request,
                generation,
            } => match source.load(&locator, &request) {
                Ok(image) => TaskResult::ImageLoaded {
                    locator,
                    generation,
                    image,
                },
                Err(error) => TaskResult::ImageFailed {
                    locator,
                    generation,
                    error,
                },
            },
            FrameTask::ScanDirectories { roots, order, cancel } => {
                let report = scan::scan(&roots, enumerator, &cancel, order);
                TaskResult::ScanCompleted { report }
            }
        }
    }

    pub fn submit(&self, task: FrameTask, priority: TaskPriority) -> u64 {
        let task_id = {
            let mut state = lock(&self.shared);
            let task_id = state.next_task_id;
            state.next_task_id += 1;
            state.heap.push(PrioritizedTask {
                priority,
                task_id,
                task,
            });
            task_id
        };
        self.shared.available.notify_one();
        task_id
    }

    pub fn try_recv_result(&self) -> Option<TaskResult> {
        self.result_rx.try_recv().ok()
    }

    pub fn recv_result_timeout(&self, timeout: Duration) -> Option<TaskResult> {
        match self.result_rx.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Removes a task that has not started yet. Returns whether it was queued.
    pub fn cancel_task(&self, task_id: u64) -> bool {
        let mut state = lock(&self.shared);
        let before = state.heap.len();
        state.heap.retain(|task| task.task_id != task_id);
        state.heap.len() != before
    }

    pub fn queue_size(&self) -> usize {
        lock(&self.shared).heap.len()
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        lock(&self.shared).running = false;
        self.shared.available.notify_all();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

impl Drop for TaskScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
