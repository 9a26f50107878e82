use super::{FrameApp, Notice, PendingLoad, ViewCommand};
use crate::errors::FrameError;
use crate::image_source::{ImageRequest, LoadedImage};
use crate::playlist::Locator;
use crate::task_scheduler::{FrameTask, TaskPriority, TaskResult};

use std::time::Instant;

impl FrameApp {
    /// Queues a load. Any earlier load still in flight is superseded.
    pub(crate) fn request_load(&mut self, locator: Locator) -> Vec<ViewCommand> {
        self.next_generation += 1;
        let generation = self.next_generation;
        let request = ImageRequest::from(&self.settings.images);

        if let Some(previous) = self.pending_load.take() {
            tracing::debug!(locator = %previous.locator, "superseding pending load");
        }
        self.pending_load = Some(PendingLoad {
            locator: locator.clone(),
            generation,
            started: Instant::now(),
            timeout: request.timeout,
        });

        self.scheduler.submit(
            FrameTask::LoadImage {
                locator,
                request,
                generation,
            },
            TaskPriority::Critical,
        );
        vec![ViewCommand::Loading(true)]
    }

    /// Applies finished background work, enforces the load timeout and lets
    /// the gesture machine confirm pending taps. Call from the host's loop.
    pub fn poll(&mut self, now: Instant) -> Vec<ViewCommand> {
        let mut out = Vec::new();

        while let Some(result) = self.scheduler.try_recv_result() {
            match result {
                TaskResult::ImageLoaded {
                    locator,
                    generation,
                    image,
                } => {
                    if self.take_pending(generation) {
                        self.apply_loaded(locator, image, &mut out);
                    } else {
                        tracing::debug!(%locator, generation, "dropping stale image");
                    }
                }
                TaskResult::ImageFailed {
                    locator,
                    generation,
                    error,
                } => {
                    if self.take_pending(generation) {
                        self.load_failed(locator, error, &mut out);
                    }
                }
                TaskResult::ScanCompleted { report } => self.apply_scan(report, &mut out),
            }
        }

        if let Some(pending) = &self.pending_load {
            if now.saturating_duration_since(pending.started) >= pending.timeout {
                let error = FrameError::LoadTimeout {
                    locator: pending.locator.to_string(),
                    timeout: pending.timeout,
                };
                let locator = pending.locator.clone();
                self.pending_load = None;
                self.load_failed(locator, error, &mut out);
            }
        }

        let commands = self.gestures.poll(now, &mut self.view);
        out.extend(self.apply_gesture_commands(commands));
        out
    }

    fn take_pending(&mut self, generation: u64) -> bool {
        let current = self
            .pending_load
            .as_ref()
            .is_some_and(|pending| pending.generation == generation);
        if current {
            self.pending_load = None;
        }
        current
    }

    fn apply_loaded(&mut self, locator: Locator, image: LoadedImage, out: &mut Vec<ViewCommand>) {
        let extent = match image.extent() {
            Ok(extent) => extent,
            Err(e) => {
                self.load_failed(locator, e, out);
                return;
            }
        };

        let saved = self.persistence.position(&locator);
        let transform = self.view.show_image(extent, saved);
        tracing::info!(
            %locator,
            width = image.width,
            height = image.height,
            restored = saved.is_some(),
            "image displayed"
        );

        out.push(ViewCommand::Loading(false));
        out.push(ViewCommand::ImageReady {
            locator: locator.clone(),
            width: image.width,
            height: image.height,
        });
        out.push(ViewCommand::Render(transform));

        self.current_locator = Some(locator);
        self.current_image = Some(image);
    }

    /// The previous image and transform stay on screen.
    fn load_failed(&mut self, locator: Locator, error: FrameError, out: &mut Vec<ViewCommand>) {
        error.log();
        let message = error.user_message();
        out.push(ViewCommand::Loading(false));
        out.push(ViewCommand::LoadFailed {
            locator,
            message: message.clone(),
        });
        out.push(ViewCommand::Notify(Notice::LoadError(message)));
    }
}
