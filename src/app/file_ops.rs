use super::{FrameApp, Notice, ScanRequest, ViewCommand};
use crate::scan::ScanReport;
use crate::task_scheduler::{FrameTask, TaskPriority};

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

impl FrameApp {
    pub fn is_scanning(&self) -> bool {
        self.scan_cancel.is_some()
    }

    /// Scans the configured library roots in the background.
    pub fn start_scan(&mut self) -> ScanRequest {
        let roots = self.settings.library.scan_roots.clone();
        self.start_scan_in(roots)
    }

    pub fn start_scan_in(&mut self, roots: Vec<PathBuf>) -> ScanRequest {
        if self.is_scanning() {
            tracing::info!("scan already running, request rejected");
            return ScanRequest::AlreadyRunning;
        }
        tracing::info!(roots = roots.len(), "starting library scan");

        let cancel = Arc::new(AtomicBool::new(false));
        self.scan_cancel = Some(Arc::clone(&cancel));
        self.scheduler.submit(
            FrameTask::ScanDirectories {
                roots,
                order: self.settings.library.sort_order,
                cancel,
            },
            TaskPriority::Low,
        );
        ScanRequest::Started
    }

    /// Best effort: the worker stops at the next directory boundary.
    pub fn cancel_scan(&mut self) {
        if let Some(cancel) = &self.scan_cancel {
            cancel.store(true, Ordering::Relaxed);
        }
    }

    pub(crate) fn apply_scan(&mut self, report: ScanReport, out: &mut Vec<ViewCommand>) {
        self.scan_cancel = None;
        if report.cancelled {
            tracing::info!(found = report.locators.len(), "discarding cancelled scan");
            return;
        }
        let count = report.locators.len();
        self.playlist.replace_entries(report.locators);
        out.push(ViewCommand::Notify(Notice::ScanFinished(count)));
    }
}
