// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Background gateway worker.
//!
//! The UI thread never waits on the network. It submits [`Command`]s and
//! drains [`WorkerEvent`]s once per frame; a dedicated thread owns a tokio
//! runtime and runs every gateway call on it.

use crate::gateway::{GatewayError, ProgressFn, TransformGateway};
use crate::models::source::{DownloadRequest, DownloadedFile, VideoInfo};
use crate::session::TransformJob;
use anyhow::{Context, Result};
use bytes::Bytes;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::Arc;
use std::thread;

/// Callback run after every event, typically `egui::Context::request_repaint`.
pub type Notify = Arc<dyn Fn() + Send + Sync>;

/// What a download is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadPurpose {
    /// Save the file to disk.
    Save,
    /// Load the file into the editing session with this id.
    Edit(u64),
}

#[derive(Debug, Clone)]
pub enum Command {
    FetchInfo(String),
    Download(DownloadRequest, DownloadPurpose),
    Transform(TransformJob),
    Thumbnail(String),
}

#[derive(Debug, Clone)]
pub enum WorkerEvent {
    Info(Result<VideoInfo, GatewayError>),
    Downloaded(DownloadPurpose, Result<DownloadedFile, GatewayError>),
    Progress { job_id: u64, fraction: f32 },
    Transformed { job_id: u64, result: Result<Bytes, GatewayError> },
    Thumbnail(Result<Bytes, GatewayError>),
}

pub struct GatewayWorker {
    tx_commands: Sender<Command>,
    rx_events: Receiver<WorkerEvent>,
}

impl GatewayWorker {
    /// Spawn the worker thread and its runtime.
    pub fn start(gateway: Arc<dyn TransformGateway>, notify: Notify) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .thread_name("clipsmith-gateway")
            .build()
            .context("Failed to start async runtime")?;

        let (tx_commands, rx_commands) = unbounded::<Command>();
        let (tx_events, rx_events) = unbounded::<WorkerEvent>();

        thread::Builder::new()
            .name("clipsmith-worker".into())
            .spawn(move || {
                // Runs until the command sender is dropped with the app.
                while let Ok(command) = rx_commands.recv() {
                    let gateway = gateway.clone();
                    let events = EventSink {
                        tx: tx_events.clone(),
                        notify: notify.clone(),
                    };
                    runtime.spawn(run(gateway, command, events));
                }
                log::debug!("Worker stopping");
                runtime.shutdown_background();
            })
            .context("Failed to spawn worker thread")?;

        Ok(Self {
            tx_commands,
            rx_events,
        })
    }

    pub fn submit(&self, command: Command) {
        if self.tx_commands.send(command).is_err() {
            log::error!("Worker has stopped; command dropped");
        }
    }

    /// Events produced since the last call.
    pub fn drain(&self) -> Vec<WorkerEvent> {
        self.rx_events.try_iter().collect()
    }
}

#[derive(Clone)]
struct EventSink {
    tx: Sender<WorkerEvent>,
    notify: Notify,
}

impl EventSink {
    fn send(&self, event: WorkerEvent) {
        let _ = self.tx.send(event);
        (self.notify)();
    }
}

async fn run(gateway: Arc<dyn TransformGateway>, command: Command, events: EventSink) {
    match command {
        Command::FetchInfo(url) => {
            let result = gateway.fetch_info(&url).await;
            if let Err(e) = &result {
                log::error!("Info request for {} failed: {}", url, e);
            }
            events.send(WorkerEvent::Info(result));
        }
        Command::Download(request, purpose) => {
            let result = gateway.download(&request).await;
            if let Err(e) = &result {
                log::error!("Download of {} failed: {}", request.url, e);
            }
            events.send(WorkerEvent::Downloaded(purpose, result));
        }
        Command::Transform(job) => {
            let job_id = job.id;
            let sink = events.clone();
            let progress: ProgressFn = Arc::new(move |fraction| {
                sink.send(WorkerEvent::Progress { job_id, fraction });
            });
            let result = gateway.transform(job.input, progress).await;
            events.send(WorkerEvent::Transformed { job_id, result });
        }
        Command::Thumbnail(url) => {
            let result = gateway.fetch_bytes(&url).await;
            if let Err(e) = &result {
                log::warn!("Thumbnail {} unavailable: {}", url, e);
            }
            events.send(WorkerEvent::Thumbnail(result));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{TransformInput, TransformOp};
    use crate::session::TransformKind;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CannedGateway;

    #[async_trait]
    impl TransformGateway for CannedGateway {
        async fn fetch_info(&self, url: &str) -> Result<VideoInfo, GatewayError> {
            Ok(VideoInfo {
                title: format!("info for {url}"),
                duration: 42.0,
                thumbnail: None,
                formats: Vec::new(),
            })
        }

        async fn download(&self, _request: &DownloadRequest) -> Result<DownloadedFile, GatewayError> {
            Err(GatewayError::Server {
                status: 400,
                message: "URL is required".into(),
            })
        }

        async fn transform(
            &self,
            input: TransformInput,
            progress: ProgressFn,
        ) -> Result<Bytes, GatewayError> {
            progress(0.5);
            progress(1.0);
            Ok(input.video)
        }

        async fn fetch_bytes(&self, _url: &str) -> Result<Bytes, GatewayError> {
            Ok(Bytes::from_static(b"png"))
        }
    }

    fn worker() -> (GatewayWorker, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        let notify: Notify = Arc::new(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        (GatewayWorker::start(Arc::new(CannedGateway), notify).unwrap(), count)
    }

    fn next(worker: &GatewayWorker) -> WorkerEvent {
        worker
            .rx_events
            .recv_timeout(Duration::from_secs(5))
            .expect("worker event")
    }

    #[test]
    fn test_transform_reports_progress_then_result() {
        let (worker, notified) = worker();
        worker.submit(Command::Transform(TransformJob {
            id: 7,
            kind: TransformKind::Trim,
            input: TransformInput {
                video: Bytes::from_static(b"video"),
                title: "clip".into(),
                op: TransformOp::Trim { start: 0.0, end: 1.0 },
            },
        }));

        let mut fractions = Vec::new();
        loop {
            match next(&worker) {
                WorkerEvent::Progress { job_id: 7, fraction } => fractions.push(fraction),
                WorkerEvent::Transformed { job_id, result } => {
                    assert_eq!(job_id, 7);
                    assert_eq!(result.unwrap(), Bytes::from_static(b"video"));
                    break;
                }
                other => panic!("unexpected event {other:?}"),
            }
        }
        assert_eq!(fractions, [0.5, 1.0]);
        // The final notify may still be in flight; both progress ones are done.
        assert!(notified.load(Ordering::SeqCst) >= 2);
    }

    #[test]
    fn test_info_and_download_events() {
        let (worker, _) = worker();
        worker.submit(Command::FetchInfo("https://example.com/v".into()));
        match next(&worker) {
            WorkerEvent::Info(Ok(info)) => assert_eq!(info.duration, 42.0),
            other => panic!("unexpected event {other:?}"),
        }

        worker.submit(Command::Download(
            DownloadRequest {
                url: String::new(),
                format_id: "18".into(),
                audio_only: false,
            },
            DownloadPurpose::Edit(3),
        ));
        match next(&worker) {
            WorkerEvent::Downloaded(DownloadPurpose::Edit(3), Err(GatewayError::Server { status, .. })) => {
                assert_eq!(status, 400)
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(worker.drain().is_empty());
    }
}
