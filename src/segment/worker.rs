//! Long-lived segmentation worker.
//!
//! The pixel-level work runs on one dedicated thread that owns the image
//! analysis backend. Requests travel over a channel and the client takes
//! `&mut self`, so exactly one request is ever in flight.

use super::{SegmentRequest, Segmentation, ZoneSegmenter};
use crate::error::{Error, Result};
use crate::imaging::{ImageAnalysis, ImageprocBackend};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

/// Client handle to the segmentation thread.
pub struct SegmentationService {
    requests: Option<Sender<SegmentRequest>>,
    responses: Receiver<Result<Segmentation>>,
    handle: Option<JoinHandle<()>>,
}

impl SegmentationService {
    /// Start the worker with the given backend.
    pub fn spawn(segmenter: ZoneSegmenter, backend: Box<dyn ImageAnalysis>) -> Result<Self> {
        let (request_tx, request_rx) = unbounded::<SegmentRequest>();
        let (response_tx, response_rx) = unbounded();

        let handle = thread::Builder::new()
            .name("relayout-segmenter".to_string())
            .spawn(move || {
                for request in request_rx.iter() {
                    let page = request.page_index;
                    let result = catch_unwind(AssertUnwindSafe(|| {
                        segmenter.segment(backend.as_ref(), &request)
                    }))
                    .unwrap_or_else(|panic| {
                        Err(Error::Segmentation {
                            page,
                            message: panic_message(panic.as_ref()),
                        })
                    });
                    if response_tx.send(result).is_err() {
                        break;
                    }
                }
                log::debug!("Segmentation worker stopped");
            })?;

        Ok(Self {
            requests: Some(request_tx),
            responses: response_rx,
            handle: Some(handle),
        })
    }

    /// Start the worker with [`ImageprocBackend`].
    pub fn with_default_backend(segmenter: ZoneSegmenter) -> Result<Self> {
        Self::spawn(segmenter, Box::new(ImageprocBackend::new()))
    }

    /// Segment one page, blocking until the worker answers.
    pub fn segment(&mut self, request: SegmentRequest) -> Result<Segmentation> {
        let sender = self.requests.as_ref().ok_or(Error::WorkerDisconnected)?;
        sender
            .send(request)
            .map_err(|_| Error::WorkerDisconnected)?;
        self.responses
            .recv()
            .map_err(|_| Error::WorkerDisconnected)?
    }
}

impl Drop for SegmentationService {
    fn drop(&mut self) {
        // Closing the request channel ends the worker loop.
        self.requests.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl std::fmt::Debug for SegmentationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentationService")
            .field("running", &self.handle.is_some())
            .finish()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "image analysis panicked".to_string()
    }
}
