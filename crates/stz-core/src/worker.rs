//! Detector offload onto a dedicated thread
//!
//! The worker owns its `OnlineDetector` outright; producers only ever hand it
//! samples through a bounded queue, which is the single point where samples
//! are serialized before touching the window. Verdicts come back in arrival
//! order.

use crate::detector::{OnlineDetector, Verdict};
use crate::window::Sample;
use crossbeam_channel::{Receiver, Sender, TrySendError, bounded, unbounded};
use serde::{Deserialize, Serialize};
use std::thread;
use tracing::info;

/// A processed sample and its verdict
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub sample: Sample,
    pub verdict: Verdict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerError {
    /// The worker thread is gone
    Disconnected,
    /// The worker thread panicked
    Panicked,
}

impl std::fmt::Display for WorkerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Detector worker disconnected"),
            Self::Panicked => write!(f, "Detector worker panicked"),
        }
    }
}

impl std::error::Error for WorkerError {}

pub struct DetectorWorker {
    input: Option<Sender<Sample>>,
    output: Receiver<Outcome>,
    handle: Option<thread::JoinHandle<OnlineDetector>>,
}

impl DetectorWorker {
    /// Move `detector` onto its own thread behind a queue of `queue_capacity`
    pub fn spawn(detector: OnlineDetector, queue_capacity: usize) -> std::io::Result<Self> {
        let (input_tx, input_rx) = bounded::<Sample>(queue_capacity.max(1));
        let (output_tx, output_rx) = unbounded::<Outcome>();

        let handle = thread::Builder::new()
            .name("stz-detector".to_string())
            .spawn(move || {
                let mut detector = detector;
                info!(
                    window = detector.config().window_size,
                    "Detector worker active."
                );

                for sample in input_rx.iter() {
                    let verdict = detector.process(sample);
                    // Nobody listening is fine; the detector state still advances
                    let _ = output_tx.send(Outcome { sample, verdict });
                }

                info!(
                    processed = detector.stats().processed,
                    anomalies = detector.stats().anomalies,
                    "Detector worker stopped."
                );
                detector
            })?;

        Ok(Self {
            input: Some(input_tx),
            output: output_rx,
            handle: Some(handle),
        })
    }

    /// Queue a sample, blocking while the queue is full
    pub fn submit(&self, sample: Sample) -> Result<(), WorkerError> {
        let input = self.input.as_ref().ok_or(WorkerError::Disconnected)?;
        input.send(sample).map_err(|_| WorkerError::Disconnected)
    }

    /// Queue a sample without blocking; hands the sample back on backpressure
    pub fn try_submit(&self, sample: Sample) -> Result<(), Sample> {
        match self.input.as_ref() {
            Some(input) => input.try_send(sample).map_err(|e| match e {
                TrySendError::Full(s) | TrySendError::Disconnected(s) => s,
            }),
            None => Err(sample),
        }
    }

    /// Verdicts produced so far, in arrival order
    pub fn results(&self) -> &Receiver<Outcome> {
        &self.output
    }

    /// Close the queue, wait for it to drain and return the detector with any
    /// verdicts not yet received
    pub fn shutdown(mut self) -> Result<(OnlineDetector, Vec<Outcome>), WorkerError> {
        drop(self.input.take());

        let handle = self.handle.take().ok_or(WorkerError::Disconnected)?;
        let detector = handle.join().map_err(|_| WorkerError::Panicked)?;
        let remaining = self.output.try_iter().collect();

        Ok((detector, remaining))
    }
}

impl Drop for DetectorWorker {
    fn drop(&mut self) {
        drop(self.input.take());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
