use std::sync::Mutex;
use std::sync::mpsc::{self, Sender};
use std::thread::JoinHandle;

use crate::error::EngineError;

use super::engine::MediaEngine;
use super::thread::spawn_engine_thread;
use super::types::{EngineCmd, EngineState, QueueItem, Reply};

/// Handle to the `rodio` engine thread.
///
/// Every call waits for the thread's answer, so commands are applied in the
/// order they are issued.
pub struct RodioEngine {
    tx: Sender<EngineCmd>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl RodioEngine {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel::<EngineCmd>();
        let handle = spawn_engine_thread(rx);

        Self {
            tx,
            join: Mutex::new(Some(handle)),
        }
    }

    fn request<T>(&self, make: impl FnOnce(Reply<T>) -> EngineCmd) -> Result<T, EngineError> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.tx
            .send(make(reply_tx))
            .map_err(|_| EngineError::Disconnected)?;
        reply_rx.recv().map_err(|_| EngineError::Disconnected)?
    }

    /// Stop playback and wait for the engine thread to exit.
    pub fn shutdown(&self) {
        let _ = self.tx.send(EngineCmd::Quit);

        if let Ok(mut j) = self.join.lock() {
            if let Some(h) = j.take() {
                let _ = h.join();
            }
        }
    }
}

impl Drop for RodioEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl MediaEngine for RodioEngine {
    fn reset(&self) -> Result<(), EngineError> {
        self.request(EngineCmd::Reset)
    }

    fn enqueue(&self, items: Vec<QueueItem>) -> Result<(), EngineError> {
        self.request(|reply| EngineCmd::Enqueue(items, reply))
    }

    fn skip_to(&self, index: usize) -> Result<(), EngineError> {
        self.request(|reply| EngineCmd::SkipTo(index, reply))
    }

    fn play(&self) -> Result<(), EngineError> {
        self.request(EngineCmd::Play)
    }

    fn pause(&self) -> Result<(), EngineError> {
        self.request(EngineCmd::Pause)
    }

    fn state(&self) -> Result<EngineState, EngineError> {
        self.request(EngineCmd::State)
    }
}
