use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::thread;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use rodio::{OutputStream, OutputStreamBuilder, Sink};
use tracing::{debug, info, warn};

use crate::error::EngineError;

use super::queue::following;
use super::sink::create_sink;
use super::types::{EngineCmd, EngineState, EngineStatus, QueueItem};

/// State owned by the engine thread: the output stream, the queue and the
/// sink of the loaded entry.
struct EngineThread {
    stream: Option<OutputStream>,
    queue: Vec<QueueItem>,
    index: Option<usize>,
    sink: Option<Sink>,
    paused: bool,
    ended: bool,
    // Track start time and accumulated elapsed when paused.
    started_at: Option<Instant>,
    accumulated: Duration,
}

pub(super) fn spawn_engine_thread(rx: Receiver<EngineCmd>) -> JoinHandle<()> {
    thread::spawn(move || {
        let stream = match OutputStreamBuilder::open_default_stream() {
            Ok(mut stream) => {
                // rodio logs to stderr when the stream is dropped, which would land on the TUI.
                stream.log_on_drop(false);
                Some(stream)
            }
            Err(e) => {
                warn!(error = %e, "no audio output device, playback disabled");
                None
            }
        };

        let mut engine = EngineThread {
            stream,
            queue: Vec::new(),
            index: None,
            sink: None,
            paused: true,
            ended: false,
            started_at: None,
            accumulated: Duration::ZERO,
        };

        loop {
            match rx.recv_timeout(Duration::from_millis(200)) {
                Ok(EngineCmd::Quit) => {
                    engine.unload();
                    debug!("engine thread quitting");
                    break;
                }
                Ok(cmd) => engine.handle(cmd),
                Err(RecvTimeoutError::Timeout) => engine.advance_if_finished(),
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    })
}

impl EngineThread {
    fn handle(&mut self, cmd: EngineCmd) {
        // A dropped reply receiver only means the caller gave up waiting.
        match cmd {
            EngineCmd::Reset(reply) => {
                let _ = reply.send(self.reset());
            }
            EngineCmd::Enqueue(items, reply) => {
                let _ = reply.send(self.enqueue(items));
            }
            EngineCmd::SkipTo(i, reply) => {
                let _ = reply.send(self.skip_to(i));
            }
            EngineCmd::Play(reply) => {
                let _ = reply.send(self.play());
            }
            EngineCmd::Pause(reply) => {
                let _ = reply.send(self.pause());
            }
            EngineCmd::State(reply) => {
                let _ = reply.send(Ok(self.state()));
            }
            EngineCmd::Quit => {}
        }
    }

    fn require_output(&self) -> Result<&OutputStream, EngineError> {
        self.stream.as_ref().ok_or(EngineError::NoOutputDevice)
    }

    fn reset(&mut self) -> Result<(), EngineError> {
        self.require_output()?;
        self.unload();
        self.queue.clear();
        self.index = None;
        self.ended = false;
        Ok(())
    }

    fn enqueue(&mut self, items: Vec<QueueItem>) -> Result<(), EngineError> {
        self.require_output()?;
        debug!(added = items.len(), "enqueue");
        self.queue.extend(items);
        Ok(())
    }

    fn skip_to(&mut self, i: usize) -> Result<(), EngineError> {
        self.require_output()?;
        if i >= self.queue.len() {
            return Err(EngineError::OutOfRange {
                index: i,
                len: self.queue.len(),
            });
        }
        let was_playing = self.sink.is_some() && !self.paused;
        self.load(i)?;
        if was_playing {
            self.resume();
        }
        Ok(())
    }

    fn play(&mut self) -> Result<(), EngineError> {
        self.require_output()?;
        if self.queue.is_empty() {
            return Err(EngineError::EmptyQueue);
        }
        if self.sink.is_none() {
            self.load(self.index.unwrap_or(0))?;
        }
        if self.paused {
            self.resume();
        }
        Ok(())
    }

    fn pause(&mut self) -> Result<(), EngineError> {
        self.require_output()?;
        if let Some(sink) = self.sink.as_ref() {
            if !self.paused {
                sink.pause();
                if let Some(st) = self.started_at.take() {
                    self.accumulated += st.elapsed();
                }
                self.paused = true;
            }
        }
        Ok(())
    }

    fn state(&self) -> EngineState {
        let status = if self.ended {
            EngineStatus::Ended
        } else if self.sink.is_none() {
            EngineStatus::Idle
        } else if self.paused {
            EngineStatus::Paused
        } else {
            EngineStatus::Playing
        };
        EngineState {
            status,
            index: self.index,
            elapsed: self.accumulated + self.started_at.map_or(Duration::ZERO, |st| st.elapsed()),
        }
    }

    /// Replace the loaded entry with queue position `i`, paused at its start.
    fn load(&mut self, i: usize) -> Result<(), EngineError> {
        let stream = self.require_output()?;
        let item = &self.queue[i];
        let sink = create_sink(stream, &item.path)?;
        info!(
            id = %item.id,
            title = %item.title,
            artist = %item.artist,
            album = %item.album,
            artwork = item.artwork.is_some(),
            "now playing"
        );
        debug!(index = i, url = %item.url, "loaded");

        self.unload();
        self.sink = Some(sink);
        self.index = Some(i);
        self.ended = false;
        Ok(())
    }

    fn resume(&mut self) {
        if let Some(sink) = self.sink.as_ref() {
            sink.play();
            self.paused = false;
            self.started_at = Some(Instant::now());
        }
    }

    fn unload(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.paused = true;
        self.started_at = None;
        self.accumulated = Duration::ZERO;
    }

    /// Move on to the next entry once the current one has drained.
    fn advance_if_finished(&mut self) {
        let drained = !self.paused && self.sink.as_ref().is_some_and(|s| s.empty());
        if !drained {
            return;
        }

        match following(self.index, self.queue.len()) {
            Some(next) => match self.load(next) {
                Ok(()) => self.resume(),
                Err(e) => {
                    warn!(index = next, error = %e, "cannot advance, stopping");
                    self.unload();
                    self.ended = true;
                }
            },
            None => {
                debug!("end of queue");
                self.unload();
                self.ended = true;
            }
        }
    }
}
