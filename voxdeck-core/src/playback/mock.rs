use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

use super::output::{ClipHandle, ClipOutput};
use crate::audio::decode::DecodedAudio;

/// How clips handed to [`MockOutput`] reach their end
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MockPlayback {
    /// Clips play until `finish` or `stop` is called
    #[default]
    Manual,
    /// Clips end as soon as they start
    Immediate,
}

/// What the mock output observed, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputEvent {
    Started {
        clip: usize,
        frames: usize,
        sample_rate: u32,
    },
    Stopped {
        clip: usize,
    },
    Finished {
        clip: usize,
    },
}

/// Output device stand-in for tests and headless runs
#[derive(Clone)]
pub struct MockOutput {
    mode: MockPlayback,
    log: Arc<Mutex<Vec<OutputEvent>>>,
    clips: Arc<Mutex<Vec<Arc<watch::Sender<bool>>>>>,
    started: Arc<watch::Sender<usize>>,
    fail_next: Arc<AtomicBool>,
}

impl MockOutput {
    pub fn new(mode: MockPlayback) -> Self {
        let (started, _) = watch::channel(0);
        Self {
            mode,
            log: Arc::new(Mutex::new(Vec::new())),
            clips: Arc::new(Mutex::new(Vec::new())),
            started: Arc::new(started),
            fail_next: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn events(&self) -> Vec<OutputEvent> {
        self.log.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn started_count(&self) -> usize {
        *self.started.borrow()
    }

    /// Wait until at least `count` clips have been started
    pub async fn wait_for_starts(&self, count: usize) {
        let mut rx = self.started.subscribe();
        loop {
            if *rx.borrow_and_update() >= count {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// Let clip `clip` reach its natural end
    pub fn finish(&self, clip: usize) {
        let done = {
            let clips = self.clips.lock().unwrap_or_else(|e| e.into_inner());
            clips.get(clip).cloned()
        };
        if let Some(done) = done {
            mark_done(&done, &self.log, OutputEvent::Finished { clip });
        }
    }

    /// Make the next `start` fail, as an unplugged device would
    pub fn fail_next_start(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

impl ClipOutput for MockOutput {
    fn start(&self, audio: DecodedAudio) -> Result<Box<dyn ClipHandle>> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(anyhow!("mock output device unavailable"));
        }

        let (done, _) = watch::channel(false);
        let done = Arc::new(done);
        let clip = {
            let mut clips = self.clips.lock().unwrap_or_else(|e| e.into_inner());
            clips.push(done.clone());
            clips.len() - 1
        };

        self.log
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(OutputEvent::Started {
                clip,
                frames: audio.frame_count(),
                sample_rate: audio.sample_rate,
            });
        self.started.send_modify(|count| *count += 1);

        if self.mode == MockPlayback::Immediate {
            mark_done(&done, &self.log, OutputEvent::Finished { clip });
        }

        Ok(Box::new(MockClip {
            clip,
            done,
            log: self.log.clone(),
        }))
    }
}

fn mark_done(done: &watch::Sender<bool>, log: &Mutex<Vec<OutputEvent>>, event: OutputEvent) {
    if *done.borrow() {
        return;
    }
    log.lock().unwrap_or_else(|e| e.into_inner()).push(event);
    done.send_replace(true);
}

struct MockClip {
    clip: usize,
    done: Arc<watch::Sender<bool>>,
    log: Arc<Mutex<Vec<OutputEvent>>>,
}

#[async_trait]
impl ClipHandle for MockClip {
    fn stop(&self) {
        mark_done(&self.done, &self.log, OutputEvent::Stopped { clip: self.clip });
    }

    fn is_finished(&self) -> bool {
        *self.done.borrow()
    }

    async fn wait(&self) {
        let mut rx = self.done.subscribe();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}
