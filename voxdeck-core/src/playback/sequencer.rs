//! Single-clip and sequential playback with stop-then-start semantics
//!
//! The sequencer owns at most one active [`ClipHandle`]. Every call that
//! starts or stops playback bumps an epoch; a play task that wakes up to a
//! different epoch than the one it started under has been superseded and
//! exits without touching the output again.

use chrono::Utc;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use strum::Display;
use tracing::{debug, info, warn};

use super::output::{ClipHandle, ClipOutput};
use crate::audio::decode::decode_for_playback;
use crate::audio::PcmFormat;
use crate::composition::{Clip, SegmentId};
use crate::error::{Result, StudioError};
use crate::events::{EventSender, StudioEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    Idle,
    PlayingOne(SegmentId),
    /// Index into the clip list the running sequence was started with
    PlayingAll(usize),
}

impl fmt::Display for SequencerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequencerState::Idle => write!(f, "Idle"),
            SequencerState::PlayingOne(id) => write!(f, "PlayingOne({id})"),
            SequencerState::PlayingAll(index) => write!(f, "PlayingAll({index})"),
        }
    }
}

/// How a call to [`PlaybackSequencer::play_all`] ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum PlaybackOutcome {
    /// Every clip played to its natural end
    Completed,
    /// Playback was stopped or superseded before the end
    Stopped,
}

struct ActiveClip {
    segment_id: SegmentId,
    handle: Arc<dyn ClipHandle>,
}

struct Inner {
    state: SequencerState,
    active: Option<ActiveClip>,
    epoch: u64,
}

#[derive(Clone)]
pub struct PlaybackSequencer {
    output: Arc<dyn ClipOutput>,
    format: PcmFormat,
    events: EventSender,
    inner: Arc<Mutex<Inner>>,
}

impl PlaybackSequencer {
    pub fn new(output: Arc<dyn ClipOutput>, format: PcmFormat, events: EventSender) -> Self {
        Self {
            output,
            format,
            events,
            inner: Arc::new(Mutex::new(Inner {
                state: SequencerState::Idle,
                active: None,
                epoch: 0,
            })),
        }
    }

    pub fn state(&self) -> SequencerState {
        self.lock().state
    }

    /// The segment whose clip is currently audible
    pub fn playing_segment(&self) -> Option<SegmentId> {
        self.lock().active.as_ref().map(|a| a.segment_id)
    }

    pub fn is_playing(&self, segment_id: SegmentId) -> bool {
        self.playing_segment() == Some(segment_id)
    }

    /// Stop whatever is playing, then play `clip`. Returns once the clip has
    /// started; natural completion returns the sequencer to `Idle`. A request
    /// superseded while its clip is still decoding returns without starting.
    pub async fn play_one(&self, clip: Clip) -> Result<()> {
        let segment_id = clip.segment_id;
        let epoch = {
            let mut inner = self.lock();
            inner.epoch += 1;
            self.halt_active(&mut inner);
            inner.state = SequencerState::PlayingOne(segment_id);
            inner.epoch
        };

        let audio = match decode_for_playback(clip.audio, self.format).await {
            Ok(audio) => audio,
            Err(e) => {
                self.reset_if_current(epoch);
                return Err(e);
            }
        };

        let handle = {
            let mut inner = self.lock();
            if inner.epoch != epoch {
                debug!(%segment_id, "superseded while decoding");
                return Ok(());
            }

            let handle = match self.output.start(audio) {
                Ok(handle) => Arc::<dyn ClipHandle>::from(handle),
                Err(e) => {
                    inner.state = SequencerState::Idle;
                    return Err(StudioError::Playback(e));
                }
            };
            inner.active = Some(ActiveClip {
                segment_id,
                handle: handle.clone(),
            });
            handle
        };

        info!(%segment_id, "playing segment");
        self.send_started(segment_id);

        let sequencer = self.clone();
        tokio::spawn(async move {
            handle.wait().await;
            sequencer.finish_clip(epoch, segment_id);
        });

        Ok(())
    }

    /// Play `clips` back to back, awaiting each one's natural end. Calling
    /// this while a sequence is running stops it instead.
    pub async fn play_all(&self, clips: Vec<Clip>) -> Result<PlaybackOutcome> {
        let epoch = {
            let mut inner = self.lock();
            inner.epoch += 1;
            let toggled_off = matches!(inner.state, SequencerState::PlayingAll(_));
            self.halt_active(&mut inner);
            inner.state = SequencerState::Idle;
            if toggled_off {
                info!("sequence toggled off");
                return Ok(PlaybackOutcome::Stopped);
            }
            if !clips.is_empty() {
                inner.state = SequencerState::PlayingAll(0);
            }
            inner.epoch
        };

        info!(clips = clips.len(), "playing sequence");

        for (index, clip) in clips.into_iter().enumerate() {
            let segment_id = clip.segment_id;
            let audio = match decode_for_playback(clip.audio, self.format).await {
                Ok(audio) => audio,
                Err(e) => {
                    self.reset_if_current(epoch);
                    return Err(e);
                }
            };

            let handle = {
                let mut inner = self.lock();
                if inner.epoch != epoch {
                    debug!(index, "sequence superseded before clip start");
                    return Ok(PlaybackOutcome::Stopped);
                }
                let handle = match self.output.start(audio) {
                    Ok(handle) => Arc::<dyn ClipHandle>::from(handle),
                    Err(e) => {
                        inner.state = SequencerState::Idle;
                        return Err(StudioError::Playback(e));
                    }
                };
                inner.active = Some(ActiveClip {
                    segment_id,
                    handle: handle.clone(),
                });
                inner.state = SequencerState::PlayingAll(index);
                handle
            };

            self.send_started(segment_id);
            handle.wait().await;

            let mut inner = self.lock();
            if inner.epoch != epoch {
                debug!(index, "sequence stopped during clip");
                return Ok(PlaybackOutcome::Stopped);
            }
            inner.active = None;
            self.events
                .send(StudioEvent::PlaybackFinished { segment_id });
        }

        let mut inner = self.lock();
        if inner.epoch == epoch {
            inner.state = SequencerState::Idle;
        }
        Ok(PlaybackOutcome::Completed)
    }

    /// Halt any playback and return to `Idle`. Safe to call at any time.
    pub fn stop_all(&self) {
        let mut inner = self.lock();
        inner.epoch += 1;
        self.halt_active(&mut inner);
        inner.state = SequencerState::Idle;
    }

    /// Back to `Idle` after a failed request, unless a newer one took over
    fn reset_if_current(&self, epoch: u64) {
        let mut inner = self.lock();
        if inner.epoch == epoch {
            inner.active = None;
            inner.state = SequencerState::Idle;
        }
    }

    fn finish_clip(&self, epoch: u64, segment_id: SegmentId) {
        let mut inner = self.lock();
        if inner.epoch != epoch {
            return;
        }
        inner.active = None;
        inner.state = SequencerState::Idle;
        debug!(%segment_id, "clip finished");
        self.events
            .send(StudioEvent::PlaybackFinished { segment_id });
    }

    fn halt_active(&self, inner: &mut Inner) {
        if let Some(active) = inner.active.take() {
            active.handle.stop();
            info!(segment_id = %active.segment_id, "stopped playback");
            self.events.send(StudioEvent::PlaybackStopped {
                segment_id: active.segment_id,
            });
        }
    }

    fn send_started(&self, segment_id: SegmentId) {
        self.events.send(StudioEvent::PlaybackStarted {
            segment_id,
            timestamp: Utc::now().timestamp_millis() as u64,
        });
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| {
            warn!("sequencer lock poisoned, recovering");
            e.into_inner()
        })
    }
}
