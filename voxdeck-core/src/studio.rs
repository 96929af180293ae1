//! The studio ties a composition to a speech engine, a playback sequencer and
//! export. Front ends drive it and listen to its [`StudioEvent`]s.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::audio::wav::ContainerBlob;
use crate::audio::PcmFormat;
use crate::composition::{Composition, SegmentId};
use crate::error::{Result, StudioError};
use crate::events::{EventSender, StudioEvent};
use crate::export::{self, ArchiveEntry, ArchiveWriter};
use crate::playback::{ClipOutput, PlaybackOutcome, PlaybackSequencer};
use crate::settings::{GlobalAudioSettings, Settings};
use crate::speech::{SynthesisRequest, TextToSpeech};

/// What `generate_all` did with each segment
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    pub succeeded: Vec<SegmentId>,
    pub failed: Vec<(SegmentId, String)>,
    /// Segments with blank text
    pub skipped: Vec<SegmentId>,
}

impl GenerationReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct Studio {
    composition: Composition,
    speech: Arc<dyn TextToSpeech>,
    audio_settings: GlobalAudioSettings,
    format: PcmFormat,
    sequencer: PlaybackSequencer,
    events: EventSender,
}

impl Studio {
    pub fn new(
        speech: Arc<dyn TextToSpeech>,
        output: Arc<dyn ClipOutput>,
        settings: &Settings,
        events: EventSender,
    ) -> Self {
        let format = settings.pcm_format();
        Self {
            composition: Composition::new(),
            speech,
            audio_settings: settings.audio.clone(),
            format,
            sequencer: PlaybackSequencer::new(output, format, events.clone()),
            events,
        }
    }

    pub fn composition(&self) -> &Composition {
        &self.composition
    }

    pub fn format(&self) -> PcmFormat {
        self.format
    }

    /// A handle that can stop playback while a `play_all` is being awaited
    pub fn sequencer(&self) -> PlaybackSequencer {
        self.sequencer.clone()
    }

    pub fn audio_settings(&self) -> &GlobalAudioSettings {
        &self.audio_settings
    }

    pub fn set_audio_settings(&mut self, settings: GlobalAudioSettings) -> Result<()> {
        settings
            .validate()
            .map_err(|e| StudioError::MalformedInput(e.to_string()))?;
        self.audio_settings = settings;
        Ok(())
    }

    pub fn add_segment(&mut self, text: impl Into<String>) -> SegmentId {
        self.composition.push(text)
    }

    pub fn insert_segment(&mut self, index: usize, text: impl Into<String>) -> SegmentId {
        self.composition.insert_at(index, text)
    }

    pub fn remove_segment(&mut self, id: SegmentId) -> Result<()> {
        if self.sequencer.is_playing(id) {
            self.sequencer.stop_all();
        }
        self.composition
            .remove(id)
            .map(|_| ())
            .ok_or(StudioError::SegmentNotFound(id))
    }

    /// Replace a segment's text, dropping audio generated from the old text
    pub fn edit_segment(&mut self, id: SegmentId, text: impl Into<String>) -> Result<()> {
        self.composition.set_text(id, text)?;
        if self.sequencer.is_playing(id) {
            self.sequencer.stop_all();
        }
        Ok(())
    }

    /// Generate audio for one segment. Failures are recorded on the segment
    /// and returned; there are no retries.
    pub async fn generate_segment(&mut self, id: SegmentId) -> Result<()> {
        let text = self
            .composition
            .get(id)
            .ok_or(StudioError::SegmentNotFound(id))?
            .text
            .clone();
        let request = SynthesisRequest::new(text, self.audio_settings.clone());

        self.composition.set_generating(id, true)?;
        self.events
            .send(StudioEvent::GenerationStarted { segment_id: id });
        info!(segment_id = %id, "generating segment");

        let result = match self.speech.synthesize(&request).await {
            Ok(audio) if audio.is_empty() => Err(StudioError::EmptyResult),
            Ok(audio) => Ok(audio),
            Err(e) => Err(StudioError::Generation(e)),
        };

        self.composition.set_generating(id, false)?;
        match result {
            Ok(audio) => {
                let bytes = audio.len();
                self.composition.set_audio(id, audio)?;
                self.events.send(StudioEvent::GenerationSucceeded {
                    segment_id: id,
                    bytes,
                });
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                warn!(segment_id = %id, error = %message, "generation failed");
                self.composition.set_error(id, message.clone())?;
                self.events.send(StudioEvent::GenerationFailed {
                    segment_id: id,
                    error: message,
                });
                Err(e)
            }
        }
    }

    /// Generate every segment in order, one request at a time. A failure is
    /// recorded and generation moves on to the next segment.
    pub async fn generate_all(&mut self) -> GenerationReport {
        let mut report = GenerationReport::default();

        for id in self.composition.ids() {
            let blank = self
                .composition
                .get(id)
                .is_some_and(|s| s.text.trim().is_empty());
            if blank {
                report.skipped.push(id);
                continue;
            }

            match self.generate_segment(id).await {
                Ok(()) => report.succeeded.push(id),
                Err(e) => report.failed.push((id, e.to_string())),
            }
        }

        info!(
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            skipped = report.skipped.len(),
            "generation finished"
        );
        report
    }

    pub async fn play_segment(&self, id: SegmentId) -> Result<()> {
        let clip = self.composition.clip(id)?;
        self.sequencer.play_one(clip).await
    }

    /// Play every segment with audio in composition order, or stop if a
    /// sequence is already running
    pub async fn play_all(&self) -> Result<PlaybackOutcome> {
        self.sequencer
            .play_all(self.composition.playable_clips())
            .await
    }

    pub fn stop_all(&self) {
        self.sequencer.stop_all();
    }

    pub fn segment_wav(&self, id: SegmentId) -> Result<ContainerBlob> {
        export::segment_wav(&self.composition, id, self.format.sample_rate)
    }

    pub fn full_track(&self) -> ContainerBlob {
        export::full_track(&self.composition, self.format.sample_rate)
    }

    pub fn archive_entries(&self) -> Vec<ArchiveEntry> {
        export::archive_entries(&self.composition, self.format.sample_rate)
    }

    pub async fn export_archive(&self, writer: &dyn ArchiveWriter) -> anyhow::Result<PathBuf> {
        let entries = self.archive_entries();
        let path = writer.write(&entries).await?;
        self.events.send(StudioEvent::Exported {
            path: path.clone(),
            entries: entries.len(),
        });
        Ok(path)
    }
}
