//! Ordered, keyed collection of text segments and their generated audio

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::audio::RawAudio;
use crate::error::{Result, StudioError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentId(Uuid);

impl SegmentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SegmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SegmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One user-authored unit of text and its generated audio
#[derive(Debug, Clone)]
pub struct Segment {
    pub id: SegmentId,
    pub text: String,
    pub audio: Option<RawAudio>,
    pub generating: bool,
    pub error: Option<String>,
}

impl Segment {
    fn new(text: String) -> Self {
        Self {
            id: SegmentId::new(),
            text,
            audio: None,
            generating: false,
            error: None,
        }
    }

    pub fn has_audio(&self) -> bool {
        self.audio.is_some()
    }
}

/// A segment's audio captured for playback
#[derive(Debug, Clone)]
pub struct Clip {
    pub segment_id: SegmentId,
    pub audio: RawAudio,
}

#[derive(Debug, Clone, Default)]
pub struct Composition {
    segments: Vec<Segment>,
}

impl Composition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, text: impl Into<String>) -> SegmentId {
        let segment = Segment::new(text.into());
        let id = segment.id;
        self.segments.push(segment);
        id
    }

    /// Insert before `index`; indexes past the end append.
    pub fn insert_at(&mut self, index: usize, text: impl Into<String>) -> SegmentId {
        let segment = Segment::new(text.into());
        let id = segment.id;
        let index = index.min(self.segments.len());
        self.segments.insert(index, segment);
        id
    }

    pub fn remove(&mut self, id: SegmentId) -> Option<Segment> {
        let index = self.position(id)?;
        Some(self.segments.remove(index))
    }

    /// Replace the text. Audio and errors derived from the old text are
    /// dropped.
    pub fn set_text(&mut self, id: SegmentId, text: impl Into<String>) -> Result<()> {
        let segment = self.get_mut(id)?;
        segment.text = text.into();
        segment.audio = None;
        segment.error = None;
        Ok(())
    }

    pub fn set_audio(&mut self, id: SegmentId, audio: RawAudio) -> Result<()> {
        let segment = self.get_mut(id)?;
        segment.audio = Some(audio);
        segment.error = None;
        Ok(())
    }

    pub fn set_error(&mut self, id: SegmentId, error: impl Into<String>) -> Result<()> {
        let segment = self.get_mut(id)?;
        segment.error = Some(error.into());
        Ok(())
    }

    pub fn set_generating(&mut self, id: SegmentId, generating: bool) -> Result<()> {
        self.get_mut(id)?.generating = generating;
        Ok(())
    }

    pub fn get(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.iter().find(|s| s.id == id)
    }

    fn get_mut(&mut self, id: SegmentId) -> Result<&mut Segment> {
        self.segments
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(StudioError::SegmentNotFound(id))
    }

    pub fn position(&self, id: SegmentId) -> Option<usize> {
        self.segments.iter().position(|s| s.id == id)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn ids(&self) -> Vec<SegmentId> {
        self.segments.iter().map(|s| s.id).collect()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn clip(&self, id: SegmentId) -> Result<Clip> {
        let segment = self.get(id).ok_or(StudioError::SegmentNotFound(id))?;
        let audio = segment.audio.clone().ok_or(StudioError::NoAudio(id))?;
        Ok(Clip {
            segment_id: id,
            audio,
        })
    }

    /// Snapshot of every segment with audio, in composition order
    pub fn playable_clips(&self) -> Vec<Clip> {
        self.segments
            .iter()
            .filter_map(|s| {
                s.audio.clone().map(|audio| Clip {
                    segment_id: s.id,
                    audio,
                })
            })
            .collect()
    }
}
