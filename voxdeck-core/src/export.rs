//! Per-segment containers, the full-track container and archive packaging

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::audio::concat::concatenate_to_single_wav;
use crate::audio::wav::{create_container, ContainerBlob};
use crate::composition::{Composition, SegmentId};
use crate::error::StudioError;

pub const FULL_TRACK_FILE_NAME: &str = "full_track.wav";

/// One named file destined for an archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub file_name: String,
    pub blob: ContainerBlob,
}

/// `segment_<n>.wav`, `n` being the 1-based position in the composition
pub fn segment_file_name(position: usize) -> String {
    format!("segment_{}.wav", position + 1)
}

/// Frame one segment's audio on its own
pub fn segment_wav(
    composition: &Composition,
    id: SegmentId,
    sample_rate: u32,
) -> crate::error::Result<ContainerBlob> {
    let segment = composition
        .get(id)
        .ok_or(StudioError::SegmentNotFound(id))?;
    let audio = segment.audio.as_ref().ok_or(StudioError::NoAudio(id))?;
    Ok(create_container(audio, sample_rate))
}

pub fn full_track(composition: &Composition, sample_rate: u32) -> ContainerBlob {
    concatenate_to_single_wav(composition.segments(), sample_rate)
}

/// One entry per segment with audio, named by composition position.
/// Segments without audio are skipped, so names may have gaps.
pub fn archive_entries(composition: &Composition, sample_rate: u32) -> Vec<ArchiveEntry> {
    composition
        .segments()
        .iter()
        .enumerate()
        .filter_map(|(position, segment)| {
            segment.audio.as_ref().map(|audio| ArchiveEntry {
                file_name: segment_file_name(position),
                blob: create_container(audio, sample_rate),
            })
        })
        .collect()
}

/// Destination for a set of archive entries
#[async_trait]
pub trait ArchiveWriter: Send + Sync {
    /// Write every entry and return where they ended up
    async fn write(&self, entries: &[ArchiveEntry]) -> Result<PathBuf>;
}

/// Writes entries as plain files in a directory
pub struct DirectoryArchive {
    root: PathBuf,
}

impl DirectoryArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ArchiveWriter for DirectoryArchive {
    async fn write(&self, entries: &[ArchiveEntry]) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("Failed to create directory: {:?}", self.root))?;

        for entry in entries {
            write_container(&self.root.join(&entry.file_name), &entry.blob).await?;
        }

        info!(root = ?self.root, entries = entries.len(), "wrote archive");
        Ok(self.root.clone())
    }
}

pub async fn write_container(path: &Path, blob: &ContainerBlob) -> Result<()> {
    tokio::fs::write(path, blob.as_bytes())
        .await
        .with_context(|| format!("Failed to write {path:?}"))
}
