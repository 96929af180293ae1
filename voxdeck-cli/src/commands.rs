use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use voxdeck_core::audio::concat::concatenate;
use voxdeck_core::audio::wav::create_container;
use voxdeck_core::audio::{codec, RawAudio};
use voxdeck_core::composition::SegmentId;
use voxdeck_core::events::EventSender;
use voxdeck_core::export::{self, DirectoryArchive, FULL_TRACK_FILE_NAME};
use voxdeck_core::playback::ClipOutput;
use voxdeck_core::settings::{Settings, SettingsManager};
use voxdeck_core::speech::create_provider;
use voxdeck_core::studio::{GenerationReport, Studio};

pub fn load_settings(path: Option<PathBuf>) -> Result<Settings> {
    let manager = match path {
        Some(path) => SettingsManager::from_path(path)?,
        None => SettingsManager::new()?,
    };
    let settings = manager.settings();
    settings
        .validate()
        .with_context(|| format!("Invalid settings in {:?}", manager.path()))?;
    Ok(settings)
}

async fn read(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {path:?}"))
}

pub async fn frame(input: &Path, output: &Path, sample_rate: u32) -> Result<()> {
    let payload = read(input).await?;
    let blob = create_container(&payload, sample_rate);
    export::write_container(output, &blob).await?;
    println!("{} ({} bytes)", output.display(), blob.len());
    Ok(())
}

pub async fn concat(inputs: &[PathBuf], output: &Path, sample_rate: u32) -> Result<()> {
    let mut buffers = Vec::with_capacity(inputs.len());
    for input in inputs {
        buffers.push(RawAudio::from(read(input).await?));
    }

    let track = concatenate(buffers.iter().map(Some));
    let blob = create_container(&track, sample_rate);
    export::write_container(output, &blob).await?;
    println!(
        "{} ({} inputs, {} bytes)",
        output.display(),
        inputs.len(),
        blob.len()
    );
    Ok(())
}

pub async fn encode(input: &Path) -> Result<()> {
    println!("{}", codec::encode(&read(input).await?));
    Ok(())
}

pub async fn decode(input: &Path, output: &Path) -> Result<()> {
    let text = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("Failed to read {input:?}"))?;
    let bytes =
        codec::decode(text.trim()).with_context(|| format!("{input:?} is not valid base64"))?;
    tokio::fs::write(output, &bytes)
        .await
        .with_context(|| format!("Failed to write {output:?}"))?;
    println!("{} ({} bytes)", output.display(), bytes.len());
    Ok(())
}

/// One segment per non-blank line
fn parse_script(script: &str) -> Vec<String> {
    script
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// One `[n/total] status` line per segment, in script order
fn report_lines(report: &GenerationReport, ids: &[SegmentId]) -> Vec<String> {
    let total = ids.len();
    ids.iter()
        .enumerate()
        .map(|(index, id)| {
            let status = if let Some((_, error)) = report.failed.iter().find(|(f, _)| f == id) {
                warn!(segment = index + 1, error = %error, "segment failed");
                format!("failed: {error}")
            } else if report.skipped.contains(id) {
                "skipped".to_string()
            } else {
                "ok".to_string()
            };
            format!("[{}/{total}] {status}", index + 1)
        })
        .collect()
}

fn clip_output(play: bool) -> Result<Arc<dyn ClipOutput>> {
    #[cfg(feature = "device")]
    if play {
        return Ok(Arc::new(voxdeck_core::audio::device::DeviceOutput::new()));
    }

    if play {
        bail!("playback requires a build with the `device` feature");
    }
    Ok(Arc::new(voxdeck_core::playback::MockOutput::new(
        voxdeck_core::playback::MockPlayback::Immediate,
    )))
}

pub async fn render(
    settings: &Settings,
    script: &Path,
    out_dir: Option<PathBuf>,
    play: bool,
) -> Result<()> {
    let text = tokio::fs::read_to_string(script)
        .await
        .with_context(|| format!("Failed to read script {script:?}"))?;
    let lines = parse_script(&text);
    if lines.is_empty() {
        bail!("{script:?} has no text to render");
    }

    let out_dir = out_dir
        .or_else(|| settings.export.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));

    let mut studio = Studio::new(
        create_provider(&settings.provider),
        clip_output(play)?,
        settings,
        EventSender::detached(),
    );
    let ids: Vec<_> = lines.iter().map(|line| studio.add_segment(line)).collect();

    info!(segments = ids.len(), ?out_dir, "rendering script");
    let report = studio.generate_all().await;
    for line in report_lines(&report, &ids) {
        println!("{line}");
    }

    let writer = DirectoryArchive::new(&out_dir);
    let path = studio.export_archive(&writer).await?;
    export::write_container(&path.join(FULL_TRACK_FILE_NAME), &studio.full_track()).await?;
    println!(
        "Wrote {} segment files and {FULL_TRACK_FILE_NAME} to {}",
        studio.archive_entries().len(),
        path.display()
    );

    if play {
        let outcome = studio.play_all().await?;
        println!("Playback {outcome}");
    }

    if !report.is_success() {
        bail!(
            "{} of {} segments failed to generate",
            report.failed.len(),
            ids.len()
        );
    }
    Ok(())
}

pub async fn voices(settings: &Settings) -> Result<()> {
    let provider = create_provider(&settings.provider);
    let voices = provider.list_voices().await?;
    println!("{}", serde_json::to_string_pretty(&voices)?);
    Ok(())
}
