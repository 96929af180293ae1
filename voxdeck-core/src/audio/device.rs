//! Audio playback using cpal
//! Resamples from the clip's rate to the native device rate if needed

use anyhow::{Context, Result};
use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, SampleFormat, SizedSample, Stream, StreamConfig};
use rubato::{FftFixedIn, Resampler};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;
use tracing::{debug, error};

use super::decode::DecodedAudio;
use crate::playback::{ClipHandle, ClipOutput};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Plays clips on the default output device. Each clip gets its own stream,
/// owned by a dedicated thread since cpal streams cannot cross threads.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeviceOutput;

impl DeviceOutput {
    pub fn new() -> Self {
        Self
    }
}

/// Playback handle. Dropping it or calling `stop` silences the stream.
struct DeviceClip {
    finished: Arc<AtomicBool>,
    stopped: Arc<AtomicBool>,
    stop_tx: Mutex<Option<mpsc::Sender<()>>>,
}

#[async_trait]
impl ClipHandle for DeviceClip {
    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        let sender = self
            .stop_tx
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(sender) = sender {
            let _ = sender.send(());
        }
    }

    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst) || self.stopped.load(Ordering::SeqCst)
    }

    async fn wait(&self) {
        while !self.is_finished() {
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

impl Drop for DeviceClip {
    fn drop(&mut self) {
        self.stop();
    }
}

impl ClipOutput for DeviceOutput {
    fn start(&self, audio: DecodedAudio) -> Result<Box<dyn ClipHandle>> {
        let finished = Arc::new(AtomicBool::new(false));
        let stopped = Arc::new(AtomicBool::new(false));
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<()>>();

        let thread_finished = finished.clone();
        let thread_stopped = stopped.clone();
        std::thread::Builder::new()
            .name("voxdeck-playback".to_string())
            .spawn(move || {
                let stream = match open_stream(&audio, thread_finished.clone(), thread_stopped) {
                    Ok(stream) => {
                        let _ = ready_tx.send(Ok(()));
                        stream
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                loop {
                    match stop_rx.recv_timeout(POLL_INTERVAL) {
                        Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
                        Err(mpsc::RecvTimeoutError::Timeout) => {
                            if thread_finished.load(Ordering::SeqCst) {
                                break;
                            }
                        }
                    }
                }
                drop(stream);
                debug!("playback stream closed");
            })
            .context("failed to spawn playback thread")?;

        ready_rx
            .recv()
            .context("playback thread exited before starting")??;

        Ok(Box::new(DeviceClip {
            finished,
            stopped,
            stop_tx: Mutex::new(Some(stop_tx)),
        }))
    }
}

fn open_stream(
    audio: &DecodedAudio,
    finished: Arc<AtomicBool>,
    stopped: Arc<AtomicBool>,
) -> Result<Stream> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .context("no output device available")?;
    let supported_config = device
        .default_output_config()
        .context("failed to get default output config")?;

    let native_rate = supported_config.sample_rate().0;
    let native_channels = supported_config.channels() as usize;
    let sample_format = supported_config.sample_format();
    let config: StreamConfig = supported_config.into();

    let resampled = audio
        .channels
        .iter()
        .map(|channel| resample(channel, audio.sample_rate, native_rate))
        .collect::<Result<Vec<_>>>()?;
    let samples = Arc::new(to_device_layout(&resampled, native_channels));

    let stream = match sample_format {
        SampleFormat::F32 => build_stream::<f32>(&device, &config, samples, finished, stopped)?,
        SampleFormat::I16 => build_stream::<i16>(&device, &config, samples, finished, stopped)?,
        format => anyhow::bail!("unsupported sample format: {:?}", format),
    };

    stream.play().context("failed to start playback stream")?;
    Ok(stream)
}

fn build_stream<T>(
    device: &Device,
    config: &StreamConfig,
    samples: Arc<Vec<f32>>,
    finished: Arc<AtomicBool>,
    stopped: Arc<AtomicBool>,
) -> Result<Stream>
where
    T: SizedSample + FromSample<f32> + Default + Send + 'static,
{
    let position = AtomicUsize::new(0);
    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                if stopped.load(Ordering::SeqCst) {
                    data.fill(T::default());
                    return;
                }

                let pos = position.load(Ordering::SeqCst);
                let remaining = samples.len().saturating_sub(pos);
                if remaining == 0 {
                    data.fill(T::default());
                    finished.store(true, Ordering::SeqCst);
                    return;
                }

                let to_copy = remaining.min(data.len());
                for (slot, &sample) in data.iter_mut().zip(&samples[pos..pos + to_copy]) {
                    *slot = T::from_sample(sample);
                }
                data[to_copy..].fill(T::default());
                position.store(pos + to_copy, Ordering::SeqCst);
            },
            move |err| {
                error!(error = ?err, "playback stream error");
            },
            None,
        )
        .context("failed to build output stream")
}

fn resample(samples: &[f32], source_rate: u32, target_rate: u32) -> Result<Vec<f32>> {
    if source_rate == target_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let chunk_size = 1024;
    let mut resampler =
        FftFixedIn::<f32>::new(source_rate as usize, target_rate as usize, chunk_size, 2, 1)
            .context("failed to create resampler")?;

    let mut output = Vec::new();
    let mut pos = 0;
    while pos < samples.len() {
        let frames_needed = resampler.input_frames_next();
        let end = (pos + frames_needed).min(samples.len());

        let mut input_chunk = samples[pos..end].to_vec();
        input_chunk.resize(frames_needed, 0.0);

        let input = vec![input_chunk];
        let resampled = resampler
            .process(&input, None)
            .map_err(|e| anyhow::anyhow!("resampling failed: {e:?}"))?;
        if let Some(chunk) = resampled.into_iter().next() {
            output.extend(chunk);
        }
        pos = end;
    }

    Ok(output)
}

/// Interleave for a device with `device_channels` outputs. Extra device
/// channels repeat the last source channel.
fn to_device_layout(channels: &[Vec<f32>], device_channels: usize) -> Vec<f32> {
    let Some(last) = channels.len().checked_sub(1) else {
        return Vec::new();
    };
    let frames = channels.iter().map(Vec::len).min().unwrap_or(0);
    let mut output = Vec::with_capacity(frames * device_channels);
    for frame in 0..frames {
        for channel in 0..device_channels {
            output.push(channels[channel.min(last)][frame]);
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mono_expands_to_every_device_channel() {
        let layout = to_device_layout(&[vec![0.1, 0.2]], 2);
        assert_eq!(layout, vec![0.1, 0.1, 0.2, 0.2]);
    }

    #[test]
    fn test_stereo_to_mono_device_keeps_first_channel() {
        let layout = to_device_layout(&[vec![0.1, 0.2], vec![0.9, 0.8]], 1);
        assert_eq!(layout, vec![0.1, 0.2]);
    }

    #[test]
    fn test_same_rate_skips_resampling() {
        let samples = vec![0.5f32; 10];
        assert_eq!(resample(&samples, 24000, 24000).unwrap(), samples);
    }

    #[test]
    fn test_resample_changes_length_by_ratio() {
        let samples = vec![0.0f32; 24000];
        let resampled = resample(&samples, 24000, 48000).unwrap();
        assert!(resampled.len() >= 48000);
    }
}
