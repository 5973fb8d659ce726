//! WAV file input and output.

use crate::{AudioError, Wave};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::debug;

/// Decoded audio file with planar channels.
#[derive(Debug, Clone, Default)]
pub struct SoundFile {
    /// One wave per channel.
    pub channels: Vec<Wave>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl SoundFile {
    /// Frames per channel.
    pub fn frames(&self) -> usize {
        self.channels.first().map(|c| c.len()).unwrap_or(0)
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }
}

/// Read a WAV file; integer PCM is scaled to the range -1 to 1.
pub fn read_wav(path: impl AsRef<Path>) -> Result<SoundFile, AudioError> {
    let path = path.as_ref();
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let nch = spec.channels as usize;
    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => {
            if spec.bits_per_sample != 32 {
                return Err(AudioError::Format(format!(
                    "{}-bit float",
                    spec.bits_per_sample
                )));
            }
            reader.into_samples::<f32>().collect::<Result<_, _>>()?
        }
        SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()?
        }
    };
    let frames = if nch > 0 { interleaved.len() / nch } else { 0 };
    let channels = (0..nch)
        .map(|ch| {
            Wave::from_vec(
                interleaved
                    .iter()
                    .skip(ch)
                    .step_by(nch)
                    .take(frames)
                    .copied()
                    .collect(),
            )
        })
        .collect();
    debug!(
        path = %path.display(),
        channels = nch,
        frames,
        sample_rate = spec.sample_rate,
        "Read sound file"
    );
    Ok(SoundFile {
        channels,
        sample_rate: spec.sample_rate,
    })
}

/// Streaming 32-bit float WAV writer.
pub struct WavSink {
    writer: WavWriter<BufWriter<File>>,
    channels: usize,
    frames: usize,
}

impl WavSink {
    /// Create `path` with `channels` channels at `sample_rate` Hz.
    pub fn create(
        path: impl AsRef<Path>,
        channels: usize,
        sample_rate: u32,
    ) -> Result<Self, AudioError> {
        let spec = WavSpec {
            channels: channels as u16,
            sample_rate,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        Ok(Self {
            writer: WavWriter::create(path, spec)?,
            channels,
            frames: 0,
        })
    }

    /// Append one block given as planar channels.
    pub fn write(&mut self, block: &[Wave]) -> Result<(), AudioError> {
        if block.len() != self.channels {
            return Err(AudioError::ChannelMismatch {
                expected: self.channels,
                got: block.len(),
            });
        }
        let frames = block.first().map(|c| c.len()).unwrap_or(0);
        for k in 0..frames {
            for ch in block {
                self.writer.write_sample(ch.get(k).copied().unwrap_or(0.0))?;
            }
        }
        self.frames += frames;
        Ok(())
    }

    /// Frames written so far.
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Flush and close the file.
    pub fn finalize(self) -> Result<(), AudioError> {
        self.writer.finalize()?;
        Ok(())
    }
}

/// Write planar channels to a float WAV file in one go.
pub fn write_wav(
    path: impl AsRef<Path>,
    channels: &[Wave],
    sample_rate: u32,
) -> Result<(), AudioError> {
    let mut sink = WavSink::create(path, channels.len(), sample_rate)?;
    sink.write(channels)?;
    sink.finalize()
}
