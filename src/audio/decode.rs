// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Decodes whole clips into memory.
//!
//! Pronunciation clips are a few seconds long, so they are decoded up front and kept as
//! interleaved f32 samples for instant replay.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;
use tracing::debug;

/// Errors produced while decoding a clip.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unable to open {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("unable to decode {path}: {source}")]
    Format {
        path: String,
        source: SymphoniaError,
    },
    #[error("{path} has no playable audio track")]
    NoTrack { path: String },
    #[error("{path} does not declare a sample rate")]
    NoSampleRate { path: String },
}

/// A fully decoded clip. Samples are interleaved.
#[derive(Clone)]
pub struct DecodedClip {
    samples: Arc<Vec<f32>>,
    channel_count: u16,
    sample_rate: u32,
}

impl DecodedClip {
    /// Creates a decoded clip from interleaved samples.
    pub fn new(samples: Vec<f32>, channel_count: u16, sample_rate: u32) -> DecodedClip {
        DecodedClip {
            samples: Arc::new(samples),
            channel_count: channel_count.max(1),
            sample_rate,
        }
    }

    pub fn samples(&self) -> Arc<Vec<f32>> {
        self.samples.clone()
    }

    pub fn channel_count(&self) -> u16 {
        self.channel_count
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channel_count as usize
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate as f64)
    }

    /// Returns a copy of this clip converted to the target sample rate. Uses linear
    /// interpolation, which is plenty for short spoken clips.
    pub fn resampled(&self, target_rate: u32) -> DecodedClip {
        if target_rate == self.sample_rate || self.sample_rate == 0 {
            return self.clone();
        }

        let ratio = target_rate as f64 / self.sample_rate as f64;
        let channels = self.channel_count as usize;
        let source_frames = self.frames();
        let target_frames = (source_frames as f64 * ratio).ceil() as usize;
        let mut output = Vec::with_capacity(target_frames * channels);

        for target_frame in 0..target_frames {
            let source_pos = target_frame as f64 / ratio;
            let source_frame = source_pos.floor() as usize;
            let frac = source_pos.fract() as f32;

            for channel in 0..channels {
                let s0 = self
                    .samples
                    .get(source_frame * channels + channel)
                    .copied()
                    .unwrap_or(0.0);
                let s1 = self
                    .samples
                    .get((source_frame + 1) * channels + channel)
                    .copied()
                    .unwrap_or(s0);
                output.push(s0 + (s1 - s0) * frac);
            }
        }

        DecodedClip::new(output, self.channel_count, target_rate)
    }
}

/// Decodes the file at the given path into memory.
pub fn decode_file(path: &Path) -> Result<DecodedClip, DecodeError> {
    let shown_path = path.display().to_string();
    let file = File::open(path).map_err(|source| DecodeError::Io {
        path: shown_path.clone(),
        source,
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|source| DecodeError::Format {
            path: shown_path.clone(),
            source,
        })?;
    let mut format_reader = probed.format;

    let track = format_reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| DecodeError::NoTrack {
            path: shown_path.clone(),
        })?;
    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| DecodeError::NoSampleRate {
            path: shown_path.clone(),
        })?;
    let mut channel_count = track
        .codec_params
        .channels
        .map(|c| c.count() as u16)
        .unwrap_or(0);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|source| DecodeError::Format {
            path: shown_path.clone(),
            source,
        })?;

    let mut samples: Vec<f32> = Vec::new();
    let mut sample_buffer: Option<SampleBuffer<f32>> = None;
    loop {
        let packet = match format_reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(source) => {
                return Err(DecodeError::Format {
                    path: shown_path,
                    source,
                })
            }
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            // A corrupt packet is skipped rather than failing the whole clip.
            Err(SymphoniaError::DecodeError(e)) => {
                debug!(path = %shown_path, err = %e, "Skipping undecodable packet");
                continue;
            }
            Err(source) => {
                return Err(DecodeError::Format {
                    path: shown_path,
                    source,
                })
            }
        };

        if channel_count == 0 {
            channel_count = decoded.spec().channels.count() as u16;
        }
        let buffer = sample_buffer.get_or_insert_with(|| {
            SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec())
        });
        if buffer.capacity() < decoded.capacity() * decoded.spec().channels.count() {
            *buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
        }
        buffer.copy_interleaved_ref(decoded);
        samples.extend_from_slice(buffer.samples());
    }

    Ok(DecodedClip::new(samples, channel_count, sample_rate))
}
