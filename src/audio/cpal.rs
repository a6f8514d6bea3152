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
use std::{
    error::Error,
    fmt,
    path::Path,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{error, info, span, Level};

use super::decode::{self, DecodedClip};
use crate::config;
use crate::playsync::CancelHandle;

/// A small wrapper around a cpal::Device that decodes clips for its output format.
pub struct Device {
    /// The name of the device.
    name: String,
    /// The host ID of the device.
    host_id: cpal::HostId,
    /// The underlying cpal device.
    device: cpal::Device,
    /// The stream configuration clips are prepared for.
    stream_config: cpal::StreamConfig,
    /// The native sample format of the device.
    sample_format: cpal::SampleFormat,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Channels={}, Rate={}) ({})",
            self.name,
            self.stream_config.channels,
            self.stream_config.sample_rate,
            self.host_id.name()
        )
    }
}

fn device_name(device: &cpal::Device) -> Option<String> {
    device
        .description()
        .ok()
        .map(|description| description.name().to_string())
}

impl Device {
    /// Lists the names of all output devices across all hosts.
    pub fn list() -> Result<Vec<String>, Box<dyn Error>> {
        let mut devices: Vec<String> = Vec::new();
        for host_id in cpal::available_hosts() {
            let host_devices = match cpal::host_from_id(host_id)?.output_devices() {
                Ok(host_devices) => host_devices,
                Err(e) => {
                    error!(
                        err = e.to_string(),
                        host = host_id.name(),
                        "Unable to list devices for host"
                    );
                    continue;
                }
            };

            for device in host_devices {
                if let Some(name) = device_name(&device) {
                    devices.push(format!("{} ({})", name, host_id.name()));
                }
            }
        }

        devices.sort();
        Ok(devices)
    }

    /// Gets the configured cpal device. "default" picks the default output device of the
    /// default host.
    pub fn get(config: &config::Audio) -> Result<Device, Box<dyn Error>> {
        let name = config.device();
        let host = cpal::default_host();
        let device = if name == "default" {
            host.default_output_device()
                .ok_or("no default output device")?
        } else {
            host.output_devices()?
                .find(|device| device_name(device).is_some_and(|n| n.trim() == name))
                .ok_or_else(|| format!("no device found with name {}", name))?
        };

        let supported = device.default_output_config()?;
        let sample_format = supported.sample_format();
        let stream_config = supported.config();

        let device = Device {
            name: device_name(&device).unwrap_or_else(|| name.to_string()),
            host_id: host.id(),
            device,
            stream_config,
            sample_format,
        };
        info!(device = device.to_string(), "Using audio device.");
        Ok(device)
    }
}

impl super::Device for Device {
    fn load(&self, path: &Path) -> Result<Arc<dyn super::Clip>, Box<dyn Error>> {
        let decoded = decode::decode_file(path)?.resampled(self.stream_config.sample_rate);
        Ok(Arc::new(Clip {
            device: self.device.clone(),
            stream_config: self.stream_config.clone(),
            sample_format: self.sample_format,
            decoded,
        }))
    }
}

/// A decoded clip bound to a cpal output device.
struct Clip {
    device: cpal::Device,
    stream_config: cpal::StreamConfig,
    sample_format: cpal::SampleFormat,
    decoded: DecodedClip,
}

impl Clip {
    fn build_stream<T>(
        &self,
        position: Arc<AtomicUsize>,
        finished: Arc<AtomicBool>,
        cancel_handle: CancelHandle,
    ) -> Result<cpal::Stream, Box<dyn Error>>
    where
        T: cpal::Sample + cpal::SizedSample + cpal::FromSample<f32>,
    {
        let samples = self.decoded.samples();
        let src_channels = self.decoded.channel_count() as usize;
        let total_frames = self.decoded.frames();
        let out_channels = self.stream_config.channels as usize;

        let stream = self.device.build_output_stream(
            &self.stream_config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let mut frame = position.load(Ordering::Relaxed);
                for out in data.chunks_mut(out_channels) {
                    if frame >= total_frames {
                        out.fill(T::from_sample(0.0f32));
                        continue;
                    }
                    for (channel, sample) in out.iter_mut().enumerate() {
                        let src = samples[frame * src_channels + channel % src_channels];
                        *sample = T::from_sample(src);
                    }
                    frame += 1;
                }
                position.store(frame, Ordering::Relaxed);

                if frame >= total_frames && !finished.swap(true, Ordering::Relaxed) {
                    cancel_handle.notify();
                }
            },
            |err| error!("CPAL output stream error: {}", err),
            None,
        )?;
        Ok(stream)
    }
}

impl super::Clip for Clip {
    fn duration(&self) -> Duration {
        self.decoded.duration()
    }

    fn play(&self, cancel_handle: CancelHandle) -> Result<(), Box<dyn Error>> {
        let span = span!(Level::DEBUG, "play clip (cpal)");
        let _enter = span.enter();

        let position = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicBool::new(false));
        let (position_cb, finished_cb, cancel_cb) =
            (position.clone(), finished.clone(), cancel_handle.clone());

        let stream = match self.sample_format {
            cpal::SampleFormat::F32 => self.build_stream::<f32>(position_cb, finished_cb, cancel_cb),
            cpal::SampleFormat::I16 => self.build_stream::<i16>(position_cb, finished_cb, cancel_cb),
            cpal::SampleFormat::I32 => self.build_stream::<i32>(position_cb, finished_cb, cancel_cb),
            cpal::SampleFormat::U16 => self.build_stream::<u16>(position_cb, finished_cb, cancel_cb),
            other => Err(format!("unsupported sample format {:?}", other).into()),
        }?;
        stream.play()?;

        cancel_handle.wait(finished);
        // Dropping the stream stops output immediately.
        drop(stream);
        Ok(())
    }
}
