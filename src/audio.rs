use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Stream, StreamConfig};
use log::{error, info};
use std::sync::{Arc, Mutex};

use crate::sequencer::AudioVoice;
use crate::synth::Synth;

/// Keeps the output stream alive for as long as it is held.
pub struct AudioEngine {
    _stream: Stream,
}

impl AudioEngine {
    pub fn new(synth: Arc<Mutex<Synth>>) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .context("No output device found")?;

        let config = device
            .default_output_config()
            .context("No default output config")?;

        let sample_rate = config.sample_rate().0 as f32;
        let channels = config.channels() as usize;

        {
            let mut s = synth.lock().unwrap_or_else(|p| p.into_inner());
            s.sample_rate = sample_rate;
        }

        let synth_clone = Arc::clone(&synth);

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config.into(), synth_clone, channels)?,
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config.into(), synth_clone, channels)?,
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config.into(), synth_clone, channels)?,
            fmt => anyhow::bail!("Unsupported sample format: {:?}", fmt),
        };

        stream.play().context("Failed to start audio stream")?;
        info!("audio output at {} Hz, {} channels", sample_rate, channels);

        Ok(Self { _stream: stream })
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    synth: Arc<Mutex<Synth>>,
    channels: usize,
) -> Result<Stream>
where
    T: cpal::Sample + cpal::SizedSample + cpal::FromSample<f32>,
{
    let err_fn = |err| error!("audio stream error: {}", err);

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            let mut synth = synth.lock().unwrap_or_else(|p| p.into_inner());
            for frame in data.chunks_mut(channels) {
                let value = T::from_sample(synth.generate_sample());
                for out in frame.iter_mut() {
                    *out = value;
                }
            }
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}

/// Scheduler-side handle onto the synth running in the audio callback.
pub struct SynthVoice {
    synth: Arc<Mutex<Synth>>,
}

impl SynthVoice {
    pub fn new(synth: Arc<Mutex<Synth>>) -> Self {
        Self { synth }
    }
}

impl AudioVoice for SynthVoice {
    fn trigger(&mut self, frequency: f32, duration: f32, volume: f32) {
        let mut synth = self.synth.lock().unwrap_or_else(|p| p.into_inner());
        synth.trigger(frequency, duration, volume);
    }
}
