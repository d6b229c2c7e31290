//! Audio file I/O
//!
//! Decoding of fetched sample bytes (WAV and MP3 through symphonia) and WAV
//! export of rendered buffers through hound.
//!
//! Decoded audio is converted to 32-bit float and resampled to the device
//! rate with linear interpolation.

use std::io::Cursor;
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::engine::buffer::{AudioBuffer, ChannelLayout};
use crate::error::{Result, SoundError};

/// Export format configuration
#[derive(Debug, Clone)]
pub struct ExportFormat {
    /// Bit depth: 16, 24, or 32 (default: 16)
    pub bit_depth: u16,
}

impl Default for ExportFormat {
    fn default() -> Self {
        ExportFormat { bit_depth: 16 }
    }
}

impl ExportFormat {
    pub fn new(bit_depth: u16) -> Self {
        ExportFormat { bit_depth }
    }
}

/// Decode fetched bytes into an [`AudioBuffer`] at `target_rate`
///
/// `name` is only used for error messages; the extension of `uri` (if any)
/// is passed to the format probe as a hint.
pub fn decode_sample(name: &str, uri: &str, bytes: Vec<u8>, target_rate: u32) -> Result<AudioBuffer> {
    let decode_err = |reason: String, source: Option<SymphoniaError>| SoundError::DecodeFailed {
        name: name.to_string(),
        reason,
        source: source.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
    };

    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = Path::new(uri).extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| decode_err("unrecognized container".to_string(), Some(e)))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| decode_err("no audio track".to_string(), None))?;
    let track_id = track.id;
    let mut source_rate = track.codec_params.sample_rate.unwrap_or(0);
    let mut source_channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(0);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| SoundError::UnsupportedFormat {
            format: format!("{} ({})", uri, e),
        })?;

    let mut interleaved: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(decode_err("failed to read packet".to_string(), Some(e))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                source_rate = spec.rate;
                source_channels = spec.channels.count();
                let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                sample_buf.copy_interleaved_ref(decoded);
                interleaved.extend_from_slice(sample_buf.samples());
            }
            // Corrupt frames are skipped
            Err(SymphoniaError::DecodeError(reason)) => {
                log::debug!("Skipping undecodable packet in '{}': {}", name, reason);
            }
            Err(e) => return Err(decode_err("decoder failure".to_string(), Some(e))),
        }
    }

    if source_channels == 0 || source_rate == 0 {
        return Err(decode_err("missing channel or rate information".to_string(), None));
    }
    if interleaved.is_empty() {
        return Err(SoundError::EmptySample {
            name: name.to_string(),
        });
    }

    let channel_data = reduce_channels(deinterleave(&interleaved, source_channels));
    let channel_data = if source_rate != target_rate {
        resample_channels(&channel_data, source_rate, target_rate)
    } else {
        channel_data
    };

    Ok(AudioBuffer {
        samples: channel_data,
        sample_rate: target_rate,
    })
}

/// Export an AudioBuffer to a WAV file at the buffer's own sample rate
pub fn export_wav(buffer: &AudioBuffer, path: &Path, format: ExportFormat) -> Result<()> {
    let channels = buffer.channels() as u16;
    if ChannelLayout::from_count(buffer.channels()).is_none() {
        return Err(SoundError::UnsupportedFormat {
            format: format!("{}-channel export (only mono/stereo supported)", channels),
        });
    }

    let spec = WavSpec {
        channels,
        sample_rate: buffer.sample_rate,
        bits_per_sample: format.bit_depth,
        sample_format: if format.bit_depth == 32 {
            SampleFormat::Float
        } else {
            SampleFormat::Int
        },
    };

    let interleaved = buffer.to_interleaved();

    match format.bit_depth {
        16 => {
            let mut writer = WavWriter::create(path, spec)?;
            for sample in interleaved {
                writer.write_sample((sample * 32767.0).clamp(-32768.0, 32767.0) as i16)?;
            }
            writer.finalize()?;
        }
        24 => {
            let mut writer = WavWriter::create(path, spec)?;
            for sample in interleaved {
                // 24-bit stored as i32 in hound
                writer.write_sample((sample * 8388607.0).clamp(-8388608.0, 8388607.0) as i32)?;
            }
            writer.finalize()?;
        }
        32 => {
            let mut writer = WavWriter::create(path, spec)?;
            for sample in interleaved {
                writer.write_sample(sample)?;
            }
            writer.finalize()?;
        }
        _ => {
            return Err(SoundError::UnsupportedFormat {
                format: format!("{}-bit audio (only 16, 24, 32 supported)", format.bit_depth),
            });
        }
    }

    log::info!(
        "Exported {:.2}s of audio to {}",
        buffer.duration_secs(),
        path.display()
    );
    Ok(())
}

// ============================================================================
// Internal helper functions
// ============================================================================

/// De-interleave samples from [L,R,L,R,...] to [[L,L,...], [R,R,...]]
fn deinterleave(samples: &[f32], channels: usize) -> Vec<Vec<f32>> {
    let frames = samples.len() / channels;
    let mut result = vec![Vec::with_capacity(frames); channels];

    for frame in samples.chunks_exact(channels) {
        for (ch, sample) in frame.iter().enumerate() {
            result[ch].push(*sample);
        }
    }

    result
}

/// Keep at most two channels (front left/right of surround material)
fn reduce_channels(mut channels: Vec<Vec<f32>>) -> Vec<Vec<f32>> {
    channels.truncate(2);
    channels
}

/// Resample audio channels to a different sample rate
fn resample_channels(channels: &[Vec<f32>], source_rate: u32, target_rate: u32) -> Vec<Vec<f32>> {
    let ratio = target_rate as f64 / source_rate as f64;

    channels
        .iter()
        .map(|channel| resample_linear(channel, ratio))
        .collect()
}

/// Linear interpolation resampling
fn resample_linear(samples: &[f32], ratio: f64) -> Vec<f32> {
    if samples.is_empty() {
        return Vec::new();
    }

    let source_len = samples.len();
    let target_len = ((source_len as f64) * ratio).ceil() as usize;
    let mut output = Vec::with_capacity(target_len);

    for i in 0..target_len {
        let src_pos = i as f64 / ratio;
        let src_idx = src_pos.floor() as usize;
        let frac = (src_pos - src_idx as f64) as f32;

        let sample = if src_idx + 1 < source_len {
            samples[src_idx] * (1.0 - frac) + samples[src_idx + 1] * frac
        } else if src_idx < source_len {
            samples[src_idx]
        } else {
            0.0
        };

        output.push(sample);
    }

    output
}

/// Encode samples as a 16-bit WAV file in memory
///
/// Used to build fixtures and in-memory sample sources.
pub fn encode_wav_bytes(buffer: &AudioBuffer) -> Result<Vec<u8>> {
    let spec = WavSpec {
        channels: buffer.channels() as u16,
        sample_rate: buffer.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for sample in buffer.to_interleaved() {
            writer.write_sample((sample * 32767.0).clamp(-32768.0, 32767.0) as i16)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

// ============================================================================
// Tests
// ============================================================================
