//! Decoded, immutable sample buffers and the file formats they can be loaded from.

use std::{
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use strum::{Display, EnumString, VariantNames};
use symphonia::core::audio::SampleBuffer;

use crate::{
    error::Error,
    utils::{buffer::planar_to_interleaved, decoder::AudioDecoder, unique_usize_id},
};

// -------------------------------------------------------------------------------------------------

/// Audio file containers which can be loaded into sample slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, VariantNames)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SampleFileFormat {
    Wav,
    Flac,
}

impl SampleFileFormat {
    /// Detect the format from the given path's extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let extension = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        Self::from_str(extension).map_err(|_| Error::UnsupportedFileFormat(extension.to_string()))
    }
}

// -------------------------------------------------------------------------------------------------

/// A fully decoded audio file: interleaved, normalized f32 frames with their sample rate and
/// channel layout. Samples never change after creation.
#[derive(Debug, Clone)]
pub struct Sample {
    id: usize,
    file_path: PathBuf,
    buffer: Vec<f32>,
    channel_count: usize,
    sample_rate: u32,
}

impl Sample {
    /// Decode the given WAV or FLAC file. Fails when the file has some other extension, can
    /// not be decoded, contains no frames or is longer than `max_length`.
    pub fn from_file<P: AsRef<Path>>(path: P, max_length: Duration) -> Result<Self, Error> {
        let path = path.as_ref();
        SampleFileFormat::from_path(path)?;
        let decoder = AudioDecoder::from_file(path)?;
        Self::decode(decoder, path.to_path_buf(), max_length)
    }

    /// Decode the given in-memory file contents. `file_path` is used to detect the file format
    /// and as the sample's identity.
    pub fn from_file_buffer<P: AsRef<Path>>(
        file_path: P,
        file_buffer: Vec<u8>,
        max_length: Duration,
    ) -> Result<Self, Error> {
        let file_path = file_path.as_ref();
        SampleFileFormat::from_path(file_path)?;
        let decoder = AudioDecoder::from_buffer(file_buffer)?;
        Self::decode(decoder, file_path.to_path_buf(), max_length)
    }

    /// Create a sample from an already decoded, interleaved buffer.
    pub fn from_interleaved<P: Into<PathBuf>>(
        file_path: P,
        buffer: Vec<f32>,
        channel_count: usize,
        sample_rate: u32,
    ) -> Result<Self, Error> {
        if channel_count == 0 || sample_rate == 0 {
            return Err(Error::ParameterError(format!(
                "invalid sample layout: {channel_count} channels at {sample_rate} Hz"
            )));
        }
        if buffer.len() < channel_count || buffer.len() % channel_count != 0 {
            return Err(Error::ParameterError(format!(
                "sample buffer length {} does not match channel count {channel_count}",
                buffer.len()
            )));
        }
        Ok(Self {
            id: unique_usize_id(),
            file_path: file_path.into(),
            buffer,
            channel_count,
            sample_rate,
        })
    }

    /// Create a sample from a planar buffer (one `Vec` per channel, all of the same length).
    pub fn from_planar<P: Into<PathBuf>>(
        file_path: P,
        planar: &[Vec<f32>],
        sample_rate: u32,
    ) -> Result<Self, Error> {
        let frame_count = planar.first().map(Vec::len).unwrap_or(0);
        if planar.iter().any(|channel| channel.len() != frame_count) {
            return Err(Error::ParameterError(
                "planar sample channels differ in length".to_string(),
            ));
        }
        let mut buffer = vec![0.0; frame_count * planar.len()];
        planar_to_interleaved(planar, &mut buffer);
        Self::from_interleaved(file_path, buffer, planar.len(), sample_rate)
    }

    fn decode(
        mut decoder: AudioDecoder,
        file_path: PathBuf,
        max_length: Duration,
    ) -> Result<Self, Error> {
        let signal_spec = decoder.signal_spec()?;
        let sample_rate = signal_spec.rate;
        let channel_count = signal_spec.channels.count();

        // bail out early when the container already tells us the file's too long
        if let Some(length) = decoder.duration_hint() {
            if length > max_length {
                return Err(Error::SampleTooLong { length, max_length });
            }
        }

        // prealloc entire buffer, when the decoder gives us a frame hint
        let buffer_capacity =
            decoder.codec_params().n_frames.unwrap_or(0) as usize * channel_count;
        let mut buffer = Vec::with_capacity(buffer_capacity);

        // decode the entire file into our buffer in chunks of max_frames_per_packet sizes
        let decode_buffer_capacity = decoder
            .codec_params()
            .max_frames_per_packet
            .unwrap_or(16 * 1024);
        let mut decode_buffer = SampleBuffer::<f32>::new(decode_buffer_capacity, signal_spec);
        let max_samples =
            (max_length.as_secs_f64() * sample_rate as f64).ceil() as usize * channel_count;
        while decoder.read_packet(&mut decode_buffer).is_some() {
            buffer.extend_from_slice(decode_buffer.samples());
            if buffer.len() > max_samples {
                let length = Duration::from_secs_f64(
                    (buffer.len() / channel_count) as f64 / sample_rate as f64,
                );
                return Err(Error::SampleTooLong { length, max_length });
            }
        }
        if buffer.is_empty() {
            return Err(Error::AudioDecodingError(Box::new(
                symphonia::core::errors::Error::DecodeError("file contains no audio frames"),
            )));
        }

        log::debug!(
            "Decoded '{}': {} frames, {} channels, {} Hz",
            file_path.display(),
            buffer.len() / channel_count,
            channel_count,
            sample_rate
        );
        Self::from_interleaved(file_path, buffer, channel_count, sample_rate)
    }

    /// Unique id of this decoded sample instance.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Path of the file this sample got decoded from.
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Display name of the sample: the file name without its directory.
    pub fn name(&self) -> String {
        self.file_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file_path.to_string_lossy().into_owned())
    }

    /// Interleaved sample data.
    #[inline]
    pub fn buffer(&self) -> &[f32] {
        &self.buffer
    }

    #[inline]
    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    #[inline]
    pub fn frame_count(&self) -> usize {
        self.buffer.len() / self.channel_count
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frame_count() as f64 / self.sample_rate as f64)
    }
}

// -------------------------------------------------------------------------------------------------
