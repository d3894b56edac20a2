use std::{fs::File, io, path::Path, time::Duration};

use symphonia::core::{
    audio::{SampleBuffer, SignalSpec},
    codecs::{CodecParameters, Decoder, DecoderOptions},
    conv::ConvertibleSample,
    errors::Error as SymphoniaError,
    formats::{FormatOptions, FormatReader},
    io::MediaSourceStream,
    meta::MetadataOptions,
    probe::Hint,
    units::TimeStamp,
};

use crate::error::Error;

// -------------------------------------------------------------------------------------------------

/// Decodes audio files via Symphonia, packet by packet.
pub struct AudioDecoder {
    track_id: u32, // Internal track index.
    decoder: Box<dyn Decoder>,
    format: Box<dyn FormatReader>,
}

impl AudioDecoder {
    /// Create a new decoder from the given file path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = Box::new(File::open(path)?);
        let source_stream = MediaSourceStream::new(file, Default::default());

        // Use the file extension as hint to help the format registry guess what format
        // reader is appropriate.
        let mut hint = Hint::new();
        if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(extension);
        }
        Self::from_source_stream(source_stream, hint)
    }

    /// Create a new decoder from the given in-memory file buffer.
    pub fn from_buffer(buffer: Vec<u8>) -> Result<Self, Error> {
        let cursor = Box::new(io::Cursor::new(buffer));
        let source_stream = MediaSourceStream::new(cursor, Default::default());
        Self::from_source_stream(source_stream, Hint::new())
    }

    /// Create a new decoder from the given Symphonia MediaSourceStream
    pub fn from_source_stream(source_stream: MediaSourceStream, hint: Hint) -> Result<Self, Error> {
        // Use the default options when reading and decoding.
        let format_opts: FormatOptions = Default::default();
        let metadata_opts: MetadataOptions = Default::default();
        let decoder_opts: DecoderOptions = Default::default();

        // Probe the media source stream for a format.
        let probed = symphonia::default::get_probe()
            .format(&hint, source_stream, &format_opts, &metadata_opts)
            .map_err(|_| Error::MediaFileProbeError)?;

        // Get the format reader yielded by the probe operation.
        let format = probed.format;

        // Get the default track.
        let track = match format.default_track() {
            Some(t) => t,
            None => {
                return Err(Error::MediaFileProbeError);
            }
        };
        let track_id = track.id;

        // Create a decoder for the track.
        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &decoder_opts)
            .map_err(|err| Error::AudioDecodingError(Box::new(err)))?;

        Ok(Self {
            track_id,
            decoder,
            format,
        })
    }

    pub fn codec_params(&self) -> &CodecParameters {
        self.decoder.codec_params()
    }

    /// The decoded track's sample rate and channel layout. Fails when the container did not
    /// specify them.
    pub fn signal_spec(&self) -> Result<SignalSpec, Error> {
        match (
            self.codec_params().sample_rate,
            self.codec_params().channels,
        ) {
            (Some(rate), Some(channels)) if rate > 0 && channels.count() > 0 => {
                Ok(SignalSpec { rate, channels })
            }
            _ => Err(Error::MediaFileProbeError),
        }
    }

    /// Track duration, when the container tells us the number of frames upfront.
    pub fn duration_hint(&self) -> Option<Duration> {
        let frames = self.codec_params().n_frames?;
        let rate = self.codec_params().sample_rate.filter(|rate| *rate > 0)?;
        Some(Duration::from_secs_f64(frames as f64 / rate as f64))
    }

    /// Read a next packet of audio from this decoder into the given sample buffer, growing
    /// the buffer when a packet doesn't fit. Returns `None` in case of EOF or internal error.
    pub fn read_packet<S>(&mut self, samples: &mut SampleBuffer<S>) -> Option<TimeStamp>
    where
        S: ConvertibleSample,
    {
        loop {
            // Demux an encoded packet from the media format.
            let packet = match self.format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(io)) if io.kind() == io::ErrorKind::UnexpectedEof => {
                    return None; // End of this stream.
                }
                Err(err) => {
                    log::error!("Audio file decoder format error: {err}");
                    return None; // We cannot recover from format errors, quit.
                }
            };
            // If the packet does not belong to the selected track, skip over it.
            if packet.track_id() != self.track_id {
                continue;
            }
            // Decode the packet into an audio buffer.
            match self.decoder.decode(&packet) {
                Ok(decoded) => {
                    let required = decoded.capacity() * decoded.spec().channels.count();
                    if samples.capacity() < required {
                        *samples = SampleBuffer::new(decoded.capacity() as u64, *decoded.spec());
                    }
                    // Interleave the samples into the buffer.
                    samples.copy_interleaved_ref(decoded);
                    return Some(packet.ts());
                }
                Err(SymphoniaError::IoError(err)) => {
                    // The packet failed to decode due to an IO error, skip the packet.
                    log::error!("Audio file decoder I/O error: {err}");
                    continue;
                }
                Err(SymphoniaError::DecodeError(err)) => {
                    // The packet failed to decode due to invalid data, skip the packet.
                    log::error!("Audio file decoder error: {err}");
                    continue;
                }
                Err(err) => {
                    log::error!("Audio file decoder fatal error: {err}");
                    return None;
                }
            };
        }
    }
}
