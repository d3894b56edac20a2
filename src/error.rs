use std::{error, fmt, io, time::Duration};

// -------------------------------------------------------------------------------------------------

/// Provides an enumeration of all possible errors reported by itch.
#[derive(Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    MediaFileNotFound,
    MediaFileProbeError,
    AudioDecodingError(Box<dyn error::Error + Send + Sync>),
    UnsupportedFileFormat(String),
    SampleTooLong {
        length: Duration,
        max_length: Duration,
    },
    NoFreeSlot,
    SlotOutOfRange(usize),
    ParameterError(String),
    StateError(String),
    IoError(io::Error),
}

impl Error {
    /// True for all errors which may be returned by a failed sample load operation.
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            Self::MediaFileNotFound
                | Self::MediaFileProbeError
                | Self::AudioDecodingError(_)
                | Self::UnsupportedFileFormat(_)
                | Self::SampleTooLong { .. }
                | Self::NoFreeSlot
                | Self::SlotOutOfRange(_)
                | Self::IoError(_)
        )
    }
}

impl error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MediaFileNotFound => write!(f, "Audio file not found"),
            Self::MediaFileProbeError => write!(f, "Audio file failed to probe"),
            Self::AudioDecodingError(err) => err.fmt(f),
            Self::UnsupportedFileFormat(extension) => {
                write!(f, "Unsupported audio file format: '{extension}'")
            }
            Self::SampleTooLong { length, max_length } => write!(
                f,
                "Audio file is too long: {:.2}s (max {:.2}s)",
                length.as_secs_f64(),
                max_length.as_secs_f64()
            ),
            Self::NoFreeSlot => write!(f, "No free sample slot available"),
            Self::SlotOutOfRange(slot) => write!(f, "Sample slot {slot} is out of range"),
            Self::ParameterError(str) => write!(f, "Invalid parameter: {str}"),
            Self::StateError(str) => write!(f, "Invalid state document: {str}"),
            Self::IoError(err) => err.fmt(f),
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        if err.kind() == io::ErrorKind::NotFound {
            Error::MediaFileNotFound
        } else {
            Error::IoError(err)
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::StateError(err.to_string())
    }
}
