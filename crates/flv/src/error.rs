use thiserror::Error;

/// The classification attached to an `error` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DemuxErrorKind {
    /// A tag or record is structurally broken. The tag is dropped.
    FormatError,
    /// A recognized codec id this demuxer does not implement. The tag is dropped.
    CodecUnsupported,
    /// The stream is not FLV at all.
    FormatUnsupported,
    /// The demuxer was used in a state where it cannot parse.
    StateError,
}

#[derive(Error, Debug)]
pub enum FlvError {
    #[error("Invalid FLV header")]
    InvalidHeader,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid script data: {0}")]
    Amf0(#[from] amf0::Amf0ReadError),
    #[error("Malformed tag: {0}")]
    Format(String),
    #[error("Unsupported codec: {0}")]
    CodecUnsupported(String),
    #[error("Cannot build audio frame: {0}")]
    Adts(#[from] aac::AdtsError),
    #[error("Invalid demuxer state: {0}")]
    State(&'static str),
}

impl FlvError {
    /// The event classification for this error.
    pub fn kind(&self) -> DemuxErrorKind {
        match self {
            FlvError::InvalidHeader => DemuxErrorKind::FormatUnsupported,
            FlvError::CodecUnsupported(_) => DemuxErrorKind::CodecUnsupported,
            FlvError::State(_) => DemuxErrorKind::StateError,
            FlvError::Io(_) | FlvError::Amf0(_) | FlvError::Format(_) | FlvError::Adts(_) => {
                DemuxErrorKind::FormatError
            }
        }
    }
}
