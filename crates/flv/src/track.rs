use std::fmt;

use bytes::Bytes;
use h264::{FrameRate, SarDimensions};

use crate::classifier::FrameType;

/// Which elementary stream a track, sample or metadata record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

impl TrackKind {
    /// The conventional track id: video 1, audio 2.
    pub const fn id(&self) -> u32 {
        match self {
            TrackKind::Video => 1,
            TrackKind::Audio => 2,
        }
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackKind::Audio => f.write_str("audio"),
            TrackKind::Video => f.write_str("video"),
        }
    }
}

/// One NAL unit of a video sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NaluUnit {
    /// `nal_unit_type`, the low 5 bits of the NAL header.
    pub unit_type: u8,
    /// The unit as found in the tag, length prefix included.
    pub data: Bytes,
}

/// A raw AAC or MP3 frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSample {
    pub unit: Bytes,
    pub dts: i64,
    /// Always equal to `dts`.
    pub pts: i64,
}

/// The NAL units of one video tag.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoSample {
    pub units: Vec<NaluUnit>,
    /// Sum of the unit sizes, length prefixes included.
    pub length: usize,
    pub keyframe: bool,
    pub dts: i64,
    pub cts: i32,
    /// `dts + cts`
    pub pts: i64,
    /// Best-effort picture type, see [`crate::classifier`].
    pub frame_type: FrameType,
    /// Byte offset of the tag in the stream, for keyframes only.
    pub file_position: Option<u64>,
}

/// A pending sample of either kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Sample {
    Audio(AudioSample),
    Video(VideoSample),
}

impl Sample {
    pub fn dts(&self) -> i64 {
        match self {
            Sample::Audio(sample) => sample.dts,
            Sample::Video(sample) => sample.dts,
        }
    }

    pub fn pts(&self) -> i64 {
        match self {
            Sample::Audio(sample) => sample.pts,
            Sample::Video(sample) => sample.pts,
        }
    }

    /// Payload size in bytes.
    pub fn len(&self) -> usize {
        match self {
            Sample::Audio(sample) => sample.unit.len(),
            Sample::Video(sample) => sample.length,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Samples demuxed but not yet delivered.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub kind: TrackKind,
    pub id: u32,
    /// Number of batches delivered so far.
    pub sequence_number: u64,
    pub samples: Vec<Sample>,
    /// Running payload size of `samples`.
    pub length: usize,
}

impl Track {
    pub fn new(kind: TrackKind) -> Self {
        Self {
            kind,
            id: kind.id(),
            sequence_number: 0,
            samples: Vec::new(),
            length: 0,
        }
    }

    pub fn push(&mut self, sample: Sample) {
        self.length += sample.len();
        self.samples.push(sample);
    }

    pub fn has_pending(&self) -> bool {
        !self.samples.is_empty()
    }

    /// Hands out the pending samples and resets the byte count. The
    /// sequence number only moves when something was taken.
    pub fn take_samples(&mut self) -> Vec<Sample> {
        if self.samples.is_empty() {
            return Vec::new();
        }

        self.length = 0;
        self.sequence_number += 1;
        std::mem::take(&mut self.samples)
    }

    /// Drops pending samples without delivering them.
    pub fn clear(&mut self) {
        self.samples.clear();
        self.length = 0;
    }
}

/// Decoder configuration of the audio track.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioMetadata {
    pub id: u32,
    pub timescale: u32,
    pub duration: u32,
    pub audio_sample_rate: u32,
    pub channel_count: u8,
    /// The codec string signalled to decoders, `None` until the first
    /// AudioSpecificConfig or MP3 frame header was read.
    pub codec: Option<String>,
    /// The codec string of the stream before any object type rewrite.
    pub original_codec: Option<String>,
    /// AudioSpecificConfig after the object type rewrite, empty for MP3.
    pub config: Vec<u8>,
    /// The AudioSpecificConfig as found in the stream, empty for MP3.
    pub extra_data: Bytes,
    /// Duration of one frame in timescale units.
    pub ref_sample_duration: f64,
}

impl AudioMetadata {
    pub(crate) fn new(timescale: u32, duration: u32, sample_rate: u32, channel_count: u8) -> Self {
        Self {
            id: TrackKind::Audio.id(),
            timescale,
            duration,
            audio_sample_rate: sample_rate,
            channel_count,
            codec: None,
            original_codec: None,
            config: Vec::new(),
            extra_data: Bytes::new(),
            ref_sample_duration: 0.0,
        }
    }

    /// Whether a codec was identified.
    pub fn is_configured(&self) -> bool {
        self.codec.is_some()
    }

    /// Whether frames are MP3 rather than AAC.
    pub fn is_mp3(&self) -> bool {
        self.codec.as_deref() == Some("mp3")
    }
}

/// Decoder configuration of the video track.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoMetadata {
    pub id: u32,
    pub timescale: u32,
    pub duration: u32,
    pub codec_width: u32,
    pub codec_height: u32,
    pub present_width: u32,
    pub present_height: u32,
    pub profile: String,
    pub level: String,
    pub bit_depth: u32,
    /// 420, 422 or 444.
    pub chroma_format: u16,
    pub sar: SarDimensions,
    pub frame_rate: FrameRate,
    pub ref_sample_duration: f64,
    /// Every SPS and PPS behind a 4-byte start code.
    pub spspps: Bytes,
    /// The AVCDecoderConfigurationRecord as found in the tag.
    pub avcc: Bytes,
    /// Size of the length prefix in front of each NAL unit, 3 or 4.
    pub nalu_length_size: u8,
    /// `avc1.PPCCLL`
    pub codec: String,
}

/// Metadata of either track.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackMetadata {
    Audio(AudioMetadata),
    Video(VideoMetadata),
}

impl TrackMetadata {
    pub fn kind(&self) -> TrackKind {
        match self {
            TrackMetadata::Audio(_) => TrackKind::Audio,
            TrackMetadata::Video(_) => TrackKind::Video,
        }
    }
}
