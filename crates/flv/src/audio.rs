//! # FLV Audio Module
//!
//! Parsing of the legacy FLV AUDIODATA header and of the codec specific
//! parts needed to configure a decoder: the AAC packet type and the MPEG
//! audio frame header.
//!
//! ## Specifications
//!
//! - video_file_format_spec_v10.pdf (Chapter 1 - The FLV File Format - Audio tags)
//! - ISO/IEC 11172-3 (MPEG-1 audio frame header)

use std::fmt;

/// FLV Sound Format
///
/// Only AAC and MP3 are demuxed, every other format is reported as an
/// unsupported codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundFormat {
    Mp3,
    Aac,
    Other(u8),
}

impl From<u8> for SoundFormat {
    fn from(value: u8) -> Self {
        match value {
            2 => SoundFormat::Mp3,
            10 => SoundFormat::Aac,
            _ => SoundFormat::Other(value),
        }
    }
}

/// Sample rate of each 2-bit SoundRate value.
const FLV_SOUND_RATES: [u32; 4] = [5500, 11025, 22050, 44100];

/// The first byte of every audio tag body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioTagHeader {
    pub sound_format: SoundFormat,
    /// The sample rate the tag declares. AAC streams always declare 44100
    /// and carry the real rate in the AudioSpecificConfig.
    pub sound_rate: u32,
    /// `SoundSize`, true for 16-bit samples.
    pub sound_size_16bit: bool,
    /// `SoundType`, true for stereo.
    pub stereo: bool,
}

impl AudioTagHeader {
    pub fn parse(byte: u8) -> Self {
        AudioTagHeader {
            sound_format: SoundFormat::from(byte >> 4),
            sound_rate: FLV_SOUND_RATES[((byte & 0b0000_1100) >> 2) as usize],
            sound_size_16bit: byte & 0b0000_0010 != 0,
            stereo: byte & 0b0000_0001 != 0,
        }
    }

    pub fn channel_count(&self) -> u8 {
        if self.stereo { 2 } else { 1 }
    }
}

/// The AAC packet type byte following the audio tag header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AacPacketType {
    SequenceHeader,
    Raw,
    Unknown(u8),
}

impl From<u8> for AacPacketType {
    fn from(value: u8) -> Self {
        match value {
            0 => AacPacketType::SequenceHeader,
            1 => AacPacketType::Raw,
            _ => AacPacketType::Unknown(value),
        }
    }
}

const MPEG_V1_SAMPLE_RATES: [u32; 4] = [44100, 48000, 32000, 0];
const MPEG_V2_SAMPLE_RATES: [u32; 4] = [22050, 24000, 16000, 0];
const MPEG_V25_SAMPLE_RATES: [u32; 4] = [11025, 12000, 8000, 0];

const LAYER1_BIT_RATES: [i32; 16] = [0, 32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448, -1];
const LAYER2_BIT_RATES: [i32; 16] = [0, 32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384, -1];
const LAYER3_BIT_RATES: [i32; 16] = [0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, -1];

/// MPEG audio version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MpegVersion {
    Mpeg1,
    Mpeg2,
    Mpeg25,
    Reserved,
}

/// The fields of an MPEG audio frame header needed to describe the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mp3FrameHeader {
    pub version: MpegVersion,
    /// 1, 2 or 3; 0 for the reserved value.
    pub layer: u8,
    /// Bit rate in kbit/s. 0 means free format, -1 a forbidden index.
    pub bit_rate: i32,
    /// Sample rate in Hz, 0 for a reserved index.
    pub sample_rate: u32,
    pub channel_count: u8,
}

impl Mp3FrameHeader {
    /// Reads the header at the start of `frame`. Returns `None` when fewer
    /// than 4 bytes are available or the frame does not start with a sync
    /// byte.
    pub fn parse(frame: &[u8]) -> Option<Self> {
        let &[sync, b1, b2, b3, ..] = frame else {
            return None;
        };
        if sync != 0xff {
            return None;
        }

        let version = match (b1 >> 3) & 0x03 {
            0 => MpegVersion::Mpeg25,
            2 => MpegVersion::Mpeg2,
            3 => MpegVersion::Mpeg1,
            _ => MpegVersion::Reserved,
        };
        let layer_bits = (b1 & 0x06) >> 1;
        let bit_rate_index = (b2 >> 4) as usize;
        let sample_rate_index = ((b2 & 0x0c) >> 2) as usize;
        let channel_mode = (b3 >> 6) & 0x03;

        let sample_rate = match version {
            MpegVersion::Mpeg1 => MPEG_V1_SAMPLE_RATES[sample_rate_index],
            MpegVersion::Mpeg2 => MPEG_V2_SAMPLE_RATES[sample_rate_index],
            MpegVersion::Mpeg25 => MPEG_V25_SAMPLE_RATES[sample_rate_index],
            MpegVersion::Reserved => 0,
        };

        let (layer, bit_rate) = match layer_bits {
            1 => (3, LAYER3_BIT_RATES[bit_rate_index]),
            2 => (2, LAYER2_BIT_RATES[bit_rate_index]),
            3 => (1, LAYER1_BIT_RATES[bit_rate_index]),
            _ => (0, 0),
        };

        Some(Mp3FrameHeader {
            version,
            layer,
            bit_rate,
            sample_rate,
            // channel mode 3 is single channel
            channel_count: if channel_mode == 3 { 1 } else { 2 },
        })
    }
}

impl fmt::Display for Mp3FrameHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} Layer {} [{} Hz, {} kbps, {} ch]",
            self.version, self.layer, self.sample_rate, self.bit_rate, self.channel_count
        )
    }
}
