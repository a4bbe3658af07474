use std::io;

use byteorder::{BigEndian, ReadBytesExt};

/// Size of a tag header.
pub const TAG_HEADER_SIZE: usize = 11;

/// Size of the PreviousTagSize field after every tag.
pub const PREVIOUS_TAG_SIZE: usize = 4;

/// FLV Tag Type
///
/// Defined by:
/// - video_file_format_spec_v10.pdf (Chapter 1 - The FLV File Format - FLV tags)
/// - video_file_format_spec_v10_1.pdf (Annex E.4.1 - FLV Tag)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlvTagType {
    Audio,
    Video,
    ScriptData,
    Unknown(u8),
}

impl From<u8> for FlvTagType {
    fn from(value: u8) -> Self {
        match value {
            8 => FlvTagType::Audio,
            9 => FlvTagType::Video,
            18 => FlvTagType::ScriptData,
            _ => FlvTagType::Unknown(value),
        }
    }
}

/// The 11 byte header in front of every tag body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlvTagHeader {
    pub tag_type: FlvTagType,
    /// Size of the body that follows the header.
    pub data_size: u32,
    /// A timestamp in milliseconds
    pub timestamp_ms: u32,
    /// A stream id, expected to be 0.
    pub stream_id: u32,
}

impl FlvTagHeader {
    /// Reads a tag header. The reader must hold at least
    /// [`TAG_HEADER_SIZE`] bytes.
    pub fn parse(reader: &mut impl io::Read) -> io::Result<Self> {
        let tag_type = FlvTagType::from(reader.read_u8()?);
        let data_size = reader.read_u24::<BigEndian>()?;
        // 24 bit timestamp followed by the upper 8 bits
        let timestamp_ms = reader.read_u24::<BigEndian>()? | ((reader.read_u8()? as u32) << 24);
        let stream_id = reader.read_u24::<BigEndian>()?;

        Ok(FlvTagHeader {
            tag_type,
            data_size,
            timestamp_ms,
            stream_id,
        })
    }

    /// Header, body and trailing PreviousTagSize.
    pub const fn total_size(&self) -> usize {
        TAG_HEADER_SIZE + self.data_size as usize + PREVIOUS_TAG_SIZE
    }

    /// The value the trailing PreviousTagSize should carry.
    pub const fn expected_previous_tag_size(&self) -> u32 {
        TAG_HEADER_SIZE as u32 + self.data_size
    }
}
