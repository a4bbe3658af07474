use std::io;

use byteorder::{BigEndian, ReadBytesExt};
use bytes::Bytes;

use crate::track::NaluUnit;

/// FLV Video Codec ID
///
/// Only AVC is demuxed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoCodecId {
    Avc,
    Other(u8),
}

impl From<u8> for VideoCodecId {
    fn from(value: u8) -> Self {
        match value {
            7 => VideoCodecId::Avc,
            _ => VideoCodecId::Other(value),
        }
    }
}

/// The first byte of every video tag body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoTagHeader {
    /// `FrameType`, 1 for keyframes.
    pub frame_type: u8,
    pub codec_id: VideoCodecId,
}

impl VideoTagHeader {
    pub fn parse(byte: u8) -> Self {
        VideoTagHeader {
            frame_type: byte >> 4,
            codec_id: VideoCodecId::from(byte & 0x0f),
        }
    }

    pub fn is_keyframe(&self) -> bool {
        self.frame_type == 1
    }
}

/// FLV AVC Packet Type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvcPacketType {
    SequenceHeader,
    Nalu,
    EndOfSequence,
    Unknown(u8),
}

impl From<u8> for AvcPacketType {
    fn from(value: u8) -> Self {
        match value {
            0 => AvcPacketType::SequenceHeader,
            1 => AvcPacketType::Nalu,
            2 => AvcPacketType::EndOfSequence,
            _ => AvcPacketType::Unknown(value),
        }
    }
}

/// Size of the AVC packet type and composition time fields.
pub const AVC_PACKET_HEADER_SIZE: usize = 4;

/// The AVCVIDEOPACKET header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvcPacketHeader {
    pub packet_type: AvcPacketType,
    /// Composition time offset in milliseconds, a signed 24-bit value.
    pub composition_time: i32,
}

impl AvcPacketHeader {
    pub fn parse(reader: &mut impl io::Read) -> io::Result<Self> {
        let packet_type = AvcPacketType::from(reader.read_u8()?);
        let composition_time = reader.read_i24::<BigEndian>()?;

        Ok(AvcPacketHeader {
            packet_type,
            composition_time,
        })
    }
}

/// Splits length-prefixed NAL units.
///
/// A trailing fragment too short to hold a length prefix and a header byte
/// ends the split. A unit whose declared length runs past the end of `data`
/// fails the whole split with [`io::ErrorKind::UnexpectedEof`].
pub fn split_nalus(data: &Bytes, length_size: u8) -> io::Result<Vec<NaluUnit>> {
    let length_size = length_size as usize;
    let size = data.len();
    let mut units = Vec::new();
    let mut offset = 0;

    while offset < size {
        if offset + 4 >= size {
            tracing::debug!(offset, size, "Malformed Nalu, trailing bytes ignored");
            break;
        }

        let mut prefix = &data[offset..offset + length_size];
        let nalu_size = match length_size {
            3 => prefix.read_u24::<BigEndian>()?,
            _ => prefix.read_u32::<BigEndian>()?,
        } as usize;

        let end = offset + length_size + nalu_size;
        if end > size {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("NaluSize {nalu_size} > DataSize {}", size - offset - length_size),
            ));
        }

        units.push(NaluUnit {
            unit_type: data[offset + length_size] & 0x1f,
            data: data.slice(offset..end),
        });

        offset = end;
    }

    Ok(units)
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_video_tag_header() {
        let header = VideoTagHeader::parse(0x17);
        assert!(header.is_keyframe());
        assert_eq!(header.codec_id, VideoCodecId::Avc);

        let header = VideoTagHeader::parse(0x2c);
        assert!(!header.is_keyframe());
        assert_eq!(header.codec_id, VideoCodecId::Other(12));
    }

    #[test]
    fn test_avc_packet_header() {
        let header = AvcPacketHeader::parse(&mut &[0x01, 0x00, 0x00, 0x50][..]).unwrap();
        assert_eq!(header.packet_type, AvcPacketType::Nalu);
        assert_eq!(header.composition_time, 80);

        // -40 as a 24-bit two's complement value
        let header = AvcPacketHeader::parse(&mut &[0x01, 0xff, 0xff, 0xd8][..]).unwrap();
        assert_eq!(header.composition_time, -40);

        let header = AvcPacketHeader::parse(&mut &[0x05, 0x00, 0x00, 0x00][..]).unwrap();
        assert_eq!(header.packet_type, AvcPacketType::Unknown(5));
    }

    #[test]
    fn test_split_nalus() {
        let data = Bytes::from_static(&[
            0x00, 0x00, 0x00, 0x02, 0x09, 0xf0, // AUD
            0x00, 0x00, 0x00, 0x03, 0x65, 0x88, 0x84, // IDR slice
        ]);

        let units = split_nalus(&data, 4).unwrap();
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].unit_type, 9);
        assert_eq!(units[0].data.as_ref(), &data[..6]);
        assert_eq!(units[1].unit_type, 5);
        assert_eq!(units[1].data.len(), 7);
    }

    #[test]
    fn test_split_nalus_three_byte_length() {
        let data = Bytes::from_static(&[0x00, 0x00, 0x03, 0x41, 0x9a, 0x02, 0x00, 0x00, 0x02, 0x41, 0x9b]);

        let units = split_nalus(&data, 3).unwrap();
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].unit_type, 1);
        assert_eq!(units[0].data.len(), 6);
        assert_eq!(units[1].data.as_ref(), &[0x00, 0x00, 0x02, 0x41, 0x9b]);
    }

    #[test]
    fn test_split_nalus_overrun() {
        let data = Bytes::from_static(&[0x00, 0x00, 0x00, 0x09, 0x65, 0x88]);
        let err = split_nalus(&data, 4).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_split_nalus_trailing_fragment() {
        let data = Bytes::from_static(&[0x00, 0x00, 0x00, 0x01, 0x09, 0x00, 0x00]);
        let units = split_nalus(&data, 4).unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].unit_type, 9);
    }
}
