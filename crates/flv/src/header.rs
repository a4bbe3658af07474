use std::io;

use byteorder::{BigEndian, ReadBytesExt};

/// Size of the fixed part of the header.
pub const FLV_HEADER_SIZE: usize = 9;

/// "FLV"
const FLV_SIGNATURE: u32 = 0x464C56;

/// The FLV file header, 9 bytes in total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlvHeader {
    // The version of the FLV file format, always 0x01
    pub version: u8,
    // TypeFlagsAudio
    pub has_audio: bool,
    // TypeFlagsVideo
    pub has_video: bool,
    // Offset of the first PreviousTagSize, at least 9
    pub data_offset: u32,
}

impl FlvHeader {
    /// Parses the FLV header from a byte stream.
    ///
    /// The reader is advanced past the 9 fixed bytes only. Fails with
    /// [`io::ErrorKind::InvalidData`] when the signature, version or data
    /// offset is wrong, and leaves the reader at its start position in that
    /// case.
    pub fn parse<R: AsRef<[u8]>>(reader: &mut io::Cursor<R>) -> io::Result<Self> {
        let start = reader.position();

        let header = Self::read_fields(reader);
        if header.is_err() {
            reader.set_position(start);
        }
        header
    }

    fn read_fields<R: AsRef<[u8]>>(reader: &mut io::Cursor<R>) -> io::Result<Self> {
        let signature = reader.read_u24::<BigEndian>()?;
        let version = reader.read_u8()?;
        if signature != FLV_SIGNATURE || version != 0x01 {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "Invalid FLV signature"));
        }

        let flags = reader.read_u8()?;
        let has_audio = flags & 0b00000100 != 0;
        let has_video = flags & 0b00000001 != 0;

        let data_offset = reader.read_u32::<BigEndian>()?;
        if (data_offset as usize) < FLV_HEADER_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid FLV header size: {data_offset}"),
            ));
        }

        Ok(FlvHeader {
            version,
            has_audio,
            has_video,
            data_offset,
        })
    }
}

/// Outcome of looking at the first bytes of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProbeResult {
    /// Whether the bytes are an FLV header.
    pub matched: bool,
    /// Bytes taken by the header, the start of the first PreviousTagSize.
    pub consumed: usize,
    /// Declared audio presence.
    pub has_audio: bool,
    /// Declared video presence.
    pub has_video: bool,
}

impl ProbeResult {
    /// Checks whether `data` starts with an FLV header. Never fails: anything
    /// that is not a complete, valid header is reported as not matching.
    pub fn probe(data: &[u8]) -> Self {
        match FlvHeader::parse(&mut io::Cursor::new(data)) {
            Ok(header) => ProbeResult {
                matched: true,
                consumed: header.data_offset as usize,
                has_audio: header.has_audio,
                has_video: header.has_video,
            },
            Err(_) => ProbeResult::default(),
        }
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use std::io::Cursor;

    use byteorder::{BigEndian, WriteBytesExt};
    use bytes::{BufMut, BytesMut};

    use super::*;

    fn header_bytes(signature: &[u8], flags: u8, data_offset: u32) -> Vec<u8> {
        let mut buffer = BytesMut::new();
        buffer.put_slice(signature);
        buffer.put_u8(0x01);
        buffer.put_u8(flags);

        let mut writer = buffer.writer();
        writer.write_u32::<BigEndian>(data_offset).unwrap();
        writer.into_inner().to_vec()
    }

    #[test]
    fn test_valid_flv_header() {
        let bytes = header_bytes(b"FLV", 0x05, 9);
        let mut reader = Cursor::new(bytes);

        let header = FlvHeader::parse(&mut reader).unwrap();

        assert_eq!(header.version, 0x01);
        assert!(header.has_audio);
        assert!(header.has_video);
        assert_eq!(header.data_offset, 9);
        assert_eq!(reader.position(), 9);
    }

    #[test]
    fn test_invalid_flv_signature() {
        let bytes = header_bytes(b"ABC", 0x05, 9);
        let mut reader = Cursor::new(bytes);

        assert!(FlvHeader::parse(&mut reader).is_err());
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_header_with_audio_only() {
        let header = FlvHeader::parse(&mut Cursor::new(header_bytes(b"FLV", 0x04, 9))).unwrap();

        assert!(header.has_audio);
        assert!(!header.has_video);
    }

    #[test]
    fn test_header_with_video_only() {
        let header = FlvHeader::parse(&mut Cursor::new(header_bytes(b"FLV", 0x01, 9))).unwrap();

        assert!(!header.has_audio);
        assert!(header.has_video);
    }

    #[test]
    fn test_invalid_data_offset() {
        let result = FlvHeader::parse(&mut Cursor::new(header_bytes(b"FLV", 0x05, 4)));
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_probe() {
        let probe = ProbeResult::probe(&header_bytes(b"FLV", 0x05, 9));
        assert_eq!(
            probe,
            ProbeResult {
                matched: true,
                consumed: 9,
                has_audio: true,
                has_video: true,
            }
        );

        // Extended headers are skipped as a whole
        let probe = ProbeResult::probe(&header_bytes(b"FLV", 0x01, 13));
        assert!(probe.matched);
        assert_eq!(probe.consumed, 13);

        assert!(!ProbeResult::probe(b"FLV").matched);
        assert!(!ProbeResult::probe(&header_bytes(b"FLX", 0x05, 9)).matched);
    }
}
