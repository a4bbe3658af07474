use std::io::{self, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use bytes::{BufMut, Bytes, BytesMut};
use bytes_util::BytesCursorExt;

/// The 4-byte Annex B start code.
pub const START_CODE: [u8; 4] = [0x00, 0x00, 0x00, 0x01];

/// The AVC (H.264) Decoder Configuration Record.
/// ISO/IEC 14496-15:2022(E) - 5.3.2.1.2
///
/// Trailing High-profile extension fields are not read.
#[derive(Debug, Clone, PartialEq)]
pub struct AVCDecoderConfigurationRecord {
    /// The `configuration_version`, always 1.
    pub configuration_version: u8,

    /// The `profile_indication` (aka AVCProfileIndication) contains the `profile_idc` u8 from SPS.
    pub profile_indication: u8,

    /// The `profile_compatibility` byte, the constraint flags of the SPS.
    pub profile_compatibility: u8,

    /// The `level_indication` (aka AVCLevelIndication) contains the `level_idc` u8 from SPS.
    pub level_indication: u8,

    /// The `length_size_minus_one` is the u8 length of the NALUnitLength minus one.
    pub length_size_minus_one: u8,

    /// The non-empty SPS units, in record order.
    ///
    /// Refer to the [`crate::Sps`] struct in the SPS docs for more info.
    pub sps: Vec<Bytes>,

    /// The non-empty PPS units, in record order. These are carried along
    /// but never parsed.
    pub pps: Vec<Bytes>,
}

fn invalid(message: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message.into())
}

impl AVCDecoderConfigurationRecord {
    /// Parses an AVCDecoderConfigurationRecord from a byte stream.
    ///
    /// The record must have version 1, a non-zero profile, a NAL unit length
    /// size of 3 or 4 bytes, and at least one SPS and one PPS. Zero-length
    /// parameter sets are skipped.
    pub fn parse(reader: &mut io::Cursor<Bytes>) -> io::Result<Self> {
        let configuration_version = reader.read_u8()?;
        let profile_indication = reader.read_u8()?;
        if configuration_version != 1 || profile_indication == 0 {
            return Err(invalid("Invalid AVCDecoderConfigurationRecord"));
        }

        let profile_compatibility = reader.read_u8()?;
        let level_indication = reader.read_u8()?;

        let length_size_minus_one = reader.read_u8()? & 0b00000011;
        if length_size_minus_one != 3 && length_size_minus_one != 2 {
            return Err(invalid(format!(
                "Strange NaluLengthSizeMinusOne: {length_size_minus_one}"
            )));
        }

        let num_of_sequence_parameter_sets = reader.read_u8()? & 0b00011111;
        if num_of_sequence_parameter_sets == 0 {
            return Err(invalid("Invalid AVCDecoderConfigurationRecord: No SPS"));
        }
        if num_of_sequence_parameter_sets > 1 {
            tracing::debug!(count = num_of_sequence_parameter_sets, "Strange AVCDecoderConfigurationRecord: SPS count");
        }
        let sps = read_parameter_sets(reader, num_of_sequence_parameter_sets)?;

        let num_of_picture_parameter_sets = reader.read_u8()?;
        if num_of_picture_parameter_sets == 0 {
            return Err(invalid("Invalid AVCDecoderConfigurationRecord: No PPS"));
        }
        if num_of_picture_parameter_sets > 1 {
            tracing::debug!(count = num_of_picture_parameter_sets, "Strange AVCDecoderConfigurationRecord: PPS count");
        }
        let pps = read_parameter_sets(reader, num_of_picture_parameter_sets)?;

        Ok(AVCDecoderConfigurationRecord {
            configuration_version,
            profile_indication,
            profile_compatibility,
            level_indication,
            length_size_minus_one,
            sps,
            pps,
        })
    }

    /// Size in bytes of the length prefix in front of each NAL unit, 3 or 4.
    pub const fn nalu_length_size(&self) -> u8 {
        self.length_size_minus_one + 1
    }

    /// The RFC 6381 codec string built from the first SPS, e.g. `avc1.64001f`.
    pub fn codec_string(&self) -> Option<String> {
        let sps = self.sps.first()?;
        if sps.len() < 4 {
            return None;
        }

        Some(format!("avc1.{:02x}{:02x}{:02x}", sps[1], sps[2], sps[3]))
    }

    /// Every SPS then every PPS, each behind a 4-byte start code.
    pub fn annexb_parameter_sets(&self) -> Bytes {
        let size = self
            .sps
            .iter()
            .chain(self.pps.iter())
            .map(|unit| START_CODE.len() + unit.len())
            .sum();

        let mut out = BytesMut::with_capacity(size);
        for unit in self.sps.iter().chain(self.pps.iter()) {
            out.put_slice(&START_CODE);
            out.put_slice(unit);
        }
        out.freeze()
    }

    /// Builds the record into a byte stream.
    pub fn build(&self, writer: &mut impl io::Write) -> io::Result<()> {
        writer.write_u8(self.configuration_version)?;
        writer.write_u8(self.profile_indication)?;
        writer.write_u8(self.profile_compatibility)?;
        writer.write_u8(self.level_indication)?;
        writer.write_u8(0b1111_1100 | self.length_size_minus_one)?;

        writer.write_u8(0b1110_0000 | self.sps.len() as u8)?;
        for sps in &self.sps {
            writer.write_u16::<BigEndian>(sps.len() as u16)?;
            writer.write_all(sps)?;
        }

        writer.write_u8(self.pps.len() as u8)?;
        for pps in &self.pps {
            writer.write_u16::<BigEndian>(pps.len() as u16)?;
            writer.write_all(pps)?;
        }

        Ok(())
    }
}

fn read_parameter_sets(reader: &mut io::Cursor<Bytes>, count: u8) -> io::Result<Vec<Bytes>> {
    let mut sets = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let length = reader.read_u16::<BigEndian>()?;
        if length == 0 {
            continue;
        }
        sets.push(reader.extract_bytes(length as usize)?);
    }
    Ok(sets)
}
