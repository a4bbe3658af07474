use crate::SampleFrequencyIndex;

/// Length of an ADTS header without CRC.
pub const ADTS_HEADER_LEN: usize = 7;

const MAX_FRAME_LEN: usize = (1 << 13) - 1;

/// Errors that can occur when building an ADTS header.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AdtsError {
    /// The sampling rate has no sampling frequency index.
    #[error("unsupported sample rate: {0}")]
    UnsupportedSampleRate(u32),
    /// Header plus payload does not fit the 13-bit frame length field.
    #[error("frame of {0} bytes does not fit in an ADTS header")]
    FrameTooLarge(usize),
}

/// The fixed part of an ADTS header for one audio stream.
/// ISO/IEC 14496-3:2019(E) - 1.A.2.2
///
/// Frames are always signalled as AAC LC, without CRC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdtsHeader {
    /// Sampling frequency index.
    pub sampling_frequency_index: SampleFrequencyIndex,
    /// Channel configuration.
    pub channel_configuration: u8,
}

impl AdtsHeader {
    // profile field, object type minus one
    const PROFILE_LC: u8 = 1;

    /// Creates the header for a stream, looking the rate up in the
    /// sampling frequency table.
    pub fn new(sample_rate: u32, channel_configuration: u8) -> Result<Self, AdtsError> {
        let sampling_frequency_index =
            SampleFrequencyIndex::from_freq(sample_rate).ok_or(AdtsError::UnsupportedSampleRate(sample_rate))?;

        Ok(Self {
            sampling_frequency_index,
            channel_configuration,
        })
    }

    /// Encodes the 7 header bytes for a payload of `payload_len` bytes.
    pub fn encode(&self, payload_len: usize) -> Result<[u8; ADTS_HEADER_LEN], AdtsError> {
        let frame_len = payload_len + ADTS_HEADER_LEN;
        if frame_len > MAX_FRAME_LEN {
            return Err(AdtsError::FrameTooLarge(frame_len));
        }

        let index = self.sampling_frequency_index as u8;
        let channels = self.channel_configuration;
        let frame_len = frame_len as u16;

        Ok([
            0xff,
            0xf1,
            ((Self::PROFILE_LC << 6) & 0xc0) | ((index << 2) & 0x3c) | ((channels >> 2) & 0x01),
            ((channels << 6) & 0xc0) | ((frame_len >> 11) as u8 & 0x03),
            (frame_len >> 3) as u8,
            (((frame_len << 5) as u8) & 0xe0) | 0x1f,
            0xfc,
        ])
    }

    /// Returns a new buffer holding the header followed by `payload`.
    pub fn wrap(&self, payload: &[u8]) -> Result<Vec<u8>, AdtsError> {
        let header = self.encode(payload.len())?;

        let mut frame = Vec::with_capacity(ADTS_HEADER_LEN + payload.len());
        frame.extend_from_slice(&header);
        frame.extend_from_slice(payload);
        Ok(frame)
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_encode_44100_stereo() {
        let header = AdtsHeader::new(44100, 2).unwrap();
        // 100 byte payload, frame length 107
        assert_eq!(header.encode(100).unwrap(), [0xff, 0xf1, 0x50, 0x80, 0x0d, 0x7f, 0xfc]);
    }

    #[test]
    fn test_encode_48000_mono() {
        let header = AdtsHeader::new(48000, 1).unwrap();
        assert_eq!(header.encode(0).unwrap(), [0xff, 0xf1, 0x4c, 0x40, 0x00, 0xff, 0xfc]);
    }

    #[test]
    fn test_encode_channel_high_bit() {
        // 7.1 sets the bit carried in the third byte
        let header = AdtsHeader::new(48000, 7).unwrap();
        let bytes = header.encode(8184).unwrap();
        assert_eq!(bytes[2], 0x4d);
        assert_eq!(bytes[3], 0xc3);
        assert_eq!(bytes[4], 0xff);
        assert_eq!(bytes[5], 0xff);
    }

    #[test]
    fn test_wrap() {
        let header = AdtsHeader::new(22050, 2).unwrap();
        let frame = header.wrap(&[0xaa, 0xbb]).unwrap();
        assert_eq!(frame.len(), 9);
        assert_eq!(&frame[..2], [0xff, 0xf1]);
        assert_eq!(&frame[7..], [0xaa, 0xbb]);
    }

    #[test]
    fn test_errors() {
        assert_eq!(AdtsHeader::new(5500, 2), Err(AdtsError::UnsupportedSampleRate(5500)));
        assert_eq!(
            AdtsHeader::new(44100, 2).unwrap().encode(8185),
            Err(AdtsError::FrameTooLarge(8192))
        );
        assert_eq!(
            AdtsError::UnsupportedSampleRate(5500).to_string(),
            "unsupported sample rate: 5500"
        );
    }
}
