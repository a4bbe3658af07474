use std::io;

use bytes_util::BitReader;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

/// Audio Object Type
/// ISO/IEC 14496-3:2019(E) - 1.5.1.1 (Table 1.17)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum AudioObjectType {
    /// AAC main
    AacMain,
    /// AAC LC
    AacLowComplexity,
    /// SBR, signalled explicitly as HE-AAC
    HeAac,
    /// Any other object type
    Unknown(u8),
}

impl AudioObjectType {
    /// Converts an AudioObjectType to a u8
    pub const fn as_u8(&self) -> u8 {
        match self {
            AudioObjectType::AacMain => 1,
            AudioObjectType::AacLowComplexity => 2,
            AudioObjectType::HeAac => 5,
            AudioObjectType::Unknown(value) => *value,
        }
    }

    /// Converts a u8 to an AudioObjectType
    pub const fn from_u8(value: u8) -> Self {
        match value {
            1 => AudioObjectType::AacMain,
            2 => AudioObjectType::AacLowComplexity,
            5 => AudioObjectType::HeAac,
            _ => AudioObjectType::Unknown(value),
        }
    }

    /// The RFC 6381 codec string, `mp4a.40.<type>`.
    pub fn codec_string(&self) -> String {
        format!("mp4a.40.{}", self.as_u8())
    }
}

impl From<u8> for AudioObjectType {
    fn from(value: u8) -> Self {
        Self::from_u8(value)
    }
}

/// Sampling Frequency Index
///
/// The purpose of the FrequencyIndex is to encode commonly used frequencies in
/// 4 bits to save space. These are the set of commonly used frequencies defined
/// in ISO/IEC 14496-3.
///
/// ISO/IEC 14496-3:2019(E) - 1.6.2.4 (Table 1.22)
#[derive(FromPrimitive, Debug, Clone, PartialEq, Copy, Eq, PartialOrd, Ord)]
#[repr(u8)]
#[must_use]
pub enum SampleFrequencyIndex {
    /// 96000 Hz
    Freq96000 = 0x0,
    /// 88200 Hz
    Freq88200 = 0x1,
    /// 64000 Hz
    Freq64000 = 0x2,
    /// 48000 Hz
    Freq48000 = 0x3,
    /// 44100 Hz
    Freq44100 = 0x4,
    /// 32000 Hz
    Freq32000 = 0x5,
    /// 24000 Hz
    Freq24000 = 0x6,
    /// 22050 Hz
    Freq22050 = 0x7,
    /// 16000 Hz
    Freq16000 = 0x8,
    /// 12000 Hz
    Freq12000 = 0x9,
    /// 11025 Hz
    Freq11025 = 0xA,
    /// 8000 Hz
    Freq8000 = 0xB,
    /// 7350 Hz
    Freq7350 = 0xC,
}

const FREQUENCIES: [u32; 13] = [
    96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000, 7350,
];

impl SampleFrequencyIndex {
    /// Convert the SampleFrequencyIndex to the actual frequency in Hz
    pub const fn to_freq(&self) -> u32 {
        FREQUENCIES[*self as usize]
    }

    /// Looks up the index of an exact frequency.
    pub fn from_freq(freq: u32) -> Option<Self> {
        let index = FREQUENCIES.iter().position(|&f| f == freq)?;
        Self::from_usize(index)
    }

    /// Looks up a raw 4-bit index. The reserved and escape values yield `None`.
    pub fn from_index(index: u8) -> Option<Self> {
        Self::from_u8(index)
    }
}

/// The leading fields of an AudioSpecificConfig.
/// ISO/IEC 14496-3:2019(E) - 1.6.2.1 (Table 1.19)
///
/// Escaped object types and explicit frequencies are not supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct AudioSpecificConfig {
    /// Audio Object Type, as found in the stream
    pub audio_object_type: AudioObjectType,
    /// Sampling Frequency Index
    pub sampling_frequency_index: SampleFrequencyIndex,
    /// Channel Configuration, 0 to 7
    pub channel_configuration: u8,
    /// The SBR sampling frequency index, present for HE-AAC
    pub extension_sampling_index: Option<u8>,
}

impl AudioSpecificConfig {
    /// Parse the Audio Specific Config from given bytes.
    ///
    /// Fails with [`io::ErrorKind::InvalidData`] for a sampling frequency
    /// index outside the table or a channel configuration of 8 or more.
    pub fn parse(data: &[u8]) -> io::Result<Self> {
        let mut bitreader = BitReader::new(data);

        let audio_object_type = AudioObjectType::from_u8(bitreader.read_bits(5)? as u8);

        let sampling_frequency_index = SampleFrequencyIndex::from_index(bitreader.read_bits(4)? as u8)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "AAC invalid sampling frequency index"))?;

        let channel_configuration = bitreader.read_bits(4)? as u8;
        if channel_configuration >= 8 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "AAC invalid channel configuration",
            ));
        }

        let extension_sampling_index = match audio_object_type {
            AudioObjectType::HeAac => Some(bitreader.read_bits(4)? as u8),
            _ => None,
        };

        Ok(Self {
            audio_object_type,
            sampling_frequency_index,
            channel_configuration,
            extension_sampling_index,
        })
    }

    /// Sampling frequency in Hz
    pub const fn sampling_frequency(&self) -> u32 {
        self.sampling_frequency_index.to_freq()
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_aac_config_parse() {
        let data = [
            0x12, 0x10, 0x56, 0xe5, 0x00, 0x2d, 0x96, 0x01, 0x80, 0x80, 0x05, 0x00, 0x00, 0x00, 0x00,
        ];

        let config = AudioSpecificConfig::parse(&data).unwrap();
        assert_eq!(config.audio_object_type, AudioObjectType::AacLowComplexity);
        assert_eq!(config.sampling_frequency(), 44100);
        assert_eq!(config.channel_configuration, 2);
        assert_eq!(config.extension_sampling_index, None);
    }

    #[test]
    fn test_he_aac_config_parse() {
        // aot 5, 24000 Hz, stereo, extension index 3 (48000 Hz)
        let config = AudioSpecificConfig::parse(&[0x2b, 0x11, 0x88]).unwrap();
        assert_eq!(config.audio_object_type, AudioObjectType::HeAac);
        assert_eq!(config.sampling_frequency_index, SampleFrequencyIndex::Freq24000);
        assert_eq!(config.channel_configuration, 2);
        assert_eq!(config.extension_sampling_index, Some(3));
    }

    #[test]
    fn test_aac_config_parse_errors() {
        // sampling index 13
        let err = AudioSpecificConfig::parse(&[0x16, 0x90]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert_eq!(err.to_string(), "AAC invalid sampling frequency index");

        // channel configuration 8
        let err = AudioSpecificConfig::parse(&[0x12, 0x40]).unwrap_err();
        assert_eq!(err.to_string(), "AAC invalid channel configuration");

        let err = AudioSpecificConfig::parse(&[0x12]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_idx_to_freq() {
        let cases = [
            (SampleFrequencyIndex::Freq7350, 7350),
            (SampleFrequencyIndex::Freq8000, 8000),
            (SampleFrequencyIndex::Freq11025, 11025),
            (SampleFrequencyIndex::Freq22050, 22050),
            (SampleFrequencyIndex::Freq44100, 44100),
            (SampleFrequencyIndex::Freq48000, 48000),
            (SampleFrequencyIndex::Freq96000, 96000),
        ];

        for (idx, freq) in cases {
            assert_eq!(freq, idx.to_freq(), "Expected frequency for {:?}", idx);
            assert_eq!(SampleFrequencyIndex::from_freq(freq), Some(idx));
        }

        assert_eq!(SampleFrequencyIndex::from_freq(5500), None);
        assert_eq!(SampleFrequencyIndex::from_index(13), None);
        assert_eq!(SampleFrequencyIndex::from_index(15), None);
    }

    #[test]
    fn test_codec_string() {
        assert_eq!(AudioObjectType::AacLowComplexity.codec_string(), "mp4a.40.2");
        assert_eq!(AudioObjectType::from_u8(29).codec_string(), "mp4a.40.29");
    }
}
