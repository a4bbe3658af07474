use crate::{AudioObjectType, AudioSpecificConfig};

/// Platform profiles of the legacy object type rewrite table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompatTarget {
    /// HE-AAC below 24 kHz, LC otherwise.
    Firefox,
    /// Always LC.
    Android,
    /// HE-AAC, except LC for mono at 24 kHz and above.
    Generic,
}

/// How the object type of an AudioSpecificConfig is rewritten before it is
/// handed to a decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AacObjectTypePolicy {
    /// Always signal HE-AAC (SBR).
    PreferHeAac,
    /// Always signal AAC LC.
    PreferLcAac,
    /// Keep the object type found in the stream.
    #[default]
    MatchSource,
    /// The legacy per-platform table.
    Compat(CompatTarget),
}

/// An AudioSpecificConfig after the object type policy was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAudioConfig {
    /// Object type signalled to the decoder.
    pub audio_object_type: AudioObjectType,
    /// Object type found in the stream.
    pub original_object_type: AudioObjectType,
    /// SBR sampling index written into the config, for HE-AAC.
    pub extension_sampling_index: u8,
    /// The rewritten config bytes, 2 bytes for LC and 4 for HE-AAC.
    pub config: Vec<u8>,
}

impl ResolvedAudioConfig {
    /// Codec string for the signalled object type.
    pub fn codec(&self) -> String {
        self.audio_object_type.codec_string()
    }

    /// Codec string for the object type found in the stream.
    pub fn original_codec(&self) -> String {
        self.original_object_type.codec_string()
    }
}

/// SBR index for an HE-AAC rewrite: one octave above the core rate when the
/// core runs at 24 kHz or below.
const fn doubled_rate_index(index: u8) -> u8 {
    if index >= 6 { index - 3 } else { index }
}

impl AacObjectTypePolicy {
    /// Applies the policy to a parsed config.
    pub fn resolve(&self, source: &AudioSpecificConfig) -> ResolvedAudioConfig {
        let index = source.sampling_frequency_index as u8;
        let channels = source.channel_configuration;

        let (audio_object_type, extension_sampling_index) = match self {
            Self::PreferHeAac => (AudioObjectType::HeAac, doubled_rate_index(index)),
            Self::PreferLcAac => (AudioObjectType::AacLowComplexity, index),
            Self::MatchSource => (
                source.audio_object_type,
                source.extension_sampling_index.unwrap_or(index),
            ),
            Self::Compat(CompatTarget::Firefox) => {
                if index >= 6 {
                    (AudioObjectType::HeAac, index - 3)
                } else {
                    (AudioObjectType::AacLowComplexity, index)
                }
            }
            Self::Compat(CompatTarget::Android) => (AudioObjectType::AacLowComplexity, index),
            Self::Compat(CompatTarget::Generic) => {
                if index >= 6 {
                    (AudioObjectType::HeAac, index - 3)
                } else if channels == 1 {
                    (AudioObjectType::AacLowComplexity, index)
                } else {
                    (AudioObjectType::HeAac, index)
                }
            }
        };

        ResolvedAudioConfig {
            audio_object_type,
            original_object_type: source.audio_object_type,
            extension_sampling_index,
            config: build_config(audio_object_type, index, channels, extension_sampling_index),
        }
    }
}

/// Writes the config bytes; HE-AAC carries the extension index and LC as
/// the extension object type.
fn build_config(object_type: AudioObjectType, index: u8, channels: u8, extension_index: u8) -> Vec<u8> {
    let object_type = object_type.as_u8();
    let index = index & 0x0f;

    let mut config = vec![
        ((object_type & 0x1f) << 3) | (index >> 1),
        ((index & 0x01) << 7) | ((channels & 0x0f) << 3),
    ];

    if object_type == AudioObjectType::HeAac.as_u8() {
        let extension_index = extension_index & 0x0f;
        config[1] |= extension_index >> 1;
        config.push(((extension_index & 0x01) << 7) | (2 << 2));
        config.push(0);
    }

    config
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    fn lc(bytes: [u8; 2]) -> AudioSpecificConfig {
        AudioSpecificConfig::parse(&bytes).unwrap()
    }

    // 44100 Hz stereo
    const LC_44100_STEREO: [u8; 2] = [0x12, 0x10];
    // 22050 Hz stereo
    const LC_22050_STEREO: [u8; 2] = [0x13, 0x90];
    // 44100 Hz mono
    const LC_44100_MONO: [u8; 2] = [0x12, 0x08];

    #[test]
    fn test_match_source_keeps_config() {
        let resolved = AacObjectTypePolicy::MatchSource.resolve(&lc(LC_44100_STEREO));
        assert_eq!(resolved.config, LC_44100_STEREO);
        assert_eq!(resolved.codec(), "mp4a.40.2");
        assert_eq!(resolved.original_codec(), "mp4a.40.2");
    }

    #[test]
    fn test_match_source_he_aac() {
        let source = AudioSpecificConfig::parse(&[0x2b, 0x11, 0x88]).unwrap();
        let resolved = AacObjectTypePolicy::MatchSource.resolve(&source);
        assert_eq!(resolved.extension_sampling_index, 3);
        assert_eq!(resolved.config, [0x2b, 0x11, 0x88, 0x00]);
        assert_eq!(resolved.codec(), "mp4a.40.5");
    }

    #[test]
    fn test_prefer_policies() {
        let resolved = AacObjectTypePolicy::PreferHeAac.resolve(&lc(LC_22050_STEREO));
        assert_eq!(resolved.audio_object_type, AudioObjectType::HeAac);
        assert_eq!(resolved.extension_sampling_index, 4);
        assert_eq!(resolved.config, [0x2b, 0x92, 0x08, 0x00]);
        assert_eq!(resolved.original_codec(), "mp4a.40.2");

        let resolved = AacObjectTypePolicy::PreferLcAac.resolve(&lc(LC_22050_STEREO));
        assert_eq!(resolved.config, LC_22050_STEREO);
    }

    #[test]
    fn test_compat_table() {
        let cases = [
            (CompatTarget::Firefox, LC_22050_STEREO, AudioObjectType::HeAac, 4),
            (CompatTarget::Firefox, LC_44100_STEREO, AudioObjectType::AacLowComplexity, 4),
            (CompatTarget::Android, LC_22050_STEREO, AudioObjectType::AacLowComplexity, 7),
            (CompatTarget::Generic, LC_22050_STEREO, AudioObjectType::HeAac, 4),
            (CompatTarget::Generic, LC_44100_MONO, AudioObjectType::AacLowComplexity, 4),
            (CompatTarget::Generic, LC_44100_STEREO, AudioObjectType::HeAac, 4),
        ];

        for (target, bytes, object_type, extension_index) in cases {
            let resolved = AacObjectTypePolicy::Compat(target).resolve(&lc(bytes));
            assert_eq!(resolved.audio_object_type, object_type, "{target:?} {bytes:02x?}");
            assert_eq!(resolved.extension_sampling_index, extension_index, "{target:?} {bytes:02x?}");

            let expected_len = if object_type == AudioObjectType::HeAac { 4 } else { 2 };
            assert_eq!(resolved.config.len(), expected_len);
        }
    }

    #[test]
    fn test_generic_he_aac_at_44100() {
        let resolved = AacObjectTypePolicy::Compat(CompatTarget::Generic).resolve(&lc(LC_44100_STEREO));
        // 00101 0100 0010 0100 0 00010 00
        assert_eq!(resolved.config, [0x2a, 0x12, 0x08, 0x00]);
    }
}
