use std::collections::HashSet;
use std::fmt::Display;

use aac::AacObjectTypePolicy;
use h264::FrameRate;

/// Settings for one demuxing session.
#[derive(Debug, Clone)]
pub struct DemuxerConfig {
    /// Forced audio presence. When set, neither the header nor the
    /// `onMetaData` tag can change it.
    pub has_audio: Option<bool>,

    /// Forced video presence.
    pub has_video: Option<bool>,

    /// NAL unit types left out of assembled video samples.
    pub ignore_nalu_types: HashSet<u8>,

    /// Object type rewrite applied to every AudioSpecificConfig.
    pub aac_policy: AacObjectTypePolicy,

    /// Timestamp tolerance, in milliseconds, of the B/P frame heuristic.
    pub classifier_tolerance: f64,

    /// Frame rate assumed when neither the SPS nor the metadata carry one.
    pub reference_frame_rate: FrameRate,

    /// Added to every tag timestamp.
    pub timestamp_base: u32,

    /// Duration in milliseconds that takes precedence over the metadata.
    pub duration_override: Option<u32>,

    /// Ticks per second of track timestamps.
    pub timescale: u32,
}

impl Default for DemuxerConfig {
    fn default() -> Self {
        Self {
            has_audio: None,
            has_video: None,
            ignore_nalu_types: HashSet::new(),
            aac_policy: AacObjectTypePolicy::MatchSource,
            classifier_tolerance: 2.0,
            reference_frame_rate: FrameRate::FILM,
            timestamp_base: 0,
            duration_override: None,
            timescale: 1000,
        }
    }
}

impl Display for DemuxerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn presence(value: Option<bool>) -> &'static str {
            match value {
                Some(true) => "forced on",
                Some(false) => "forced off",
                None => "auto",
            }
        }

        write!(
            f,
            "DemuxerConfig {{ audio: {}, video: {}, ignored nalus: {:?}, aac policy: {:?}, tolerance: {}, timescale: {} }}",
            presence(self.has_audio),
            presence(self.has_video),
            self.ignore_nalu_types,
            self.aac_policy,
            self.classifier_tolerance,
            self.timescale
        )
    }
}

impl DemuxerConfig {
    pub fn with_has_audio(mut self, has_audio: bool) -> Self {
        self.has_audio = Some(has_audio);
        self
    }

    pub fn with_has_video(mut self, has_video: bool) -> Self {
        self.has_video = Some(has_video);
        self
    }

    pub fn with_ignore_nalu_types(mut self, types: impl IntoIterator<Item = u8>) -> Self {
        self.ignore_nalu_types = types.into_iter().collect();
        self
    }

    pub fn with_aac_policy(mut self, policy: AacObjectTypePolicy) -> Self {
        self.aac_policy = policy;
        self
    }

    /// Negative or non-finite values are ignored.
    pub fn with_classifier_tolerance(mut self, tolerance: f64) -> Self {
        if tolerance.is_finite() && tolerance >= 0.0 {
            self.classifier_tolerance = tolerance;
        }
        self
    }

    pub fn with_reference_frame_rate(mut self, frame_rate: FrameRate) -> Self {
        self.reference_frame_rate = frame_rate;
        self
    }

    pub fn with_timestamp_base(mut self, base: u32) -> Self {
        self.timestamp_base = base;
        self
    }

    pub fn with_duration_override(mut self, duration_ms: u32) -> Self {
        self.duration_override = Some(duration_ms);
        self
    }

    /// A zero timescale is ignored.
    pub fn with_timescale(mut self, timescale: u32) -> Self {
        if timescale > 0 {
            self.timescale = timescale;
        }
        self
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DemuxerConfig::default();
        assert_eq!(config.has_audio, None);
        assert_eq!(config.has_video, None);
        assert!(config.ignore_nalu_types.is_empty());
        assert_eq!(config.aac_policy, AacObjectTypePolicy::MatchSource);
        assert_eq!(config.classifier_tolerance, 2.0);
        assert_eq!(config.reference_frame_rate, FrameRate::FILM);
        assert_eq!(config.timescale, 1000);
    }

    #[test]
    fn test_builder() {
        let config = DemuxerConfig::default()
            .with_has_audio(false)
            .with_ignore_nalu_types([9, 12])
            .with_classifier_tolerance(-1.0)
            .with_timescale(0)
            .with_duration_override(90_000);

        assert_eq!(config.has_audio, Some(false));
        assert!(config.ignore_nalu_types.contains(&9));
        assert!(config.ignore_nalu_types.contains(&12));
        assert_eq!(config.classifier_tolerance, 2.0);
        assert_eq!(config.timescale, 1000);
        assert_eq!(config.duration_override, Some(90_000));
    }

    #[test]
    fn test_display() {
        let config = DemuxerConfig::default().with_has_video(true);
        let text = config.to_string();
        assert!(text.contains("audio: auto"));
        assert!(text.contains("video: forced on"));
    }
}
