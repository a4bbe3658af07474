use amf0::Amf0Object;

/// Seek table taken from the `keyframes` object of `onMetaData`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct KeyframesIndex {
    /// Keyframe times in milliseconds, ascending.
    pub times: Vec<i64>,
    /// Byte offset of each keyframe tag.
    pub file_positions: Vec<u64>,
}

/// A lookup result of [`MediaInfo::nearest_keyframe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NearestKeyframe {
    pub index: usize,
    pub milliseconds: i64,
    pub file_position: u64,
}

/// Everything known about the stream as a whole.
///
/// Fields are filled in as tags arrive; `None` means not known yet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MediaInfo {
    pub mime_type: Option<String>,
    /// Duration in milliseconds.
    pub duration: Option<u64>,
    pub has_audio: Option<bool>,
    pub has_video: Option<bool>,
    pub audio_codec: Option<String>,
    pub video_codec: Option<String>,
    pub audio_data_rate: Option<f64>,
    pub video_data_rate: Option<f64>,
    pub audio_sample_rate: Option<u32>,
    pub audio_channel_count: Option<u8>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fps: Option<f64>,
    pub profile: Option<String>,
    pub level: Option<String>,
    pub ref_frames: Option<u32>,
    pub chroma_format: Option<String>,
    pub sar_num: Option<u16>,
    pub sar_den: Option<u16>,
    /// The `onMetaData` object, without its `keyframes` entry.
    pub metadata: Option<Amf0Object>,
    pub has_keyframes_index: Option<bool>,
    pub keyframes_index: Option<KeyframesIndex>,
}

impl MediaInfo {
    /// Whether every field needed for the declared tracks is known.
    ///
    /// A track declared absent (`Some(false)`) needs nothing; a track whose
    /// presence is still unknown blocks completeness.
    pub fn is_complete(&self) -> bool {
        let audio_complete = match self.has_audio {
            Some(false) => true,
            Some(true) => {
                self.audio_codec.is_some() && self.audio_sample_rate.is_some() && self.audio_channel_count.is_some()
            }
            None => false,
        };

        let video_complete = match self.has_video {
            Some(false) => true,
            Some(true) => {
                self.video_codec.is_some()
                    && self.width.is_some()
                    && self.height.is_some()
                    && self.fps.is_some()
                    && self.profile.is_some()
                    && self.level.is_some()
                    && self.ref_frames.is_some()
                    && self.chroma_format.is_some()
                    && self.sar_num.is_some()
                    && self.sar_den.is_some()
            }
            None => false,
        };

        // the keyframes index itself is optional
        self.mime_type.is_some()
            && self.duration.is_some()
            && self.metadata.is_some()
            && self.has_keyframes_index.is_some()
            && audio_complete
            && video_complete
    }

    /// Whether a seek table is available.
    pub fn is_seekable(&self) -> bool {
        self.has_keyframes_index == Some(true)
    }

    /// The last keyframe at or before `milliseconds`, or the first keyframe
    /// when `milliseconds` precedes all of them.
    pub fn nearest_keyframe(&self, milliseconds: i64) -> Option<NearestKeyframe> {
        let table = self.keyframes_index.as_ref()?;
        if table.times.is_empty() {
            return None;
        }

        // number of keyframes at or before the target
        let at_or_before = table.times.partition_point(|&time| time <= milliseconds);
        let index = at_or_before.saturating_sub(1);

        Some(NearestKeyframe {
            index,
            milliseconds: table.times[index],
            file_position: table.file_positions.get(index).copied().unwrap_or_default(),
        })
    }

    /// Rebuilds the mime type from the known codecs. With both tracks
    /// present the type is only set once both codecs are known.
    pub(crate) fn update_mime_type(&mut self) {
        let codecs = match (self.has_audio, self.has_video) {
            (Some(true), Some(true)) => match (&self.video_codec, &self.audio_codec) {
                (Some(video), Some(audio)) => format!("{video},{audio}"),
                _ => return,
            },
            (_, Some(true)) => match &self.video_codec {
                Some(video) => video.clone(),
                None => return,
            },
            _ => match &self.audio_codec {
                Some(audio) => audio.clone(),
                None => return,
            },
        };

        self.mime_type = Some(format!("video/x-flv; codecs=\"{codecs}\""));
    }
}
