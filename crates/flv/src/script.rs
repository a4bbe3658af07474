use amf0::{Amf0Object, Amf0Value};

use crate::media_info::KeyframesIndex;

/// The name of the script data entry describing the stream.
pub const ON_METADATA: &str = "onMetaData";

/// The fields of an `onMetaData` object the demuxer acts on.
///
/// Entries with an unexpected AMF type are treated as absent.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OnMetaData {
    pub has_audio: Option<bool>,
    pub has_video: Option<bool>,
    pub audio_data_rate: Option<f64>,
    pub video_data_rate: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    /// Duration in seconds.
    pub duration: Option<f64>,
    pub frame_rate: Option<f64>,
    pub keyframes: Option<KeyframesIndex>,
    /// The object itself, with `keyframes` replaced by null.
    pub object: Amf0Object,
}

impl OnMetaData {
    /// Reads the known fields of `object`. Keyframe times are converted to
    /// milliseconds and shifted by `timestamp_base`.
    pub fn parse(object: &Amf0Object, timestamp_base: u32) -> Self {
        let number = |key: &str| object.get(key).and_then(Amf0Value::as_number);
        let boolean = |key: &str| object.get(key).and_then(Amf0Value::as_bool);

        let keyframes = object
            .get("keyframes")
            .and_then(Amf0Value::as_object)
            .map(|keyframes| parse_keyframes_index(keyframes, timestamp_base));

        let mut stripped = object.clone();
        if keyframes.is_some() {
            stripped.insert("keyframes", Amf0Value::Null);
        }

        OnMetaData {
            has_audio: boolean("hasAudio"),
            has_video: boolean("hasVideo"),
            audio_data_rate: number("audiodatarate"),
            video_data_rate: number("videodatarate"),
            width: number("width"),
            height: number("height"),
            duration: number("duration"),
            frame_rate: number("framerate"),
            keyframes,
            object: stripped,
        }
    }
}

/// Builds the seek table from the `times` / `filepositions` arrays.
///
/// The first entry points at the AVC sequence header rather than a frame and
/// is skipped. Non-numeric entries end the table.
pub fn parse_keyframes_index(keyframes: &Amf0Object, timestamp_base: u32) -> KeyframesIndex {
    let array = |key: &str| keyframes.get(key).and_then(Amf0Value::as_array).unwrap_or_default();
    let times = array("times");
    let file_positions = array("filepositions");

    let mut index = KeyframesIndex::default();
    for (time, position) in times.iter().zip(file_positions).skip(1) {
        let (Some(time), Some(position)) = (time.as_number(), position.as_number()) else {
            tracing::debug!("Non-numeric keyframes entry, index truncated");
            break;
        };

        index.times.push(timestamp_base as i64 + (time * 1000.0).floor() as i64);
        index.file_positions.push(position as u64);
    }

    index
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    fn numbers(values: &[f64]) -> Amf0Value {
        Amf0Value::StrictArray(values.iter().copied().map(Amf0Value::Number).collect())
    }

    #[test]
    fn test_parse_keyframes_index() {
        let keyframes: Amf0Object = [
            ("times", numbers(&[0.0, 0.0, 2.0005, 4.5])),
            ("filepositions", numbers(&[13.0, 520.0, 90_210.0, 180_400.0])),
        ]
        .into_iter()
        .collect();

        let index = parse_keyframes_index(&keyframes, 100);
        assert_eq!(index.times, [100, 2100, 4600]);
        assert_eq!(index.file_positions, [520, 90_210, 180_400]);
    }

    #[test]
    fn test_parse_keyframes_index_missing_arrays() {
        let index = parse_keyframes_index(&Amf0Object::new(), 0);
        assert!(index.times.is_empty());
        assert!(index.file_positions.is_empty());
    }

    #[test]
    fn test_parse_on_metadata() {
        let object: Amf0Object = [
            ("duration", Amf0Value::Number(12.5)),
            ("width", Amf0Value::Number(1280.0)),
            ("height", Amf0Value::Number(720.0)),
            ("framerate", Amf0Value::Number(29.97)),
            ("hasAudio", Amf0Value::Boolean(true)),
            ("hasVideo", Amf0Value::String("yes".into())),
            (
                "keyframes",
                Amf0Value::Object(
                    [("times", numbers(&[0.0, 1.0])), ("filepositions", numbers(&[9.0, 400.0]))]
                        .into_iter()
                        .collect(),
                ),
            ),
        ]
        .into_iter()
        .collect();

        let metadata = OnMetaData::parse(&object, 0);
        assert_eq!(metadata.duration, Some(12.5));
        assert_eq!(metadata.width, Some(1280.0));
        assert_eq!(metadata.frame_rate, Some(29.97));
        assert_eq!(metadata.has_audio, Some(true));
        assert_eq!(metadata.has_video, None);
        assert_eq!(metadata.audio_data_rate, None);
        assert_eq!(metadata.keyframes.unwrap().times, [1000]);
        assert_eq!(metadata.object.get("keyframes"), Some(&Amf0Value::Null));
        assert_eq!(metadata.object.len(), object.len());
    }
}
