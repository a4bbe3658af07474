//! Byte stream front end of the demuxer.
//!
//! [`FlvStreamDemuxer`] accepts arbitrarily split chunks, keeps the partial
//! tag at the end of each chunk for the next call and publishes everything
//! it finds on an [`EventBus`]. Audio samples are turned into ADTS frames
//! (AAC) or passed through (MP3); video samples are rewritten from length
//! prefixed NAL units into Annex-B.

use aac::AdtsHeader;
use amf0::Amf0Object;
use bytes::{BufMut, Bytes, BytesMut};
use h264::START_CODE;

use crate::classifier::FrameType;
use crate::config::DemuxerConfig;
use crate::demuxer::{DemuxHandler, FlvDemuxer, MIN_FIRST_CHUNK};
use crate::error::{DemuxErrorKind, FlvError};
use crate::events::{Event, EventBus, EventKind};
use crate::header::ProbeResult;
use crate::media_info::MediaInfo;
use crate::track::{Sample, Track, TrackKind, TrackMetadata};

/// A decoder-ready sample.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaSample {
    pub dts: i64,
    pub pts: i64,
    /// Composition offset in milliseconds, 0 for audio.
    pub cts: i32,
    /// Always true for audio.
    pub keyframe: bool,
    pub frame_type: FrameType,
    /// Byte offset of the source tag, for video keyframes.
    pub file_position: Option<u64>,
    /// One ADTS frame, one MP3 frame, or an Annex-B access unit.
    pub data: Bytes,
}

/// How audio payloads are framed for decoders.
#[derive(Debug, Clone, Copy)]
enum AudioFraming {
    Adts(AdtsHeader),
    Raw,
}

/// Per-stream framing state learned from track metadata.
#[derive(Debug, Clone, Copy)]
struct Framing {
    audio: Option<AudioFraming>,
    nalu_length_size: u8,
}

impl Default for Framing {
    fn default() -> Self {
        Self {
            audio: None,
            nalu_length_size: 4,
        }
    }
}

/// Routes demuxer output onto the bus.
struct Publisher<'a> {
    bus: &'a EventBus,
    framing: &'a mut Framing,
}

impl Publisher<'_> {
    fn error(&self, kind: DemuxErrorKind, message: String) {
        self.bus.emit(&Event::Error { kind, message });
    }

    fn audio_samples(&self, samples: &[Sample]) -> Vec<MediaSample> {
        let Some(framing) = self.framing.audio else {
            tracing::debug!(count = samples.len(), "No audio framing, samples dropped");
            return Vec::new();
        };

        let mut out = Vec::with_capacity(samples.len());
        for sample in samples {
            let Sample::Audio(sample) = sample else {
                continue;
            };

            let data = match framing {
                AudioFraming::Raw => sample.unit.clone(),
                AudioFraming::Adts(header) => match header.wrap(&sample.unit) {
                    Ok(frame) => Bytes::from(frame),
                    Err(err) => {
                        let err = FlvError::from(err);
                        self.error(err.kind(), err.to_string());
                        continue;
                    }
                },
            };

            out.push(MediaSample {
                dts: sample.dts,
                pts: sample.pts,
                cts: 0,
                keyframe: true,
                frame_type: FrameType::Unknown,
                file_position: None,
                data,
            });
        }
        out
    }

    fn video_samples(&self, samples: &[Sample]) -> Vec<MediaSample> {
        let length_size = self.framing.nalu_length_size as usize;

        samples
            .iter()
            .filter_map(|sample| match sample {
                Sample::Video(sample) => Some(sample),
                Sample::Audio(_) => None,
            })
            .map(|sample| {
                let size = sample
                    .units
                    .iter()
                    .map(|unit| START_CODE.len() + unit.data.len().saturating_sub(length_size))
                    .sum();

                let mut data = BytesMut::with_capacity(size);
                for unit in &sample.units {
                    data.put_slice(&START_CODE);
                    data.put_slice(unit.data.get(length_size..).unwrap_or_default());
                }

                MediaSample {
                    dts: sample.dts,
                    pts: sample.pts,
                    cts: sample.cts,
                    keyframe: sample.keyframe,
                    frame_type: sample.frame_type,
                    file_position: sample.file_position,
                    data: data.freeze(),
                }
            })
            .collect()
    }

    fn publish_track(&self, track: &mut Track) {
        if !track.has_pending() {
            return;
        }

        let kind = track.kind;
        let samples = track.take_samples();

        if self.bus.has_listeners(EventKind::TrackData) {
            self.bus.emit(&Event::TrackData {
                track: kind,
                samples: samples.clone(),
            });
        }

        if self.bus.has_listeners(EventKind::MediaData) {
            let media = match kind {
                TrackKind::Audio => self.audio_samples(&samples),
                TrackKind::Video => self.video_samples(&samples),
            };
            if !media.is_empty() {
                self.bus.emit(&Event::MediaData {
                    track: kind,
                    samples: media,
                });
            }
        }
    }
}

impl DemuxHandler for Publisher<'_> {
    fn on_error(&mut self, kind: DemuxErrorKind, message: String) {
        self.error(kind, message);
    }

    fn on_media_info(&mut self, info: &MediaInfo) {
        if self.bus.has_listeners(EventKind::MediaInfo) {
            self.bus.emit(&Event::MediaInfo(info.clone()));
        }
    }

    fn on_track_metadata(&mut self, metadata: &TrackMetadata) {
        match metadata {
            TrackMetadata::Audio(meta) if meta.is_mp3() => self.framing.audio = Some(AudioFraming::Raw),
            TrackMetadata::Audio(meta) => {
                match AdtsHeader::new(meta.audio_sample_rate, meta.channel_count) {
                    Ok(header) => self.framing.audio = Some(AudioFraming::Adts(header)),
                    Err(err) => {
                        self.framing.audio = None;
                        let err = FlvError::from(err);
                        self.error(err.kind(), err.to_string());
                    }
                }
            }
            TrackMetadata::Video(meta) => self.framing.nalu_length_size = meta.nalu_length_size,
        }

        self.bus.emit(&Event::MetaData {
            track: metadata.kind(),
            metadata: metadata.clone(),
        });
    }

    fn on_data_available(&mut self, audio: &mut Track, video: &mut Track) {
        self.publish_track(audio);
        self.publish_track(video);
    }

    fn on_script_data(&mut self, data: &Amf0Object) {
        if self.bus.has_listeners(EventKind::ScriptData) {
            self.bus.emit(&Event::ScriptData(data.clone()));
        }
    }
}

/// Demuxes an FLV byte stream delivered in chunks of any size.
///
/// ```no_run
/// use flv::{DemuxerConfig, EventKind, FlvStreamDemuxer};
///
/// let mut demuxer = FlvStreamDemuxer::new(DemuxerConfig::default());
/// demuxer.events().subscribe(EventKind::MediaData, |event| println!("{event:?}"));
///
/// let data = std::fs::read("input.flv").unwrap();
/// for chunk in data.chunks(4096) {
///     demuxer.push(chunk).unwrap();
/// }
/// ```
#[derive(Debug)]
pub struct FlvStreamDemuxer {
    config: DemuxerConfig,
    bus: EventBus,
    demuxer: Option<FlvDemuxer>,
    carry: BytesMut,
    total_bytes: u64,
    framing: Framing,
}

impl FlvStreamDemuxer {
    pub fn new(config: DemuxerConfig) -> Self {
        Self {
            config,
            bus: EventBus::new(),
            demuxer: None,
            carry: BytesMut::new(),
            total_bytes: 0,
            framing: Framing::default(),
        }
    }

    /// The bus events are published on.
    pub fn events(&self) -> &EventBus {
        &self.bus
    }

    /// The media info gathered so far, once the header was recognized.
    pub fn media_info(&self) -> Option<&MediaInfo> {
        self.demuxer.as_ref().map(FlvDemuxer::media_info)
    }

    /// Bytes received since the start of the stream.
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Feeds the next chunk of the stream and returns how many buffered
    /// bytes were consumed. Bytes of an incomplete trailing tag are kept for
    /// the next call.
    ///
    /// Fails with [`FlvError::InvalidHeader`] when the stream does not start
    /// with an FLV header; an `Error` event of kind
    /// [`DemuxErrorKind::FormatUnsupported`] is published first.
    pub fn push(&mut self, data: &[u8]) -> Result<usize, FlvError> {
        let byte_start = self.total_bytes - self.carry.len() as u64;
        self.total_bytes += data.len() as u64;

        self.carry.extend_from_slice(data);
        let buffer = std::mem::take(&mut self.carry).freeze();

        if self.demuxer.is_none() {
            if buffer.len() <= MIN_FIRST_CHUNK {
                self.carry = BytesMut::from(&buffer[..]);
                return Ok(0);
            }

            let probe = ProbeResult::probe(&buffer);
            if !probe.matched {
                tracing::error!("Non-FLV, Unsupported media type");
                self.bus.emit(&Event::Error {
                    kind: DemuxErrorKind::FormatUnsupported,
                    message: "Non-FLV, Unsupported media type".to_string(),
                });
                return Err(FlvError::InvalidHeader);
            }

            tracing::debug!(
                has_audio = probe.has_audio,
                has_video = probe.has_video,
                config = %self.config,
                "FLV header recognized"
            );
            self.demuxer = Some(FlvDemuxer::new(probe, self.config.clone()));
        }
        let Some(demuxer) = self.demuxer.as_mut() else {
            return Err(FlvError::State("demuxer missing"));
        };

        let mut publisher = Publisher {
            bus: &self.bus,
            framing: &mut self.framing,
        };
        let consumed = match demuxer.parse_chunks(&buffer, byte_start, &mut publisher) {
            Ok(consumed) => consumed,
            Err(err) => {
                self.carry = BytesMut::from(&buffer[..]);
                return Err(err);
            }
        };

        if consumed < buffer.len() {
            self.carry = BytesMut::from(&buffer[consumed..]);
        }

        Ok(consumed)
    }

    /// Ends the stream: all state is released and the next
    /// [`push`](Self::push) starts a new stream. Listeners stay subscribed.
    pub fn stop(&mut self) {
        if let Some(mut demuxer) = self.demuxer.take() {
            demuxer.destroy();
        }
        self.carry.clear();
        self.total_bytes = 0;
        self.framing = Framing::default();
    }
}
