//! The FLV tag loop.
//!
//! [`FlvDemuxer::parse_chunks`] walks as many complete tags as a buffer
//! holds, routes their bodies to the audio, video and script data parsers,
//! and hands pending samples to a [`DemuxHandler`] once every declared track
//! has been configured.

use std::io;

use amf0::Amf0Object;
use byteorder::{BigEndian, ReadBytesExt};
use bytes::Bytes;
use h264::{AVCDecoderConfigurationRecord, FrameRate, Sps};

use crate::audio::{AacPacketType, AudioTagHeader, Mp3FrameHeader, SoundFormat};
use crate::classifier::{FrameType, FrameTypeClassifier};
use crate::config::DemuxerConfig;
use crate::error::{DemuxErrorKind, FlvError};
use crate::header::ProbeResult;
use crate::media_info::MediaInfo;
use crate::script::{ON_METADATA, OnMetaData};
use crate::tag::{FlvTagHeader, FlvTagType, PREVIOUS_TAG_SIZE, TAG_HEADER_SIZE};
use crate::track::{AudioMetadata, AudioSample, Sample, Track, TrackKind, TrackMetadata, VideoMetadata, VideoSample};
use crate::video::{AVC_PACKET_HEADER_SIZE, AvcPacketHeader, AvcPacketType, VideoCodecId, VideoTagHeader, split_nalus};

/// Minimum buffer size before the first pass looks at the header: the
/// header plus PreviousTagSize0.
pub(crate) const MIN_FIRST_CHUNK: usize = 13;

/// Receives everything the tag loop produces.
pub trait DemuxHandler {
    /// A tag was dropped.
    fn on_error(&mut self, kind: DemuxErrorKind, message: String);

    /// The media info is complete after a change.
    fn on_media_info(&mut self, info: &MediaInfo);

    /// A track was configured or reconfigured.
    fn on_track_metadata(&mut self, metadata: &TrackMetadata);

    /// Pending samples are ready. The handler takes what it needs with
    /// [`Track::take_samples`]; anything left behind is dropped.
    fn on_data_available(&mut self, audio: &mut Track, video: &mut Track);

    /// A script data tag was decoded. An `onMetaData` entry has already been
    /// applied to the media info when this is called.
    fn on_script_data(&mut self, _data: &Amf0Object) {}
}

/// Incremental FLV demuxer state for one stream.
#[derive(Debug)]
pub struct FlvDemuxer {
    config: DemuxerConfig,
    data_offset: usize,
    first_parse: bool,
    destroyed: bool,

    has_audio: bool,
    has_video: bool,
    audio_initial_dispatched: bool,
    video_initial_dispatched: bool,
    dispatch: bool,

    media_info: MediaInfo,
    on_metadata_seen: bool,
    audio_metadata: Option<AudioMetadata>,
    video_metadata: Option<VideoMetadata>,

    nalu_length_size: u8,
    reference_frame_rate: FrameRate,
    duration: u32,
    classifier: FrameTypeClassifier,

    audio_track: Track,
    video_track: Track,
}

impl FlvDemuxer {
    /// Creates the demuxer for a stream whose header was probed as `probe`.
    /// Presence overrides in `config` take precedence over the header flags.
    pub fn new(probe: ProbeResult, config: DemuxerConfig) -> Self {
        let has_audio = config.has_audio.unwrap_or(probe.has_audio);
        let has_video = config.has_video.unwrap_or(probe.has_video);

        let mut media_info = MediaInfo {
            has_audio: Some(has_audio),
            has_video: Some(has_video),
            ..Default::default()
        };
        if let Some(duration) = config.duration_override {
            media_info.duration = Some(duration as u64);
        }

        Self {
            data_offset: probe.consumed,
            first_parse: true,
            destroyed: false,
            has_audio,
            has_video,
            audio_initial_dispatched: false,
            video_initial_dispatched: false,
            dispatch: true,
            media_info,
            on_metadata_seen: false,
            audio_metadata: None,
            video_metadata: None,
            nalu_length_size: 4,
            reference_frame_rate: config.reference_frame_rate,
            duration: config.duration_override.unwrap_or(0),
            classifier: FrameTypeClassifier::new(config.classifier_tolerance),
            audio_track: Track::new(TrackKind::Audio),
            video_track: Track::new(TrackKind::Video),
            config,
        }
    }

    pub fn media_info(&self) -> &MediaInfo {
        &self.media_info
    }

    pub fn audio_metadata(&self) -> Option<&AudioMetadata> {
        self.audio_metadata.as_ref()
    }

    pub fn video_metadata(&self) -> Option<&VideoMetadata> {
        self.video_metadata.as_ref()
    }

    /// Effective audio presence.
    pub fn has_audio(&self) -> bool {
        self.has_audio
    }

    /// Effective video presence.
    pub fn has_video(&self) -> bool {
        self.has_video
    }

    /// Drops pending samples of both tracks.
    pub fn clear_tracks(&mut self) {
        self.audio_track.clear();
        self.video_track.clear();
    }

    /// Releases all stream state. Later calls to
    /// [`parse_chunks`](Self::parse_chunks) fail.
    pub fn destroy(&mut self) {
        self.destroyed = true;
        self.media_info = MediaInfo::default();
        self.audio_metadata = None;
        self.video_metadata = None;
        self.clear_tracks();
    }

    /// Whether every declared track has delivered its first metadata.
    ///
    /// With a presence override in place, any one configured track is
    /// enough.
    fn is_initial_metadata_dispatched(&self) -> bool {
        if self.config.has_audio.is_some() || self.config.has_video.is_some() {
            return self.audio_initial_dispatched || self.video_initial_dispatched;
        }

        match (self.has_audio, self.has_video) {
            (true, true) => self.audio_initial_dispatched && self.video_initial_dispatched,
            (true, false) => self.audio_initial_dispatched,
            (false, true) => self.video_initial_dispatched,
            (false, false) => false,
        }
    }

    fn has_pending_samples(&self) -> bool {
        self.audio_track.has_pending() || self.video_track.has_pending()
    }

    fn flush(&mut self, handler: &mut dyn DemuxHandler) {
        handler.on_data_available(&mut self.audio_track, &mut self.video_track);
        self.clear_tracks();
    }

    fn report(handler: &mut dyn DemuxHandler, err: FlvError) {
        tracing::debug!(error = %err, "Tag dropped");
        handler.on_error(err.kind(), err.to_string());
    }

    /// Parses every complete tag in `chunk`, which starts at byte
    /// `byte_start` of the stream, and returns the number of bytes consumed.
    ///
    /// A partial trailing tag is left unconsumed. A chunk starting at byte 0
    /// must hold more than 13 bytes, otherwise nothing is consumed.
    pub fn parse_chunks(
        &mut self,
        chunk: &Bytes,
        byte_start: u64,
        handler: &mut dyn DemuxHandler,
    ) -> Result<usize, FlvError> {
        if self.destroyed {
            return Err(FlvError::State("demuxer has been destroyed"));
        }

        let mut offset = 0;

        if byte_start == 0 {
            if chunk.len() <= MIN_FIRST_CHUNK {
                return Ok(0);
            }
            let probe = ProbeResult::probe(chunk);
            if probe.matched {
                offset = probe.consumed;
            }
        }

        if self.first_parse {
            if offset + PREVIOUS_TAG_SIZE > chunk.len() {
                return Ok(0);
            }
            self.first_parse = false;

            if byte_start + offset as u64 != self.data_offset as u64 {
                tracing::debug!(byte_start, offset, "First time parsing but chunk byteStart invalid");
            }

            let previous_tag_size0 = (&chunk[offset..]).read_u32::<BigEndian>()?;
            if previous_tag_size0 != 0 {
                tracing::debug!(previous_tag_size0, "PrevTagSize0 != 0");
            }
            offset += PREVIOUS_TAG_SIZE;
        }

        while offset < chunk.len() {
            self.dispatch = true;

            if offset + TAG_HEADER_SIZE + PREVIOUS_TAG_SIZE > chunk.len() {
                break;
            }

            let header = FlvTagHeader::parse(&mut &chunk[offset..offset + TAG_HEADER_SIZE])?;
            if offset + header.total_size() > chunk.len() {
                break;
            }

            let body_start = offset + TAG_HEADER_SIZE;
            let body_end = body_start + header.data_size as usize;

            if let FlvTagType::Unknown(tag_type) = header.tag_type {
                tracing::debug!(tag_type, "Unsupported tag type, skipped");
                offset += header.total_size();
                continue;
            }

            if header.stream_id != 0 {
                tracing::debug!(stream_id = header.stream_id, "Meet tag which has StreamID != 0");
            }

            let body = chunk.slice(body_start..body_end);
            let result = match header.tag_type {
                FlvTagType::Audio => self.parse_audio_data(body, header.timestamp_ms, handler),
                FlvTagType::Video => {
                    let tag_position = byte_start + offset as u64;
                    self.parse_video_data(body, header.timestamp_ms, tag_position, handler)
                }
                FlvTagType::ScriptData => self.parse_script_data(body, handler),
                FlvTagType::Unknown(_) => Ok(()),
            };
            if let Err(err) = result {
                Self::report(handler, err);
            }

            let previous_tag_size = (&chunk[body_end..]).read_u32::<BigEndian>()?;
            if previous_tag_size != header.expected_previous_tag_size() {
                tracing::debug!(
                    previous_tag_size,
                    expected = header.expected_previous_tag_size(),
                    "Invalid PrevTagSize"
                );
            }

            offset += header.total_size();
        }

        if self.is_initial_metadata_dispatched() && self.dispatch && self.has_pending_samples() {
            self.flush(handler);
        }

        Ok(offset)
    }

    /// Every `onMetaData` is applied, a later one revising the earlier.
    /// The handler sees the script data after the media info was updated.
    fn parse_script_data(&mut self, body: Bytes, handler: &mut dyn DemuxHandler) -> Result<(), FlvError> {
        let script_data = amf0::parse_script_data(&body)?;

        match script_data.get(ON_METADATA).map(|value| value.as_object()) {
            Some(Some(object)) => {
                if self.on_metadata_seen {
                    tracing::debug!("Found another onMetaData tag");
                }
                let metadata = OnMetaData::parse(object, self.config.timestamp_base);
                self.apply_on_metadata(metadata, handler);
            }
            Some(None) => tracing::debug!("Invalid onMetaData structure"),
            None => {}
        }

        if !script_data.is_empty() {
            handler.on_script_data(&script_data);
        }
        Ok(())
    }

    fn apply_on_metadata(&mut self, metadata: OnMetaData, handler: &mut dyn DemuxHandler) {
        self.on_metadata_seen = true;
        let audio_overridden = self.config.has_audio.is_some();
        let video_overridden = self.config.has_video.is_some();
        let mi = &mut self.media_info;

        if !audio_overridden {
            self.has_audio = false;
            if let Some(has_audio) = metadata.has_audio {
                self.has_audio = has_audio;
                mi.has_audio = Some(has_audio);
            }
        }
        if let (Some(has_video), false) = (metadata.has_video, video_overridden) {
            self.has_video = has_video;
            mi.has_video = Some(has_video);
        }

        if let Some(rate) = metadata.audio_data_rate {
            mi.audio_data_rate = Some(rate);
        }
        if let Some(rate) = metadata.video_data_rate {
            mi.video_data_rate = Some(rate);
        }
        if let Some(width) = metadata.width {
            mi.width = Some(width as u32);
        }
        if let Some(height) = metadata.height {
            mi.height = Some(height as u32);
        }

        match (metadata.duration, self.config.duration_override) {
            (_, Some(_)) => {}
            (Some(seconds), None) => {
                let duration = (seconds * self.config.timescale as f64).floor().max(0.0);
                self.duration = duration as u32;
                mi.duration = Some(duration as u64);
            }
            (None, None) => mi.duration = Some(0),
        }

        if let Some(frame_rate) = metadata.frame_rate {
            let fps_num = (frame_rate * 1000.0).floor();
            if fps_num > 0.0 {
                self.reference_frame_rate = FrameRate::new(true, fps_num as u32, 1000);
                mi.fps = Some(self.reference_frame_rate.fps);
            }
        }

        mi.has_keyframes_index = Some(metadata.keyframes.is_some());
        mi.keyframes_index = metadata.keyframes;
        mi.metadata = Some(metadata.object);

        self.dispatch = false;
        tracing::debug!("Parsed onMetaData");

        if self.media_info.is_complete() {
            handler.on_media_info(&self.media_info);
        }
    }

    /// Flushes pending samples when a reconfiguration arrives mid-stream,
    /// marks the track as configured and announces its metadata.
    fn dispatch_track_metadata(&mut self, metadata: TrackMetadata, handler: &mut dyn DemuxHandler) {
        if self.is_initial_metadata_dispatched() {
            if self.dispatch && self.has_pending_samples() {
                self.flush(handler);
            }
        } else {
            match metadata.kind() {
                TrackKind::Audio => self.audio_initial_dispatched = true,
                TrackKind::Video => self.video_initial_dispatched = true,
            }
        }

        self.dispatch = false;
        handler.on_track_metadata(&metadata);
    }

    fn notify_if_complete(&mut self, handler: &mut dyn DemuxHandler) {
        self.media_info.update_mime_type();
        if self.media_info.is_complete() {
            handler.on_media_info(&self.media_info);
        }
    }

    fn parse_audio_data(&mut self, body: Bytes, timestamp: u32, handler: &mut dyn DemuxHandler) -> Result<(), FlvError> {
        if body.len() <= 1 {
            tracing::debug!("Invalid audio packet, missing SoundData payload");
            return Ok(());
        }

        if self.config.has_audio == Some(false) {
            return Ok(());
        }

        let header = AudioTagHeader::parse(body[0]);
        if let SoundFormat::Other(id) = header.sound_format {
            return Err(FlvError::CodecUnsupported(format!(
                "Flv: Unsupported audio codec idx: {id}"
            )));
        }

        if self.audio_metadata.is_none() {
            if !self.has_audio && self.config.has_audio.is_none() {
                self.has_audio = true;
                self.media_info.has_audio = Some(true);
            }

            self.audio_metadata = Some(AudioMetadata::new(
                self.config.timescale,
                self.duration,
                header.sound_rate,
                header.channel_count(),
            ));
        }

        let dts = self.config.timestamp_base as i64 + timestamp as i64;
        let payload = body.slice(1..);
        match header.sound_format {
            SoundFormat::Aac => self.parse_aac_audio_data(payload, dts, handler),
            _ => self.parse_mp3_audio_data(payload, dts, handler),
        }
    }

    fn parse_aac_audio_data(&mut self, data: Bytes, dts: i64, handler: &mut dyn DemuxHandler) -> Result<(), FlvError> {
        if data.len() <= 1 {
            tracing::warn!("Invalid AAC packet, missing AACPacketType or/and Data");
            return Ok(());
        }

        match AacPacketType::from(data[0]) {
            AacPacketType::SequenceHeader => {
                let extra_data = data.slice(1..);
                let source = aac::AudioSpecificConfig::parse(&extra_data)
                    .map_err(|err| FlvError::Format(format!("Flv: {err}")))?;
                let resolved = self.config.aac_policy.resolve(&source);

                let Some(meta) = self.audio_metadata.as_mut() else {
                    return Err(FlvError::State("audio metadata missing"));
                };
                if meta.is_configured() {
                    tracing::debug!("Found another AudioSpecificConfig");
                }

                meta.audio_sample_rate = source.sampling_frequency();
                meta.channel_count = source.channel_configuration;
                meta.codec = Some(resolved.codec());
                meta.original_codec = Some(resolved.original_codec());
                meta.config = resolved.config;
                meta.extra_data = extra_data;
                // one AAC frame decodes to 1024 PCM samples
                meta.ref_sample_duration = 1024.0 / meta.audio_sample_rate as f64 * meta.timescale as f64;
                tracing::debug!(codec = ?meta.codec, rate = meta.audio_sample_rate, "Parsed AudioSpecificConfig");

                let metadata = TrackMetadata::Audio(meta.clone());
                self.media_info.audio_codec = meta.original_codec.clone();
                self.media_info.audio_sample_rate = Some(meta.audio_sample_rate);
                self.media_info.audio_channel_count = Some(meta.channel_count);

                self.dispatch_track_metadata(metadata, handler);
                self.notify_if_complete(handler);
            }
            AacPacketType::Raw => {
                if !self.audio_metadata.as_ref().is_some_and(AudioMetadata::is_configured) {
                    tracing::debug!(dts, "AAC frame before AudioSpecificConfig, dropped");
                    return Ok(());
                }

                self.audio_track.push(Sample::Audio(AudioSample {
                    unit: data.slice(1..),
                    dts,
                    pts: dts,
                }));
            }
            AacPacketType::Unknown(packet_type) => {
                tracing::debug!(packet_type, "Unsupported AAC data type");
            }
        }

        Ok(())
    }

    fn parse_mp3_audio_data(&mut self, data: Bytes, dts: i64, handler: &mut dyn DemuxHandler) -> Result<(), FlvError> {
        if data.len() < 4 {
            tracing::debug!("Invalid MP3 packet, header missing");
            return Ok(());
        }

        let configured = self.audio_metadata.as_ref().is_some_and(AudioMetadata::is_configured);
        if !configured {
            let Some(frame) = Mp3FrameHeader::parse(&data) else {
                return Ok(());
            };
            let Some(meta) = self.audio_metadata.as_mut() else {
                return Err(FlvError::State("audio metadata missing"));
            };

            meta.audio_sample_rate = frame.sample_rate;
            meta.channel_count = frame.channel_count;
            meta.codec = Some("mp3".to_string());
            meta.original_codec = Some("mp3".to_string());
            if frame.sample_rate > 0 {
                meta.ref_sample_duration = 1152.0 / frame.sample_rate as f64 * meta.timescale as f64;
            }
            tracing::debug!(%frame, "Parsed MPEG Audio Frame Header");

            let metadata = TrackMetadata::Audio(meta.clone());
            self.audio_initial_dispatched = true;
            handler.on_track_metadata(&metadata);

            let mi = &mut self.media_info;
            mi.audio_codec = Some("mp3".to_string());
            mi.audio_sample_rate = Some(frame.sample_rate);
            mi.audio_channel_count = Some(frame.channel_count);
            // free format and forbidden indexes carry no usable rate
            if frame.bit_rate > 0 {
                mi.audio_data_rate = Some(frame.bit_rate as f64);
            }
            self.notify_if_complete(handler);
        }

        self.audio_track.push(Sample::Audio(AudioSample { unit: data, dts, pts: dts }));
        Ok(())
    }

    fn parse_video_data(
        &mut self,
        body: Bytes,
        timestamp: u32,
        tag_position: u64,
        handler: &mut dyn DemuxHandler,
    ) -> Result<(), FlvError> {
        if body.len() <= 1 {
            tracing::debug!("Invalid video packet, missing VideoData payload");
            return Ok(());
        }

        if self.config.has_video == Some(false) {
            return Ok(());
        }

        let header = VideoTagHeader::parse(body[0]);
        if let VideoCodecId::Other(id) = header.codec_id {
            return Err(FlvError::CodecUnsupported(format!(
                "Flv: Unsupported codec in video frame: {id}"
            )));
        }

        let data = body.slice(1..);
        if data.len() < AVC_PACKET_HEADER_SIZE {
            tracing::debug!("Invalid AVC packet, missing AVCPacketType or/and CompositionTime");
            return Ok(());
        }

        let packet = AvcPacketHeader::parse(&mut &data[..AVC_PACKET_HEADER_SIZE])?;
        let payload = data.slice(AVC_PACKET_HEADER_SIZE..);

        match packet.packet_type {
            AvcPacketType::SequenceHeader => self.parse_avc_decoder_configuration_record(payload, handler),
            AvcPacketType::Nalu => {
                let dts = self.config.timestamp_base as i64 + timestamp as i64;
                self.parse_avc_video_data(payload, dts, tag_position, header.is_keyframe(), packet.composition_time);
                Ok(())
            }
            AvcPacketType::EndOfSequence => Ok(()),
            AvcPacketType::Unknown(packet_type) => {
                Err(FlvError::Format(format!("Flv: Invalid video packet type {packet_type}")))
            }
        }
    }

    fn parse_avc_decoder_configuration_record(
        &mut self,
        data: Bytes,
        handler: &mut dyn DemuxHandler,
    ) -> Result<(), FlvError> {
        if data.len() < 7 {
            tracing::debug!("Invalid AVCDecoderConfigurationRecord, lack of data");
            return Ok(());
        }

        if self.video_metadata.is_none() {
            if !self.has_video && self.config.has_video.is_none() {
                self.has_video = true;
                self.media_info.has_video = Some(true);
            }
        } else {
            tracing::debug!("Found another AVCDecoderConfigurationRecord");
        }

        let record = AVCDecoderConfigurationRecord::parse(&mut io::Cursor::new(data.clone()))
            .map_err(|err| FlvError::Format(format!("Flv: {err}")))?;
        self.nalu_length_size = record.nalu_length_size();

        let Some(first_sps) = record.sps.first() else {
            return Err(FlvError::Format("Flv: Invalid AVCDecoderConfigurationRecord: No SPS".into()));
        };
        let sps = Sps::parse(first_sps, self.reference_frame_rate)
            .map_err(|err| FlvError::Format(format!("Flv: Invalid SPS: {err}")))?;

        let frame_rate = sps.frame_rate.or(self.reference_frame_rate);
        let ref_sample_duration = match frame_rate.fps_num {
            0 => 0.0,
            num => self.config.timescale as f64 * (frame_rate.fps_den as f64 / num as f64),
        };
        let codec = record.codec_string().unwrap_or_default();

        let meta = VideoMetadata {
            id: TrackKind::Video.id(),
            timescale: self.config.timescale,
            duration: self.duration,
            codec_width: sps.codec_width,
            codec_height: sps.codec_height,
            present_width: sps.present_width,
            present_height: sps.present_height,
            profile: sps.profile_string().to_string(),
            level: sps.level_string(),
            bit_depth: sps.bit_depth(),
            chroma_format: sps.chroma_format(),
            sar: sps.sample_aspect_ratio,
            frame_rate,
            ref_sample_duration,
            spspps: record.annexb_parameter_sets(),
            avcc: data,
            nalu_length_size: self.nalu_length_size,
            codec: codec.clone(),
        };

        let mi = &mut self.media_info;
        mi.width = Some(meta.codec_width);
        mi.height = Some(meta.codec_height);
        mi.fps = Some(frame_rate.fps);
        mi.profile = Some(meta.profile.clone());
        mi.level = Some(meta.level.clone());
        mi.ref_frames = Some(sps.max_num_ref_frames);
        mi.chroma_format = Some(sps.chroma_format_string().to_string());
        mi.sar_num = Some(meta.sar.sar_width);
        mi.sar_den = Some(meta.sar.sar_height);
        mi.video_codec = Some(codec);
        self.notify_if_complete(handler);

        tracing::debug!(
            codec = %meta.codec,
            width = meta.codec_width,
            height = meta.codec_height,
            "Parsed AVCDecoderConfigurationRecord"
        );
        self.video_metadata = Some(meta.clone());
        self.dispatch_track_metadata(TrackMetadata::Video(meta), handler);
        Ok(())
    }

    fn parse_avc_video_data(&mut self, data: Bytes, dts: i64, tag_position: u64, keyframe: bool, cts: i32) {
        if self.video_metadata.is_none() {
            tracing::debug!(dts, "AVC frame before AVCDecoderConfigurationRecord, dropped");
            return;
        }

        let units = match split_nalus(&data, self.nalu_length_size) {
            Ok(units) => units,
            Err(err) => {
                tracing::debug!(dts, %err, "Malformed Nalus, sample dropped");
                return;
            }
        };

        let mut keyframe = keyframe;
        let mut frame_type = FrameType::Unknown;
        let mut kept = Vec::with_capacity(units.len());
        let mut length = 0;

        for unit in units {
            if unit.unit_type == 5 {
                keyframe = true;
            }
            if let Some(label) = self.classifier.classify(unit.unit_type, dts, cts) {
                frame_type = label;
            }

            if self.config.ignore_nalu_types.contains(&unit.unit_type) {
                tracing::trace!(unit_type = unit.unit_type, "Ignored Nalu");
                continue;
            }

            length += unit.data.len();
            kept.push(unit);
        }

        if kept.is_empty() {
            return;
        }

        self.video_track.push(Sample::Video(VideoSample {
            units: kept,
            length,
            keyframe,
            dts,
            cts,
            pts: dts + cts as i64,
            frame_type,
            file_position: keyframe.then_some(tag_position),
        }));
    }
}
