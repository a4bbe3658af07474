//! A streaming FLV demuxer.
//!
//! Bytes go in as they arrive, in chunks of any size; tracks, samples and
//! stream information come out as events.
//!
//! - [`FlvStreamDemuxer`] is the entry point. It buffers partial tags between
//!   calls, and publishes [`Event`]s on an [`EventBus`]. Audio is delivered
//!   as ADTS (AAC) or MP3 frames, video as Annex-B access units.
//! - [`FlvDemuxer`] is the tag loop underneath, for callers that want the
//!   raw length-prefixed samples through their own [`DemuxHandler`].
//!
//! Only AAC, MP3 and H.264 payloads are demuxed. Other codecs are reported
//! with [`DemuxErrorKind::CodecUnsupported`] and their tags skipped.
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use flv::{DemuxerConfig, Event, EventKind, FlvStreamDemuxer};
//!
//! let mut demuxer = FlvStreamDemuxer::new(DemuxerConfig::default());
//! let tracks = Rc::new(RefCell::new(Vec::new()));
//!
//! let seen = tracks.clone();
//! demuxer.events().subscribe(EventKind::MetaData, move |event| {
//!     if let Event::MetaData { track, .. } = event {
//!         seen.borrow_mut().push(*track);
//!     }
//! });
//!
//! // header, PreviousTagSize0, then an AAC sequence header tag
//! let stream = [
//!     b'F', b'L', b'V', 0x01, 0x04, 0x00, 0x00, 0x00, 0x09, 0x00, 0x00, 0x00, 0x00,
//!     0x08, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
//!     0xaf, 0x00, 0x12, 0x10, 0x00, 0x00, 0x00, 0x0f,
//! ];
//! for chunk in stream.chunks(5) {
//!     demuxer.push(chunk).unwrap();
//! }
//!
//! assert_eq!(tracks.borrow().len(), 1);
//! ```
//!
//! ## License
//!
//! This project is licensed under the [MIT](./LICENSE.MIT) or
//! [Apache-2.0](./LICENSE.Apache-2.0) license. You can choose between one of
//! them if you use this work.
//!
//! `SPDX-License-Identifier: MIT OR Apache-2.0`
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(unsafe_code)]

pub mod audio;
pub mod classifier;
pub mod config;
pub mod demuxer;
pub mod error;
pub mod events;
pub mod header;
pub mod media_info;
pub mod script;
pub mod stream;
pub mod tag;
pub mod track;
pub mod video;

#[cfg(test)]
mod test_utils;

pub use classifier::{FrameType, FrameTypeClassifier};
pub use config::DemuxerConfig;
pub use demuxer::{DemuxHandler, FlvDemuxer};
pub use error::{DemuxErrorKind, FlvError};
pub use events::{Event, EventBus, EventKind, Listener, SubscriptionToken};
pub use header::{FlvHeader, ProbeResult};
pub use media_info::{KeyframesIndex, MediaInfo, NearestKeyframe};
pub use stream::{FlvStreamDemuxer, MediaSample};
pub use track::{
    AudioMetadata, AudioSample, NaluUnit, Sample, Track, TrackKind, TrackMetadata, VideoMetadata, VideoSample,
};
