//! AAC configuration handling for container demuxers.
//!
//! - [`AudioSpecificConfig`] decodes the leading fields of the config a
//!   container stores ahead of the first frame.
//! - [`AacObjectTypePolicy`] rewrites the object type before the config is
//!   handed to a decoder.
//! - [`AdtsHeader`] builds the 7-byte ADTS header that turns a raw AAC frame
//!   into a self-contained one.
//!
//! ```rust
//! use aac::{AacObjectTypePolicy, AdtsHeader, AudioSpecificConfig};
//!
//! let config = AudioSpecificConfig::parse(&[0x12, 0x10]).unwrap();
//! assert_eq!(config.sampling_frequency(), 44100);
//!
//! let resolved = AacObjectTypePolicy::MatchSource.resolve(&config);
//! assert_eq!(resolved.codec(), "mp4a.40.2");
//!
//! let header = AdtsHeader::new(config.sampling_frequency(), config.channel_configuration).unwrap();
//! let frame = header.wrap(&[0x21, 0x00]).unwrap();
//! assert_eq!(frame.len(), 9);
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
#![deny(missing_docs)]
#![deny(unsafe_code)]

mod adts;
mod config;
mod policy;

pub use adts::{ADTS_HEADER_LEN, AdtsError, AdtsHeader};
pub use config::{AudioObjectType, AudioSpecificConfig, SampleFrequencyIndex};
pub use policy::{AacObjectTypePolicy, CompatTarget, ResolvedAudioConfig};
