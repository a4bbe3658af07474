//! H.264 parameter set parsing for container demuxers.
//!
//! This crate decodes the two H.264 structures a container hands to a
//! decoder before the first frame: the AVC decoder configuration record
//! (`avcC`) and the Sequence Parameter Set it carries. From those it derives
//! the picture size, profile, level, chroma format, sample aspect ratio and
//! frame rate.
//!
//! ## Examples
//!
//! ```rust
//! use std::io;
//!
//! use bytes::Bytes;
//!
//! use h264::{AVCDecoderConfigurationRecord, FrameRate, Sps};
//!
//! # let bytes = Bytes::from(b"\x01d\0\x1f\xff\xe1\0\x17\x67\x64\x00\x1F\xAC\xD9\x41\xE0\x6D\xF9\xE6\xA0\x20\x20\x28\x00\x00\x00\x08\x00\x00\x01\xE0\x01\0\x06h\xeb\xe3\xcb\"\xc0".to_vec());
//! let config = AVCDecoderConfigurationRecord::parse(&mut io::Cursor::new(bytes)).unwrap();
//! assert_eq!(config.nalu_length_size(), 4);
//!
//! // An SPS without usable VUI timing reports the reference rate.
//! let sps = Sps::parse(&config.sps[0], FrameRate::FILM).unwrap();
//! assert_eq!(sps.profile_string(), "High");
//! assert_eq!(sps.level_string(), "3.1");
//! assert_eq!(sps.frame_rate, FrameRate::FILM);
//! ```
//!
//! ## License
//!
//! This project is licensed under the [MIT](./LICENSE.MIT) or [Apache-2.0](./LICENSE.Apache-2.0) license.
//! You can choose between one of them if you use this work.
//!
//! `SPDX-License-Identifier: MIT OR Apache-2.0`
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(unsafe_code)]

mod config;
mod enums;
mod rbsp;
mod sps;

pub use enums::*;
pub use rbsp::ebsp_to_rbsp;
pub use sps::*;

pub use self::config::{AVCDecoderConfigurationRecord, START_CODE};
