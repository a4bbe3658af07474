//! Bit and byte level reading helpers shared by the codec crates.
//!
//! - [`BitReader`]: big-endian bit reader with a 32-bit refill window.
//! - [`BitWriter`]: the inverse, used to assemble bitstreams.
//! - [`BytesCursor`] / [`BytesCursorExt`]: zero-copy reads over [`bytes::Bytes`].
//!
//! ## License
//!
//! This project is licensed under the [MIT](./LICENSE.MIT) or [Apache-2.0](./LICENSE.Apache-2.0) license.
//! You can choose between one of them if you use this work.
//!
//! `SPDX-License-Identifier: MIT OR Apache-2.0`
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(unsafe_code)]

mod bit_read;
mod bit_write;
mod bytes_cursor;

pub use bit_read::BitReader;
pub use bit_write::BitWriter;
pub use bytes_cursor::{BytesCursor, BytesCursorExt};
