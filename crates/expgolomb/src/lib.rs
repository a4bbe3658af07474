//! Exponential-Golomb codes on top of the [`bytes-util`](bytes_util) bit
//! reader and writer.
//!
//! H.264 parameter sets encode most of their fields as `ue(v)` / `se(v)`
//! values; this crate adds those two reads to [`BitReader`] and the matching
//! writes to [`BitWriter`].
//!
//! ```rust
//! # fn test() -> std::io::Result<()> {
//! use expgolomb::{BitReaderExpGolombExt, BitWriterExpGolombExt};
//! use bytes_util::{BitReader, BitWriter};
//!
//! let mut bit_writer = BitWriter::default();
//! bit_writer.write_exp_golomb(0);
//! bit_writer.write_exp_golomb(7);
//! bit_writer.write_signed_exp_golomb(-3);
//!
//! let mut bit_reader = BitReader::new(bit_writer.finish());
//! assert_eq!(bit_reader.read_exp_golomb()?, 0);
//! assert_eq!(bit_reader.read_exp_golomb()?, 7);
//! assert_eq!(bit_reader.read_signed_exp_golomb()?, -3);
//! # Ok(())
//! # }
//! # test().expect("failed to run test");
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

use std::io;

use bytes_util::{BitReader, BitWriter};

/// Extension trait for reading Exp-Golomb encoded numbers from a bit reader
///
/// See: <https://en.wikipedia.org/wiki/Exponential-Golomb_coding>
pub trait BitReaderExpGolombExt {
    /// Reads an unsigned Exp-Golomb code, `ue(v)`.
    fn read_exp_golomb(&mut self) -> io::Result<u32>;

    /// Reads a signed Exp-Golomb code, `se(v)`.
    ///
    /// Odd code numbers map to positive values, even ones to negative values.
    fn read_signed_exp_golomb(&mut self) -> io::Result<i32> {
        let code = self.read_exp_golomb()? as i64;

        let value = if code & 1 == 1 { (code + 1) / 2 } else { -(code / 2) };
        Ok(value as i32)
    }
}

impl<B: AsRef<[u8]>> BitReaderExpGolombExt for BitReader<B> {
    fn read_exp_golomb(&mut self) -> io::Result<u32> {
        let leading_zeros = self.skip_leading_zeros()?;
        if leading_zeros > 31 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("exp-golomb prefix of {leading_zeros} zero bits"),
            ));
        }

        let code = self.read_bits(leading_zeros + 1)?;
        Ok(code - 1)
    }
}

/// Extension trait for writing Exp-Golomb encoded numbers to a bit writer
///
/// See: <https://en.wikipedia.org/wiki/Exponential-Golomb_coding>
pub trait BitWriterExpGolombExt {
    /// Writes an unsigned Exp-Golomb code.
    fn write_exp_golomb(&mut self, value: u32);

    /// Writes a signed Exp-Golomb code.
    fn write_signed_exp_golomb(&mut self, value: i32) {
        let value = value as i64;
        let code = if value <= 0 { -value * 2 } else { value * 2 - 1 };

        self.write_exp_golomb(code as u32)
    }
}

impl BitWriterExpGolombExt for BitWriter {
    fn write_exp_golomb(&mut self, value: u32) {
        let code = value as u64 + 1;
        let significant_bits = 64 - code.leading_zeros() as u8;

        self.write_bits(0, significant_bits - 1);
        self.write_bits(code, significant_bits);
    }
}
