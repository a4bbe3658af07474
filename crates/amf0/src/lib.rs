//! A lenient AMF0 decoder (and a small encoder) for FLV script data.
//!
//! FLV files carry their metadata as an AMF0 `name, value` pair, almost always
//! `onMetaData` followed by an ECMA array. Muxers in the wild frequently emit
//! slightly broken AMF0, so the decoder favours recovering data over rejecting
//! input; see [`Amf0Decoder`] for the exact rules.
//!
//! # Examples
//!
//! ```rust
//! # fn test() -> Result<(), Box<dyn std::error::Error>> {
//! use amf0::{Amf0Encoder, Amf0Value, parse_script_data};
//!
//! let mut body = Vec::new();
//! Amf0Encoder::encode_script_data(&mut body, "onMetaData", &Amf0Value::Number(1.5))?;
//!
//! let script = parse_script_data(&body)?;
//! assert_eq!(script.get("onMetaData"), Some(&Amf0Value::Number(1.5)));
//! # Ok(())
//! # }
//! # test().expect("test failed");
//! ```
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(unsafe_code)]

mod decode;
mod define;
mod encode;
mod errors;

pub use crate::decode::{Amf0Decoded, Amf0Decoder, decode_value, parse_script_data};
pub use crate::define::{Amf0Marker, Amf0Object, Amf0Value};
pub use crate::encode::Amf0Encoder;
pub use crate::errors::{Amf0ReadError, Amf0WriteError};
