use std::io;

use byteorder::{BigEndian, WriteBytesExt};

use super::define::Amf0Marker;
use super::{Amf0Object, Amf0Value, Amf0WriteError};

/// AMF0 encoder, the inverse of [`Amf0Decoder`](crate::Amf0Decoder).
///
/// Dates are written with a zero time zone offset.
pub struct Amf0Encoder;

impl Amf0Encoder {
    /// Writes one value, marker included.
    pub fn encode(writer: &mut impl io::Write, value: &Amf0Value) -> Result<(), Amf0WriteError> {
        let marker = value.marker();
        if marker == Amf0Marker::ObjectEnd {
            return Err(Amf0WriteError::UnsupportedType(marker));
        }
        writer.write_u8(marker as u8)?;

        match value {
            Amf0Value::Number(number) => writer.write_f64::<BigEndian>(*number)?,
            Amf0Value::Boolean(flag) => writer.write_u8(*flag as u8)?,
            Amf0Value::String(text) => write_utf8(writer, text)?,
            Amf0Value::LongString(text) => {
                writer.write_u32::<BigEndian>(text.len() as u32)?;
                writer.write_all(text.as_bytes())?;
            }
            Amf0Value::Date(milliseconds) => {
                writer.write_f64::<BigEndian>(*milliseconds)?;
                writer.write_i16::<BigEndian>(0)?;
            }
            Amf0Value::Object(properties) => write_properties(writer, properties)?,
            Amf0Value::StrictArray(values) => {
                writer.write_u32::<BigEndian>(values.len() as u32)?;
                for value in values {
                    Self::encode(writer, value)?;
                }
            }
            Amf0Value::Null | Amf0Value::Undefined | Amf0Value::ObjectEnd => {}
        }

        Ok(())
    }

    /// Writes a script data tag body: `name` as a string, then `value`.
    ///
    /// An object value is written as an ECMA array, the way FLV muxers
    /// store `onMetaData`.
    pub fn encode_script_data(
        writer: &mut impl io::Write,
        name: &str,
        value: &Amf0Value,
    ) -> Result<(), Amf0WriteError> {
        Self::encode(writer, &Amf0Value::String(name.to_string()))?;

        match value {
            Amf0Value::Object(properties) => {
                writer.write_u8(Amf0Marker::EcmaArray as u8)?;
                writer.write_u32::<BigEndian>(properties.len() as u32)?;
                write_properties(writer, properties)
            }
            other => Self::encode(writer, other),
        }
    }
}

fn write_utf8(writer: &mut impl io::Write, text: &str) -> Result<(), Amf0WriteError> {
    let len = u16::try_from(text.len()).map_err(|_| Amf0WriteError::StringTooLong(text.len()))?;
    writer.write_u16::<BigEndian>(len)?;
    writer.write_all(text.as_bytes())?;
    Ok(())
}

/// Key / value pairs followed by the end marker.
fn write_properties(writer: &mut impl io::Write, properties: &Amf0Object) -> Result<(), Amf0WriteError> {
    for (key, value) in properties.iter() {
        write_utf8(writer, key)?;
        Amf0Encoder::encode(writer, value)?;
    }

    writer.write_u24::<BigEndian>(Amf0Marker::ObjectEnd as u32)?;
    Ok(())
}
