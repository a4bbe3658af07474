use std::io::Cursor;

use byteorder::{BigEndian, ReadBytesExt};
use num_traits::FromPrimitive;
use tracing::{trace, warn};

use super::{Amf0Marker, Amf0Object, Amf0ReadError, Amf0Value};

/// `00 00 09`: an empty property name followed by the object-end marker.
const OBJECT_END_SEQUENCE: [u8; 3] = [0x00, 0x00, Amf0Marker::ObjectEnd as u8];

/// One decoded value and how much of the input it covered.
#[derive(Debug, Clone, PartialEq)]
pub struct Amf0Decoded {
    /// The decoded value.
    pub value: Amf0Value,
    /// Bytes consumed, marker included.
    pub consumed: usize,
    /// Set when the value was an object-end marker.
    pub is_end: bool,
}

impl Amf0Decoded {
    const fn new(value: Amf0Value, consumed: usize) -> Self {
        Self {
            value,
            consumed,
            is_end: false,
        }
    }
}

/// An AMF0 decoder.
///
/// Decoding is lenient in the ways real-world FLV muxers require:
///
/// - an unknown marker swallows the rest of its enclosing buffer and decodes
///   as [`Amf0Value::Undefined`] instead of failing,
/// - objects and ECMA arrays may lack their `00 00 09` terminator,
/// - a property that fails to decode ends its object early, keeping the
///   properties read so far,
/// - strings are decoded as lossy UTF-8.
#[derive(Debug, Clone)]
pub struct Amf0Decoder<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Amf0Decoder<'a> {
    /// Create a new AMF0 decoder.
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Check if the decoder has reached the end of the AMF0 data.
    pub const fn is_empty(&self) -> bool {
        self.position >= self.data.len()
    }

    /// Offset of the next value in the input.
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Decodes the next value, bounded by the remaining input.
    pub fn decode(&mut self) -> Result<Amf0Decoded, Amf0ReadError> {
        let rest = self.data.get(self.position..).unwrap_or_default();
        let decoded = decode_value(rest)?;
        self.position += decoded.consumed;
        Ok(decoded)
    }

    /// Decodes a script data body: a name value followed by its payload.
    ///
    /// The result holds a single property, e.g. `onMetaData => {...}`.
    pub fn decode_script_data(mut self) -> Result<Amf0Object, Amf0ReadError> {
        let name = match self.decode()?.value {
            Amf0Value::String(name) | Amf0Value::LongString(name) => name,
            other => {
                return Err(Amf0ReadError::WrongType {
                    expected: Amf0Marker::String,
                    got: other.marker(),
                });
            }
        };

        let value = self.decode()?.value;

        let mut object = Amf0Object::new();
        object.insert(name, value);
        Ok(object)
    }
}

/// Decodes the value starting at `window[0]`.
///
/// `window` bounds the value: a value never reads past its end, and an
/// unknown marker consumes all of it.
pub fn decode_value(window: &[u8]) -> Result<Amf0Decoded, Amf0ReadError> {
    let mut cursor = Cursor::new(window);
    let marker_byte = cursor.read_u8()?;

    let Some(marker) = Amf0Marker::from_u8(marker_byte) else {
        warn!(marker = marker_byte, skipped = window.len(), "Unknown AMF0 marker, skipping");
        return Ok(Amf0Decoded::new(Amf0Value::Undefined, window.len()));
    };

    let value = match marker {
        Amf0Marker::Number => Amf0Value::Number(cursor.read_f64::<BigEndian>()?),
        Amf0Marker::Boolean => Amf0Value::Boolean(cursor.read_u8()? != 0),
        Amf0Marker::String => {
            let len = cursor.read_u16::<BigEndian>()? as usize;
            Amf0Value::String(read_utf8(&mut cursor, len)?)
        }
        Amf0Marker::LongString => {
            let len = cursor.read_u32::<BigEndian>()? as usize;
            Amf0Value::LongString(read_utf8(&mut cursor, len)?)
        }
        Amf0Marker::Date => {
            let timestamp = cursor.read_f64::<BigEndian>()?;
            let offset_minutes = cursor.read_i16::<BigEndian>()?;
            Amf0Value::Date(timestamp + offset_minutes as f64 * 60.0 * 1000.0)
        }
        Amf0Marker::Null => Amf0Value::Null,
        Amf0Marker::Undefined => Amf0Value::Undefined,
        Amf0Marker::ObjectEnd => {
            return Ok(Amf0Decoded {
                value: Amf0Value::ObjectEnd,
                consumed: 1,
                is_end: true,
            });
        }
        Amf0Marker::Object => {
            let (object, consumed) = read_properties(window, 1);
            return Ok(Amf0Decoded::new(Amf0Value::Object(object), consumed));
        }
        Amf0Marker::EcmaArray => {
            // The declared count is unreliable in the wild; the end marker
            // (or the end of the buffer) is what terminates the array.
            let _count = cursor.read_u32::<BigEndian>()?;
            let (object, consumed) = read_properties(window, 5);
            return Ok(Amf0Decoded::new(Amf0Value::Object(object), consumed));
        }
        Amf0Marker::StrictArray => {
            let count = cursor.read_u32::<BigEndian>()? as usize;
            let mut offset = 5;
            let mut values = Vec::with_capacity(count.min(window.len()));
            for _ in 0..count {
                let item = decode_value(&window[offset..])?;
                offset += item.consumed;
                values.push(item.value);
            }
            return Ok(Amf0Decoded::new(Amf0Value::StrictArray(values), offset));
        }
        other => {
            warn!(marker = ?other, skipped = window.len(), "Unsupported AMF0 type, skipping");
            return Ok(Amf0Decoded::new(Amf0Value::Undefined, window.len()));
        }
    };

    Ok(Amf0Decoded::new(value, cursor.position() as usize))
}

fn read_utf8(cursor: &mut Cursor<&[u8]>, len: usize) -> Result<String, Amf0ReadError> {
    let start = cursor.position() as usize;
    let bytes = cursor
        .get_ref()
        .get(start..start + len)
        .ok_or(Amf0ReadError::UnexpectedEof { needed: len })?;
    cursor.set_position((start + len) as u64);

    Ok(String::from_utf8_lossy(bytes).into_owned())
}

/// Reads `name, value` pairs starting at `start` until the end marker.
///
/// Returns the properties and the offset just past the object.
fn read_properties(window: &[u8], start: usize) -> (Amf0Object, usize) {
    let size = window.len();
    // When the buffer ends in an end marker, keep property values from
    // reading into it. Otherwise we run to the end of the buffer.
    let terminal = if size >= 4 && window.ends_with(&OBJECT_END_SEQUENCE) {
        3
    } else {
        0
    };

    let mut object = Amf0Object::new();
    let mut offset = start;

    // A property plus an end marker needs more than four bytes.
    while offset + 4 < size {
        match read_property(&window[offset..size - terminal]) {
            Ok(None) => break,
            Ok(Some((name, value, consumed))) => {
                object.insert(name, value);
                offset += consumed;
            }
            Err(err) => {
                warn!(error = %err, offset, "Truncated AMF0 object, keeping decoded properties");
                break;
            }
        }
    }

    if window.get(offset..offset + 3) == Some(&OBJECT_END_SEQUENCE[..]) {
        offset += 3;
    } else {
        trace!(offset, "AMF0 object without end marker");
    }

    (object, offset)
}

/// Returns `None` at the object-end marker.
fn read_property(window: &[u8]) -> Result<Option<(String, Amf0Value, usize)>, Amf0ReadError> {
    if window.len() < 3 {
        return Err(Amf0ReadError::UnexpectedEof { needed: 3 });
    }

    let mut cursor = Cursor::new(window);
    let name_len = cursor.read_u16::<BigEndian>()? as usize;
    let name = read_utf8(&mut cursor, name_len)?;

    let name_size = 2 + name_len;
    let value = decode_value(&window[name_size..])?;
    if value.is_end {
        return Ok(None);
    }

    Ok(Some((name, value.value, name_size + value.consumed)))
}

/// Decodes a script data tag body into its single `name => value` pair.
pub fn parse_script_data(data: &[u8]) -> Result<Amf0Object, Amf0ReadError> {
    Amf0Decoder::new(data).decode_script_data()
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    fn decode(data: &[u8]) -> Amf0Decoded {
        decode_value(data).unwrap()
    }

    #[test]
    fn test_reader_bool() {
        let decoded = decode(&[0x01, 0x01]);
        assert_eq!(decoded.value, Amf0Value::Boolean(true));
        assert_eq!(decoded.consumed, 2);
        assert!(!decoded.is_end);
    }

    #[test]
    fn test_reader_number() {
        let mut amf0_number = vec![0x00];
        amf0_number.extend_from_slice(&772.161_f64.to_be_bytes());

        let decoded = decode(&amf0_number);
        assert_eq!(decoded.value, Amf0Value::Number(772.161));
        assert_eq!(decoded.consumed, 9);
    }

    #[test]
    fn test_reader_string() {
        let mut amf0_string = vec![0x02, 0x00, 0x0b]; // 11 bytes
        amf0_string.extend_from_slice(b"Hello World");

        let decoded = decode(&amf0_string);
        assert_eq!(decoded.value, Amf0Value::String("Hello World".into()));
        assert_eq!(decoded.consumed, 14);
    }

    #[test]
    fn test_reader_long_string() {
        let mut amf0_string = vec![0x0c, 0x00, 0x00, 0x00, 0x0b]; // 11 bytes
        amf0_string.extend_from_slice(b"Hello World");

        let decoded = decode(&amf0_string);
        assert_eq!(decoded.value, Amf0Value::LongString("Hello World".into()));
        assert_eq!(decoded.consumed, 16);
    }

    #[test]
    fn test_reader_invalid_utf8_is_lossy() {
        let decoded = decode(&[0x02, 0x00, 0x02, b'a', 0xFF]);
        assert_eq!(decoded.value, Amf0Value::String("a\u{FFFD}".into()));
    }

    #[test]
    fn test_reader_date() {
        let mut amf0_date = vec![0x0b];
        amf0_date.extend_from_slice(&1_000_000.0_f64.to_be_bytes());
        amf0_date.extend_from_slice(&(-60_i16).to_be_bytes());

        let decoded = decode(&amf0_date);
        assert_eq!(decoded.value, Amf0Value::Date(1_000_000.0 - 3_600_000.0));
        assert_eq!(decoded.consumed, 11);
    }

    #[test]
    fn test_reader_object() {
        let mut amf0_object = vec![0x03, 0x00, 0x04]; // 1 property with 4 bytes
        amf0_object.extend_from_slice(b"test");
        amf0_object.extend_from_slice(&[0x05]); // null
        amf0_object.extend_from_slice(&[0x00, 0x00, 0x09]); // object end (0x00 0x00 0x09)

        let decoded = decode(&amf0_object);
        assert_eq!(
            decoded.value,
            Amf0Value::Object([("test", Amf0Value::Null)].into_iter().collect())
        );
        assert_eq!(decoded.consumed, amf0_object.len());
    }

    #[test]
    fn test_reader_object_followed_by_data() {
        let mut data = vec![0x03, 0x00, 0x01, b'a', 0x01, 0x01, 0x00, 0x00, 0x09];
        data.extend_from_slice(&[0x01, 0x00]);

        let mut decoder = Amf0Decoder::new(&data);
        let object = decoder.decode().unwrap();
        assert_eq!(object.consumed, 9);
        assert_eq!(
            object.value.as_object().unwrap().get("a"),
            Some(&Amf0Value::Boolean(true))
        );

        let trailing = decoder.decode().unwrap();
        assert_eq!(trailing.value, Amf0Value::Boolean(false));
        assert!(decoder.is_empty());
    }

    #[test]
    fn test_reader_object_missing_end_marker() {
        let mut amf0_object = vec![0x03, 0x00, 0x05];
        amf0_object.extend_from_slice(b"width");
        amf0_object.push(0x00);
        amf0_object.extend_from_slice(&1280.0_f64.to_be_bytes());

        let decoded = decode(&amf0_object);
        assert_eq!(
            decoded.value.as_object().unwrap().get("width"),
            Some(&Amf0Value::Number(1280.0))
        );
        assert_eq!(decoded.consumed, amf0_object.len());
    }

    #[test]
    fn test_reader_ecma_array() {
        let mut amf0_object = vec![0x08, 0x00, 0x00, 0x00, 0x01]; // 1 property
        amf0_object.extend_from_slice(&[0x00, 0x04]); // 4 bytes
        amf0_object.extend_from_slice(b"test");
        amf0_object.extend_from_slice(&[0x05]); // null
        amf0_object.extend_from_slice(&[0x00, 0x00, 0x09]);

        let decoded = decode(&amf0_object);
        assert_eq!(
            decoded.value,
            Amf0Value::Object([("test", Amf0Value::Null)].into_iter().collect())
        );
        assert_eq!(decoded.consumed, amf0_object.len());
    }

    #[test]
    fn test_reader_ecma_array_ignores_declared_count() {
        // Declares 0 entries but carries two.
        let mut data = vec![0x08, 0x00, 0x00, 0x00, 0x00];
        data.extend_from_slice(&[0x00, 0x01, b'a', 0x01, 0x01]);
        data.extend_from_slice(&[0x00, 0x01, b'b', 0x01, 0x00]);
        data.extend_from_slice(&[0x00, 0x00, 0x09]);

        let decoded = decode(&data);
        let object = decoded.value.as_object().unwrap();
        assert_eq!(object.len(), 2);
        assert_eq!(object.get("b"), Some(&Amf0Value::Boolean(false)));
    }

    #[test]
    fn test_reader_truncated_property_keeps_prefix() {
        let mut data = vec![0x03];
        data.extend_from_slice(&[0x00, 0x01, b'a', 0x01, 0x01]);
        // `b` claims a number but only has two bytes of it.
        data.extend_from_slice(&[0x00, 0x01, b'b', 0x00, 0x40, 0x00]);

        let decoded = decode(&data);
        let object = decoded.value.as_object().unwrap();
        assert_eq!(object.len(), 1);
        assert_eq!(object.get("a"), Some(&Amf0Value::Boolean(true)));
        assert_eq!(decoded.consumed, 6);
    }

    #[test]
    fn test_reader_strict_array() {
        let mut amf0_array = vec![0x0a, 0x00, 0x00, 0x00, 0x03]; // StrictArray marker with 3 elements
        amf0_array.extend_from_slice(&[0x00]); // Number marker
        amf0_array.extend_from_slice(&1.0_f64.to_be_bytes());
        amf0_array.extend_from_slice(&[0x01, 0x01]); // Boolean true
        amf0_array.extend_from_slice(&[0x02, 0x00, 0x04]); // String with 4 bytes
        amf0_array.extend_from_slice(b"test");

        let decoded = decode(&amf0_array);
        let expected = Amf0Value::StrictArray(vec![
            Amf0Value::Number(1.0),
            Amf0Value::Boolean(true),
            Amf0Value::String("test".into()),
        ]);

        assert_eq!(decoded.value, expected);
        assert_eq!(decoded.consumed, amf0_array.len());
    }

    #[test]
    fn test_reader_object_end() {
        let decoded = decode(&[0x09, 0xAA]);
        assert!(decoded.is_end);
        assert_eq!(decoded.consumed, 1);
    }

    #[test]
    fn test_reader_unknown_marker_skips_window() {
        let decoded = decode(&[0x42, 0x01, 0x02, 0x03]);
        assert_eq!(decoded.value, Amf0Value::Undefined);
        assert_eq!(decoded.consumed, 4);

        // Reference markers are known but not supported.
        let decoded = decode(&[0x07, 0x00, 0x01]);
        assert_eq!(decoded.consumed, 3);
    }

    #[test]
    fn test_reader_eof() {
        assert!(matches!(decode_value(&[]), Err(Amf0ReadError::Io(_))));
        assert!(matches!(decode_value(&[0x00, 0x01]), Err(Amf0ReadError::Io(_))));
        assert!(matches!(
            decode_value(&[0x02, 0x00, 0x05, b'a']),
            Err(Amf0ReadError::UnexpectedEof { needed: 5 })
        ));
    }

    #[test]
    fn test_parse_script_data() {
        let mut data = vec![0x02, 0x00, 0x0a];
        data.extend_from_slice(b"onMetaData");
        data.extend_from_slice(&[0x08, 0x00, 0x00, 0x00, 0x01]);
        data.extend_from_slice(&[0x00, 0x08]);
        data.extend_from_slice(b"duration");
        data.push(0x00);
        data.extend_from_slice(&12.5_f64.to_be_bytes());
        data.extend_from_slice(&[0x00, 0x00, 0x09]);

        let script = parse_script_data(&data).unwrap();
        assert_eq!(script.len(), 1);
        let metadata = script.get("onMetaData").unwrap().as_object().unwrap();
        assert_eq!(metadata.get("duration"), Some(&Amf0Value::Number(12.5)));
    }

    #[test]
    fn test_parse_script_data_requires_string_name() {
        let result = parse_script_data(&[0x01, 0x01, 0x01, 0x00]);
        assert!(matches!(
            result,
            Err(Amf0ReadError::WrongType {
                expected: Amf0Marker::String,
                got: Amf0Marker::Boolean
            })
        ));
    }
}
