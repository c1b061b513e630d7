//! Script data tags carry AMF0 encoded values
//! (<https://wwwimages2.adobe.com/content/dam/acom/en/devnet/pdf/amf0-file-format-specification.pdf>).
//! Only the subset of AMF0 used by `onMetaData` is supported.

use super::{FlvDeserializationError, FlvSerializationError};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::collections::HashMap;
use std::io::{Cursor, Read};

const NUMBER_MARKER: u8 = 0;
const BOOLEAN_MARKER: u8 = 1;
const STRING_MARKER: u8 = 2;
const OBJECT_MARKER: u8 = 3;
const NULL_MARKER: u8 = 5;
const UNDEFINED_MARKER: u8 = 6;
const ECMA_ARRAY_MARKER: u8 = 8;
const OBJECT_END_MARKER: u8 = 9;
const UTF_8_EMPTY_MARKER: u16 = 0;

/// Deepest nesting of objects and arrays accepted when reading
const MAX_NESTING_DEPTH: usize = 64;

/// A value inside a script data tag
#[derive(PartialEq, Debug, Clone)]
pub enum ScriptDataValue {
    Number(f64),
    Boolean(bool),
    String(String),

    /// An associative array whose properties keep the order they were written in
    EcmaArray(Vec<(String, ScriptDataValue)>),
    Null,
}

impl ScriptDataValue {
    pub fn get_number(&self) -> Option<f64> {
        match *self {
            ScriptDataValue::Number(value) => Some(value),
            _ => None,
        }
    }

    /// Finds a property of an `EcmaArray` by name
    pub fn get_property(&self, name: &str) -> Option<&ScriptDataValue> {
        match self {
            ScriptDataValue::EcmaArray(properties) => properties
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value),
            _ => None,
        }
    }
}

/// Serializes a named script data value (e.g. `onMetaData` followed by an ECMA array) and
/// returns where the 8 byte payload of every top level numeric property was written, so the
/// values can be patched in place later on.
pub fn serialize_script_data(
    name: &str,
    value: &ScriptDataValue,
    bytes: &mut Vec<u8>,
) -> Result<HashMap<String, usize>, FlvSerializationError> {
    let mut number_positions = HashMap::new();

    serialize_string(name, bytes)?;
    match value {
        ScriptDataValue::EcmaArray(properties) => {
            bytes.push(ECMA_ARRAY_MARKER);
            bytes.write_u32::<BigEndian>(properties.len() as u32)?;
            for (key, property) in properties {
                serialize_property_name(key, bytes)?;
                if let ScriptDataValue::Number(_) = property {
                    number_positions.insert(key.clone(), bytes.len() + 1);
                }

                serialize_value(property, bytes)?;
            }

            bytes.write_u16::<BigEndian>(UTF_8_EMPTY_MARKER)?;
            bytes.push(OBJECT_END_MARKER);
        }

        other => serialize_value(other, bytes)?,
    }

    Ok(number_positions)
}

/// Reads the name and value out of a script data tag's body
pub fn deserialize_script_data(data: &[u8]) -> Result<(String, ScriptDataValue), FlvDeserializationError> {
    let mut cursor = Cursor::new(data);
    let name = match deserialize_value(&mut cursor, 0)? {
        ScriptDataValue::String(name) => name,
        _ => return Err(FlvDeserializationError::UnexpectedEof),
    };

    let value = deserialize_value(&mut cursor, 0)?;
    Ok((name, value))
}

fn serialize_value(value: &ScriptDataValue, bytes: &mut Vec<u8>) -> Result<(), FlvSerializationError> {
    match value {
        ScriptDataValue::Number(number) => {
            bytes.push(NUMBER_MARKER);
            bytes.write_f64::<BigEndian>(*number)?;
        }

        ScriptDataValue::Boolean(boolean) => {
            bytes.push(BOOLEAN_MARKER);
            bytes.push(*boolean as u8);
        }

        ScriptDataValue::String(string) => serialize_string(string, bytes)?,
        ScriptDataValue::Null => bytes.push(NULL_MARKER),
        ScriptDataValue::EcmaArray(properties) => {
            bytes.push(ECMA_ARRAY_MARKER);
            bytes.write_u32::<BigEndian>(properties.len() as u32)?;
            for (key, property) in properties {
                serialize_property_name(key, bytes)?;
                serialize_value(property, bytes)?;
            }

            bytes.write_u16::<BigEndian>(UTF_8_EMPTY_MARKER)?;
            bytes.push(OBJECT_END_MARKER);
        }
    }

    Ok(())
}

fn serialize_string(value: &str, bytes: &mut Vec<u8>) -> Result<(), FlvSerializationError> {
    bytes.push(STRING_MARKER);
    serialize_property_name(value, bytes)
}

fn serialize_property_name(value: &str, bytes: &mut Vec<u8>) -> Result<(), FlvSerializationError> {
    if value.len() > u16::max_value() as usize {
        return Err(FlvSerializationError::StringTooLong { length: value.len() });
    }

    bytes.write_u16::<BigEndian>(value.len() as u16)?;
    bytes.extend(value.as_bytes());
    Ok(())
}

fn deserialize_value(cursor: &mut Cursor<&[u8]>, depth: usize) -> Result<ScriptDataValue, FlvDeserializationError> {
    let marker = read_or_eof(cursor.read_u8())?;
    match marker {
        NUMBER_MARKER => Ok(ScriptDataValue::Number(read_or_eof(cursor.read_f64::<BigEndian>())?)),
        BOOLEAN_MARKER => Ok(ScriptDataValue::Boolean(read_or_eof(cursor.read_u8())? != 0)),
        STRING_MARKER => Ok(ScriptDataValue::String(read_short_string(cursor)?)),
        NULL_MARKER | UNDEFINED_MARKER => Ok(ScriptDataValue::Null),
        OBJECT_MARKER => Ok(ScriptDataValue::EcmaArray(read_properties(cursor, depth + 1)?)),
        ECMA_ARRAY_MARKER => {
            // The count is only a hint, the array is terminated by the object end marker
            let _ = read_or_eof(cursor.read_u32::<BigEndian>())?;
            Ok(ScriptDataValue::EcmaArray(read_properties(cursor, depth + 1)?))
        }

        marker => Err(FlvDeserializationError::UnknownScriptDataMarker(marker)),
    }
}

fn read_properties(
    cursor: &mut Cursor<&[u8]>,
    depth: usize,
) -> Result<Vec<(String, ScriptDataValue)>, FlvDeserializationError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(FlvDeserializationError::ScriptDataTooDeep(MAX_NESTING_DEPTH));
    }

    let mut properties = Vec::new();
    loop {
        let name = read_short_string(cursor)?;
        if name.is_empty() {
            let end_marker = read_or_eof(cursor.read_u8())?;
            if end_marker != OBJECT_END_MARKER {
                return Err(FlvDeserializationError::UnknownScriptDataMarker(end_marker));
            }

            return Ok(properties);
        }

        let value = deserialize_value(cursor, depth)?;
        properties.push((name, value));
    }
}

fn read_short_string(cursor: &mut Cursor<&[u8]>) -> Result<String, FlvDeserializationError> {
    let length = read_or_eof(cursor.read_u16::<BigEndian>())? as usize;
    let mut buffer = vec![0_u8; length];
    read_or_eof(cursor.read_exact(&mut buffer))?;

    Ok(String::from_utf8(buffer)?)
}

fn read_or_eof<T>(result: std::io::Result<T>) -> Result<T, FlvDeserializationError> {
    result.map_err(|error| match error.kind() {
        std::io::ErrorKind::UnexpectedEof => FlvDeserializationError::UnexpectedEof,
        _ => FlvDeserializationError::Io(error),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> ScriptDataValue {
        ScriptDataValue::EcmaArray(vec![
            ("duration".to_string(), ScriptDataValue::Number(0.0)),
            ("stereo".to_string(), ScriptDataValue::Boolean(false)),
            ("encoder".to_string(), ScriptDataValue::String("test".to_string())),
            ("filesize".to_string(), ScriptDataValue::Number(0.0)),
        ])
    }

    #[test]
    fn can_serialize_ecma_array() {
        let mut bytes = Vec::new();
        let value = ScriptDataValue::EcmaArray(vec![("width".to_string(), ScriptDataValue::Number(1280.0))]);
        serialize_script_data("onMetaData", &value, &mut bytes).unwrap();

        let mut expected = vec![STRING_MARKER];
        expected.write_u16::<BigEndian>(10).unwrap();
        expected.extend(b"onMetaData");
        expected.push(ECMA_ARRAY_MARKER);
        expected.write_u32::<BigEndian>(1).unwrap();
        expected.write_u16::<BigEndian>(5).unwrap();
        expected.extend(b"width");
        expected.push(NUMBER_MARKER);
        expected.write_f64::<BigEndian>(1280.0).unwrap();
        expected.write_u16::<BigEndian>(UTF_8_EMPTY_MARKER).unwrap();
        expected.push(OBJECT_END_MARKER);

        assert_eq!(bytes, expected);
    }

    #[test]
    fn number_positions_point_at_the_value_bytes() {
        let mut bytes = vec![0xEE; 3];
        let positions = serialize_script_data("onMetaData", &metadata(), &mut bytes).unwrap();

        let position = positions["filesize"];
        assert_eq!(bytes[position - 1], NUMBER_MARKER);
        assert_eq!(&bytes[position..position + 8], &0.0_f64.to_be_bytes());
        assert!(!positions.contains_key("stereo"), "Non numeric properties should not be tracked");
    }

    #[test]
    fn serialized_metadata_reads_back() {
        let mut bytes = Vec::new();
        serialize_script_data("onMetaData", &metadata(), &mut bytes).unwrap();

        let (name, value) = deserialize_script_data(&bytes).unwrap();
        assert_eq!(name, "onMetaData");
        assert_eq!(value, metadata());
        assert_eq!(value.get_property("encoder"), Some(&ScriptDataValue::String("test".to_string())));
    }

    #[test]
    fn truncated_script_data_is_an_unexpected_eof() {
        let mut bytes = Vec::new();
        serialize_script_data("onMetaData", &metadata(), &mut bytes).unwrap();

        match deserialize_script_data(&bytes[..bytes.len() - 5]) {
            Err(FlvDeserializationError::UnexpectedEof) => (),
            x => panic!("Unexpected result: {:?}", x),
        }
    }

    #[test]
    fn deeply_nested_objects_are_rejected() {
        let mut bytes = vec![STRING_MARKER];
        bytes.write_u16::<BigEndian>(10).unwrap();
        bytes.extend(b"onMetaData");
        for _ in 0..200_000 {
            bytes.push(OBJECT_MARKER);
            bytes.write_u16::<BigEndian>(1).unwrap();
            bytes.push(b'a');
        }

        match deserialize_script_data(&bytes) {
            Err(FlvDeserializationError::ScriptDataTooDeep(depth)) => assert_eq!(depth, MAX_NESTING_DEPTH),
            x => panic!("Unexpected result: {:?}", x),
        }
    }

    #[test]
    fn nesting_up_to_the_limit_is_readable() {
        let mut value = ScriptDataValue::Number(1.0);
        for _ in 0..MAX_NESTING_DEPTH {
            value = ScriptDataValue::EcmaArray(vec![("a".to_string(), value)]);
        }

        let mut bytes = Vec::new();
        serialize_script_data("onMetaData", &value, &mut bytes).unwrap();

        let (_, read) = deserialize_script_data(&bytes).unwrap();
        assert_eq!(read, value);
    }

    #[test]
    fn error_when_string_length_greater_than_u16() {
        let value = "a".repeat(u16::max_value() as usize + 1);
        let mut bytes = Vec::new();

        match serialize_script_data(&value, &ScriptDataValue::Null, &mut bytes) {
            Err(FlvSerializationError::StringTooLong { length }) => assert_eq!(length, value.len()),
            x => panic!("Unexpected result: {:?}", x),
        }
    }
}
