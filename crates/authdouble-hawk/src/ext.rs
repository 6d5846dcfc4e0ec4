//! Extension payload encoding.
//!
//! The `ext` field carries a JSON object, serialized with sorted keys and
//! base64-encoded. The JSON text uses `", "` / `": "` separators and escapes
//! everything outside printable ASCII as `\uXXXX`. This is the canonical
//! form existing fake-Hawk clients emit, so a header minted here carries
//! the same `ext` bytes (and therefore the same `mac`) for the same inputs.

use std::io;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::{Map, Value};

/// Arbitrary mapping embedded in a credential (e.g. `{"scopes": [...]}`).
pub type ExtensionPayload = Map<String, Value>;

/// Encode an extension payload into the base64 text stored in `ext`.
pub fn encode_ext(payload: &ExtensionPayload) -> String {
    STANDARD.encode(canonical_json(&Value::Object(payload.clone())))
}

/// Decode the base64 text of an `ext` field.
///
/// Any failure (bad base64, bad UTF-8, bad JSON, or JSON that is not an
/// object) yields an empty payload.
pub fn decode_ext(raw: &str) -> ExtensionPayload {
    let Ok(bytes) = STANDARD.decode(raw) else {
        return ExtensionPayload::new();
    };
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => map,
        _ => ExtensionPayload::new(),
    }
}

/// Serialize `value` with recursively sorted keys, `", "` and `": "` separators.
pub fn canonical_json(value: &Value) -> Vec<u8> {
    let sorted = sort_keys(value);
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, SpacedAsciiFormatter);
    sorted
        .serialize(&mut ser)
        .expect("serializing a JSON value into memory cannot fail");
    buf
}

// Rebuilds objects in key order so the output does not depend on whether
// serde_json's `preserve_order` feature is enabled somewhere in the graph.
fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), sort_keys(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

struct SpacedAsciiFormatter;

impl Formatter for SpacedAsciiFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (idx, ch) in fragment.char_indices() {
            if (' '..='~').contains(&ch) {
                continue;
            }
            writer.write_all(&fragment.as_bytes()[start..idx])?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = idx + ch.len_utf8();
        }
        writer.write_all(&fragment.as_bytes()[start..])
    }
}
