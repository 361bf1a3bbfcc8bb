//! TXT record contents.
//!
//! From RFC 6763 section 6: the format of each constituent string within a
//! DNS TXT record is a single length byte, followed by 0-255 bytes of text
//! data. DNS-SD uses TXT records to store arbitrary key/value pairs, each
//! encoded as its own constituent string in the form "key=value":
//! everything up to the first '=' is the key, everything after it is the
//! value. Strings with no '=' carry free-form text.

#[cfg(feature = "logging")]
use crate::log::error;
use std::collections::{HashMap, HashSet};

/// Properties and free-form strings carried in a TXT record.
///
/// The key of a property is case insensitive, and only one [`TxtProperty`]
/// is stored for a given key.
///
/// [RFC 6763](https://www.rfc-editor.org/rfc/rfc6763#section-6.4):
/// "A given key SHOULD NOT appear more than once in a TXT record."
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TxtProperties {
    // `Vec` instead of `HashMap` to keep the order of insertions.
    properties: Vec<TxtProperty>,
    // Constituent strings without a '=' in them.
    texts: Vec<String>,
}

impl TxtProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an iterator for all key/value properties.
    pub fn iter(&self) -> impl Iterator<Item = &TxtProperty> {
        self.properties.iter()
    }

    /// Returns the number of key/value properties.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty() && self.texts.is_empty()
    }

    /// Returns a property for a given `key`, where `key` is
    /// case insensitive.
    pub fn get(&self, key: &str) -> Option<&TxtProperty> {
        let key = key.to_lowercase();
        self.properties
            .iter()
            .find(|prop| prop.key.to_lowercase() == key)
    }

    /// Returns a property value string for a given `key`, where `key` is
    /// case insensitive.
    pub fn get_property_val(&self, key: &str) -> Option<&str> {
        self.get(key).map(|prop| prop.val())
    }

    /// The constituent strings that carried no '='.
    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    /// Appends a free-form string.
    pub fn push_text(&mut self, text: impl ToString) {
        self.texts.push(text.to_string());
    }

    /// Encodes to TXT RDATA: one length-prefixed string per property
    /// (`key=value`), then one per free-form text. An empty record
    /// encodes as a single zero byte.
    pub(crate) fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        for prop in self.properties.iter() {
            let entry = format!("{}={}", prop.key, prop.val);
            assert!(entry.len() <= 255);
            bytes.push(entry.len() as u8);
            bytes.extend_from_slice(entry.as_bytes());
        }
        for text in self.texts.iter() {
            assert!(text.len() <= 255);
            bytes.push(text.len() as u8);
            bytes.extend_from_slice(text.as_bytes());
        }
        if bytes.is_empty() {
            bytes.push(0);
        }
        bytes
    }

    /// Decodes TXT RDATA. Constituent strings that are not valid UTF-8
    /// are logged and skipped.
    pub(crate) fn from_bytes(txt: &[u8]) -> Self {
        let mut decoded = Self::new();
        let mut offset = 0;
        while offset < txt.len() {
            let length = txt[offset] as usize;
            if length == 0 {
                break; // reached the end
            }
            offset += 1; // move over the length byte
            let entry = match txt.get(offset..offset + length) {
                Some(bytes) => bytes,
                None => {
                    error!("TXT entry of {} bytes runs past the record data", length);
                    break;
                }
            };
            match String::from_utf8(entry.to_vec()) {
                Ok(kv_string) => match kv_string.find('=') {
                    Some(idx) => {
                        let k = &kv_string[..idx];
                        let v = &kv_string[idx + 1..];
                        decoded.properties.push(TxtProperty {
                            key: k.to_string(),
                            val: v.to_string(),
                        });
                    }
                    None => decoded.texts.push(kv_string),
                },
                Err(e) => error!("failed to convert TXT entry to String: {}", e),
            }
            offset += length;
        }

        decoded
    }
}

/// Represents a property in a TXT record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxtProperty {
    /// The name of the property. The original cases are kept.
    key: String,

    /// RFC 6763 says values are bytes, not necessarily UTF-8.
    /// For now we define `val` as UTF-8 for ergonomics benefits.
    val: String,
}

impl TxtProperty {
    /// Returns the key of a property.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the value of a property.
    pub fn val(&self) -> &str {
        &self.val
    }
}

/// Supports constructing from a tuple.
impl<K, V> From<&(K, V)> for TxtProperty
where
    K: ToString,
    V: ToString,
{
    fn from(prop: &(K, V)) -> Self {
        TxtProperty {
            key: prop.0.to_string(),
            val: prop.1.to_string(),
        }
    }
}

/// This trait allows for converting inputs into [`TxtProperties`].
pub trait IntoTxtProperties {
    fn into_txt_properties(self) -> TxtProperties;
}

impl IntoTxtProperties for TxtProperties {
    fn into_txt_properties(self) -> TxtProperties {
        self
    }
}

impl IntoTxtProperties for HashMap<String, String> {
    fn into_txt_properties(mut self) -> TxtProperties {
        let properties = self
            .drain()
            .map(|(key, val)| TxtProperty { key, val })
            .collect();
        TxtProperties {
            properties,
            texts: Vec::new(),
        }
    }
}

impl IntoTxtProperties for Option<HashMap<String, String>> {
    fn into_txt_properties(self) -> TxtProperties {
        match self {
            None => TxtProperties::new(),
            Some(map) => map.into_txt_properties(),
        }
    }
}

/// Support slices like `&[("k1", "v1"), ("k2", "v2")]`.
impl<'a, T: 'a> IntoTxtProperties for &'a [T]
where
    TxtProperty: From<&'a T>,
{
    fn into_txt_properties(self) -> TxtProperties {
        let mut properties = Vec::new();
        let mut keys = HashSet::new();
        for t in self.iter() {
            let prop = TxtProperty::from(t);
            let key = prop.key.to_lowercase();
            if keys.insert(key) {
                // Only push a new entry if the key did not exist.
                //
                // RFC 6763: "If a client receives a TXT record containing
                // the same key more than once, then the client MUST
                // silently ignore all but the first occurrence of that
                // attribute."
                properties.push(prop);
            }
        }
        TxtProperties {
            properties,
            texts: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{IntoTxtProperties, TxtProperties, TxtProperty};

    #[test]
    fn test_txt_encode_decode() {
        let properties = [("key1", "value1"), ("key2", "value2")][..].into_txt_properties();

        // test encode
        let encoded = properties.to_bytes();
        assert_eq!(
            encoded.len(),
            "key1=".len() + "value1".len() + "key2=".len() + "value2".len() + 2
        );
        assert_eq!(encoded[0] as usize, "key1=".len() + "value1".len());

        // test decode
        let decoded = TxtProperties::from_bytes(&encoded);
        assert_eq!(decoded, properties);
    }

    #[test]
    fn test_free_form_texts_roundtrip() {
        let mut properties = [("model", "J42dAP")][..].into_txt_properties();
        properties.push_text("standalone");

        let encoded = properties.to_bytes();
        let decoded = TxtProperties::from_bytes(&encoded);
        assert_eq!(decoded.get_property_val("model"), Some("J42dAP"));
        assert_eq!(decoded.texts(), &["standalone".to_string()]);
        assert_eq!(decoded, properties);
    }

    #[test]
    fn test_empty_txt_is_a_single_zero_byte() {
        let properties = TxtProperties::new();
        let encoded = properties.to_bytes();
        assert_eq!(encoded, vec![0]);
        assert!(TxtProperties::from_bytes(&encoded).is_empty());
    }

    #[test]
    fn test_case_insensitive_first_occurrence_wins() {
        let properties = [("Key", "one"), ("key", "two")][..].into_txt_properties();
        assert_eq!(properties.len(), 1);
        assert_eq!(properties.get_property_val("KEY"), Some("one"));
    }

    #[test]
    fn test_bad_utf8_entry_is_skipped() {
        let raw = [4, 0xFF, 0xFE, b'=', b'x', 3, b'a', b'=', b'b'];
        let decoded = TxtProperties::from_bytes(&raw);
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded.get_property_val("a"), Some("b"));
    }

    #[test]
    fn test_truncated_entry_stops_the_scan() {
        let raw = [3, b'a', b'=', b'b', 9, b'x'];
        let decoded = TxtProperties::from_bytes(&raw);
        assert_eq!(decoded.get_property_val("a"), Some("b"));
        assert_eq!(decoded.len(), 1);
    }

    #[test]
    fn test_from_tuple() {
        let prop = TxtProperty::from(&("key", 1234));
        assert_eq!(prop.key(), "key");
        assert_eq!(prop.val(), "1234");
    }
}
