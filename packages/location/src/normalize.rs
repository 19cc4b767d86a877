//! Normalizes raw dataset entries into [`FallbackRecord`] values.
//!
//! Uses a [`FieldMapping`] to find each logical field regardless of the
//! column naming a particular dataset vintage uses.

use krishi_mitra_location_models::{FallbackRecord, FieldMapping};

use crate::fields::pick_first;
use crate::postal::normalize_postal_value;

/// A raw dataset entry: an arbitrarily shaped key/value object.
pub type RawEntry = serde_json::Map<String, serde_json::Value>;

/// Normalizes a single raw entry.
///
/// Unknown keys are ignored. A field whose value is missing, `null`, or
/// blank after trimming is left as `None`; that only excludes the record
/// from the corresponding index.
#[must_use]
pub fn normalize_entry(entry: &RawEntry, fields: &FieldMapping) -> FallbackRecord {
    FallbackRecord {
        postal_code: extract_postal_code(entry, fields),
        state: text_field(entry, &fields.state),
        city: text_field(entry, &fields.city),
        constituency: text_field(entry, &fields.constituency),
        gram_panchayat: text_field(entry, &fields.gram_panchayat),
        office_name: passthrough(entry, &fields.office_name),
        sub_district: passthrough(entry, &fields.sub_district),
        latitude: passthrough(entry, &fields.latitude),
        longitude: passthrough(entry, &fields.longitude),
    }
}

/// Extracts and normalizes only the postal code of an entry.
///
/// Slow scans call this for every entry in a file, so it avoids building
/// the full record.
#[must_use]
pub fn extract_postal_code(entry: &RawEntry, fields: &FieldMapping) -> Option<String> {
    pick_first(entry, &fields.postal_code).and_then(normalize_postal_value)
}

/// Trimmed text of the first matching key. Numbers are accepted in their
/// textual form, other JSON types are not text.
fn text_field(entry: &RawEntry, keys: &[String]) -> Option<String> {
    let text = match pick_first(entry, keys)? {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn passthrough(entry: &RawEntry, keys: &[String]) -> Option<serde_json::Value> {
    pick_first(entry, keys).cloned()
}
