//! Compile-time field mapping table.
//!
//! The raw key names accepted for each logical field live in
//! `fields.toml`, embedded via `include_str!`. Supporting a new dataset
//! vendor means adding its column names there; indexing code never
//! mentions raw keys.

use std::sync::LazyLock;

use krishi_mitra_location_models::FieldMapping;

use crate::LocationError;

/// Embedded default field table.
const FIELDS_TOML: &str = include_str!("../fields.toml");

static DEFAULT_MAPPING: LazyLock<FieldMapping> = LazyLock::new(|| {
    parse_field_mapping(FIELDS_TOML)
        .unwrap_or_else(|e| panic!("Failed to parse embedded fields.toml: {e}"))
});

/// Returns the embedded default field mapping.
///
/// # Panics
///
/// Panics if the embedded TOML fails to parse. It is a compile-time
/// constant, so a failure is a development error caught by tests.
#[must_use]
pub fn default_mapping() -> &'static FieldMapping {
    &DEFAULT_MAPPING
}

/// Parses a field mapping table from TOML.
///
/// # Errors
///
/// Returns [`LocationError::FieldMapping`] if the document is not valid
/// TOML or is missing one of the required key lists.
pub fn parse_field_mapping(toml_str: &str) -> Result<FieldMapping, LocationError> {
    Ok(toml::de::from_str(toml_str)?)
}

/// Returns the first value among `keys` that is present and not `null`.
#[must_use]
pub fn pick_first<'a>(
    entry: &'a serde_json::Map<String, serde_json::Value>,
    keys: &[String],
) -> Option<&'a serde_json::Value> {
    keys.iter()
        .filter_map(|key| entry.get(key))
        .find(|value| !value.is_null())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("test entry must be an object"),
        }
    }

    #[test]
    fn default_mapping_loads() {
        let mapping = default_mapping();
        assert_eq!(mapping.postal_code.first().map(String::as_str), Some("pincode"));
        assert!(mapping.state.iter().any(|k| k == "statename"));
        assert!(mapping.city.iter().any(|k| k == "district"));
        assert!(mapping.constituency.iter().any(|k| k == "ac_name"));
        assert!(!mapping.gram_panchayat.is_empty());
        assert!(!mapping.latitude.is_empty());
        assert!(!mapping.longitude.is_empty());
    }

    #[test]
    fn default_mapping_has_no_duplicate_keys_per_field() {
        let mapping = default_mapping();
        for keys in [
            &mapping.postal_code,
            &mapping.state,
            &mapping.city,
            &mapping.constituency,
            &mapping.gram_panchayat,
            &mapping.office_name,
            &mapping.sub_district,
            &mapping.latitude,
            &mapping.longitude,
        ] {
            let mut seen = std::collections::BTreeSet::new();
            for key in keys {
                assert!(seen.insert(key), "Duplicate raw key: {key}");
            }
        }
    }

    #[test]
    fn pick_first_respects_priority() {
        let keys = vec!["statename".to_string(), "state".to_string()];
        let e = entry(serde_json::json!({"state": "Punjab", "statename": "KERALA"}));
        assert_eq!(pick_first(&e, &keys), Some(&serde_json::json!("KERALA")));
    }

    #[test]
    fn pick_first_skips_null() {
        let keys = vec!["statename".to_string(), "state".to_string()];
        let e = entry(serde_json::json!({"statename": null, "state": "Punjab"}));
        assert_eq!(pick_first(&e, &keys), Some(&serde_json::json!("Punjab")));
    }

    #[test]
    fn pick_first_missing() {
        let keys = vec!["state".to_string()];
        let e = entry(serde_json::json!({"region": "Kerala"}));
        assert!(pick_first(&e, &keys).is_none());
    }

    #[test]
    fn parses_custom_mapping() {
        let mapping = parse_field_mapping(
            r#"
            postal_code = ["zip"]
            state = ["province"]
            city = ["town"]
            constituency = ["seat"]
            "#,
        )
        .unwrap();
        assert_eq!(mapping.postal_code, vec!["zip"]);
        assert!(mapping.gram_panchayat.is_empty());
    }

    #[test]
    fn rejects_incomplete_mapping() {
        assert!(matches!(
            parse_field_mapping("postal_code = [\"zip\"]"),
            Err(LocationError::FieldMapping(_))
        ));
    }
}
