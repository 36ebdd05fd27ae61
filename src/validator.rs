//! Structural and semantic validation of incoming CR310 readings.
//!
//! Structural validation works on the raw JSON value: required fields must be
//! present and carry the right JSON types, unknown fields are tolerated.
//! Semantic validation works on the typed record: equipment id and timestamp
//! format, per-channel ranges, the temperature plausibility check and the
//! advisory duplicate lookup.

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ReadingError, ReadingResult};
use crate::models::{parse_timestamp, required_fields, RawCr310Reading};
use crate::ranges::{temperature_spread, Channel, MAX_TEMPERATURE_SPREAD};
use crate::store::ReadingStore;

// ---

/// Check presence and JSON types of the required fields, then parse into a
/// [`RawCr310Reading`].
///
/// Every missing field is reported in one error. Channels must be JSON numbers
/// (or `null`, rejected later by the normalizer); `equipo` and `timestamp` must
/// be strings. Never consults the store.
pub fn validate_structure(body: &Value) -> ReadingResult<RawCr310Reading> {
    // ---
    let obj = body.as_object().ok_or_else(|| {
        ReadingError::TypeMismatch("Request body must be a JSON object".to_string())
    })?;

    let missing: Vec<&'static str> = required_fields()
        .filter(|field| !obj.contains_key(*field))
        .collect();
    if !missing.is_empty() {
        return Err(ReadingError::MissingFields(missing));
    }

    for channel in Channel::ALL {
        let numeric = matches!(
            obj.get(channel.name()),
            Some(Value::Number(_)) | Some(Value::Null)
        );
        if !numeric {
            return Err(ReadingError::TypeMismatch(format!(
                "Field '{}' must be numeric",
                channel.name()
            )));
        }
    }

    for field in ["equipo", "timestamp"] {
        if !obj.get(field).is_some_and(Value::is_string) {
            return Err(ReadingError::TypeMismatch(format!(
                "Field '{field}' must be a string"
            )));
        }
    }

    let raw: RawCr310Reading = serde_json::from_value(body.clone())
        .map_err(|e| ReadingError::TypeMismatch(format!("Invalid reading structure: {e}")))?;

    if !raw.extra.is_empty() {
        let names: Vec<&str> = raw.extra.keys().map(String::as_str).collect();
        warn!("Unexpected fields in data: {:?}", names);
    }

    Ok(raw)
}

/// Semantic checks that need no store access.
///
/// Fails on the first failing category; within the range check every
/// violation is collected into one message.
pub fn check_semantics(raw: &RawCr310Reading) -> ReadingResult<()> {
    // ---
    if raw.equipo.trim().is_empty() {
        return Err(ReadingError::InvalidFormat(
            "equipo cannot be empty".to_string(),
        ));
    }

    if parse_timestamp(&raw.timestamp).is_none() {
        return Err(ReadingError::InvalidFormat(
            "timestamp must be in format: YYYY-MM-DD HH:MM:SS".to_string(),
        ));
    }

    let out_of_range: Vec<String> = Channel::ALL
        .into_iter()
        .filter_map(|c| {
            let value = raw.channel(c)?;
            let range = c.range();
            (!range.contains(value)).then(|| format!("{c}={value} (valid: {range})"))
        })
        .collect();
    if !out_of_range.is_empty() {
        return Err(ReadingError::OutOfRange(out_of_range));
    }

    ensure_consistent_temperatures(
        Channel::TEMPERATURES
            .into_iter()
            .filter_map(|c| raw.channel(c)),
    )
}

/// Full semantic validation, including the advisory duplicate lookup.
///
/// The lookup uses the key as it will be stored (trimmed, upper-cased
/// `equipo`). It only fails fast; the store's atomic insert stays the
/// authoritative guard.
pub async fn validate_semantics(
    raw: RawCr310Reading,
    store: &dyn ReadingStore,
) -> ReadingResult<RawCr310Reading> {
    // ---
    check_semantics(&raw)?;

    let equipo = raw.equipo_key();
    if store.exists(&equipo, &raw.timestamp).await? {
        return Err(ReadingError::DuplicateReading {
            equipo,
            timestamp: raw.timestamp,
        });
    }

    debug!("Semantic validation passed: {} - {}", equipo, raw.timestamp);
    Ok(raw)
}

/// Reject readings whose temperature-like channels spread more than
/// [`MAX_TEMPERATURE_SPREAD`] units.
pub(crate) fn ensure_consistent_temperatures<I>(values: I) -> ReadingResult<()>
where
    I: IntoIterator<Item = f64>,
{
    // ---
    match temperature_spread(values) {
        Some(spread) if spread > MAX_TEMPERATURE_SPREAD => {
            warn!("Large temperature range detected: {:.2}", spread);
            Err(ReadingError::InconsistentValues {
                spread,
                limit: MAX_TEMPERATURE_SPREAD,
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::models::CanonicalReading;
    use crate::store::InMemoryStore;
    use serde_json::json;
    use tokio_test::assert_ok;

    fn valid_body() -> Value {
        // ---
        json!({
            "equipo": "T101",
            "SO2_ppb": 25.43,
            "H2S_ppb": 2.18,
            "Reaction_Temp": 35.0,
            "IZS_Temp": 34.2,
            "PMT_Temp": 36.1,
            "SampleFlow": 452.3,
            "Pressure": 29.76,
            "UVLampIntensity": 403.5,
            "Box_Temp": 33.7,
            "HVPS_V": 671.2,
            "Conv_Temp": 35.9,
            "Ozone_flow": 480.5,
            "timestamp": "2025-10-27 18:30:00"
        })
    }

    fn raw_with(field: &str, value: Value) -> RawCr310Reading {
        // ---
        let mut body = valid_body();
        body[field] = value;
        validate_structure(&body).unwrap()
    }

    #[test]
    fn test_structure_accepts_valid_body() {
        // ---
        let raw = assert_ok!(validate_structure(&valid_body()));
        assert_eq!(raw.equipo, "T101");
        assert_eq!(raw.channel(Channel::Pressure), Some(29.76));
        assert!(raw.extra.is_empty());
    }

    #[test]
    fn test_structure_lists_every_missing_field() {
        // ---
        let body = json!({
            "equipo": "T101",
            "SO2_ppb": 25.43,
            "timestamp": "2025-10-27 18:30:00"
        });

        match validate_structure(&body) {
            Err(ReadingError::MissingFields(fields)) => {
                assert_eq!(fields.len(), 11);
                assert_eq!(fields[0], "H2S_ppb");
                assert_eq!(fields[10], "Ozone_flow");
            }
            other => panic!("expected MissingFields, got {other:?}"),
        }
    }

    #[test]
    fn test_structure_rejects_non_numeric_channel() {
        // ---
        let mut body = valid_body();
        body["SO2_ppb"] = json!("not a number");

        let err = validate_structure(&body).unwrap_err();
        assert!(matches!(err, ReadingError::TypeMismatch(_)));
        assert_eq!(err.to_string(), "Field 'SO2_ppb' must be numeric");

        body["SO2_ppb"] = json!(true);
        assert!(matches!(
            validate_structure(&body),
            Err(ReadingError::TypeMismatch(_))
        ));
    }

    #[test]
    fn test_structure_rejects_non_string_identity_fields() {
        // ---
        let mut body = valid_body();
        body["equipo"] = json!(101);
        assert_eq!(
            validate_structure(&body).unwrap_err().to_string(),
            "Field 'equipo' must be a string"
        );

        let mut body = valid_body();
        body["timestamp"] = json!(1730053800);
        assert_eq!(
            validate_structure(&body).unwrap_err().to_string(),
            "Field 'timestamp' must be a string"
        );
    }

    #[test]
    fn test_structure_rejects_non_object_body() {
        // ---
        assert!(matches!(
            validate_structure(&json!([1, 2, 3])),
            Err(ReadingError::TypeMismatch(_))
        ));
    }

    #[test]
    fn test_structure_tolerates_unknown_fields_and_null_channels() {
        // ---
        let mut body = valid_body();
        body["battery_v"] = json!(12.6);
        body["Pressure"] = Value::Null;

        let raw = assert_ok!(validate_structure(&body));
        assert!(raw.extra.contains_key("battery_v"));
        assert_eq!(raw.channel(Channel::Pressure), None);
    }

    #[test]
    fn test_semantics_rejects_blank_equipo() {
        // ---
        let raw = raw_with("equipo", json!("   "));
        assert!(matches!(
            check_semantics(&raw),
            Err(ReadingError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_semantics_rejects_bad_timestamp() {
        // ---
        for ts in [
            "2025/10/27 18:30:00",
            "2025-10-27",
            "2025-13-01 00:00:00",
            "2025-10-27 18:30:60",
        ] {
            let raw = raw_with("timestamp", json!(ts));
            let err = check_semantics(&raw).unwrap_err();
            assert!(matches!(err, ReadingError::InvalidFormat(_)), "{ts}");
            assert!(err.to_string().contains("YYYY-MM-DD HH:MM:SS"));
        }
    }

    #[test]
    fn test_semantics_reports_out_of_range_value() {
        // ---
        let raw = raw_with("SO2_ppb", json!(99999));
        let err = check_semantics(&raw).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Values out of range: SO2_ppb=99999 (valid: 0-10000)"
        );
    }

    #[test]
    fn test_semantics_collects_all_range_violations() {
        // ---
        let mut body = valid_body();
        body["H2S_ppb"] = json!(-1);
        body["Pressure"] = json!(100.5);
        body["Box_Temp"] = json!(61);
        let raw = validate_structure(&body).unwrap();

        match check_semantics(&raw) {
            Err(ReadingError::OutOfRange(items)) => {
                assert_eq!(
                    items,
                    vec![
                        "H2S_ppb=-1 (valid: 0-1000)",
                        "Pressure=100.5 (valid: 0-100)",
                        "Box_Temp=61 (valid: 20-60)",
                    ]
                );
            }
            other => panic!("expected OutOfRange, got {other:?}"),
        }
    }

    #[test]
    fn test_semantics_accepts_bounds() {
        // ---
        let mut body = valid_body();
        body["SO2_ppb"] = json!(0);
        body["Pressure"] = json!(100);
        let raw = validate_structure(&body).unwrap();
        assert_ok!(check_semantics(&raw));
    }

    #[test]
    fn test_semantics_rejects_wide_temperature_spread() {
        // ---
        // Every channel is within [20, 60] but the spread is 35
        let mut body = valid_body();
        body["Reaction_Temp"] = json!(21.0);
        body["Conv_Temp"] = json!(56.0);
        let raw = validate_structure(&body).unwrap();

        assert!(matches!(
            check_semantics(&raw),
            Err(ReadingError::InconsistentValues { .. })
        ));
    }

    #[test]
    fn test_semantics_accepts_spread_of_exactly_thirty() {
        // ---
        let mut body = valid_body();
        body["Reaction_Temp"] = json!(25.0);
        body["IZS_Temp"] = json!(55.0);
        body["PMT_Temp"] = json!(30.0);
        body["Box_Temp"] = json!(30.0);
        body["Conv_Temp"] = json!(30.0);
        let raw = validate_structure(&body).unwrap();
        assert_ok!(check_semantics(&raw));
    }

    #[tokio::test]
    async fn test_semantics_flags_duplicate_using_normalized_key() {
        // ---
        let store = InMemoryStore::new();
        let stored: CanonicalReading =
            crate::normalizer::normalize(&validate_structure(&valid_body()).unwrap()).unwrap();
        store.insert(&stored).await.unwrap();

        let raw = raw_with("equipo", json!("  t101 "));
        let err = validate_semantics(raw, &store).await.unwrap_err();
        assert!(matches!(err, ReadingError::DuplicateReading { .. }));
        assert!(err.to_string().contains("Duplicate"));
    }

    #[tokio::test]
    async fn test_semantics_surfaces_store_outage() {
        // ---
        let store = InMemoryStore::new();
        store.set_unavailable(true);

        let raw = validate_structure(&valid_body()).unwrap();
        let err = validate_semantics(raw, &store).await.unwrap_err();
        assert!(matches!(err, ReadingError::StoreUnavailable(_)));
    }
}
