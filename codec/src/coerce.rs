//! Total coercions from loosely-typed decoded values to the canonical
//! model's strongly-typed fields.
//!
//! Every decode path funnels through `serde_json::Value` before
//! normalization, so these functions are the single place where loose data
//! becomes typed. They have no failure mode beyond "absent": a malformed
//! field degrades instead of aborting the whole parse, and the fallback
//! behavior is identical for every input so cross-format round trips stay
//! deterministic.

use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use num_bigint::BigInt;
use serde_json::Value;

/// Coerce a decoded value into an arbitrary-precision integer.
///
/// Accepts native integers exactly, floats truncated toward zero, and
/// base-10 digit strings of unbounded magnitude. Anything else is absent.
pub fn to_bigint(value: &Value) -> Option<BigInt> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(BigInt::from(i))
            } else if let Some(u) = n.as_u64() {
                Some(BigInt::from(u))
            } else {
                n.as_f64().map(|f| BigInt::from(f.trunc() as i64))
            }
        }
        Value::String(s) => BigInt::from_str(s).ok(),
        _ => None,
    }
}

/// Coerce a decoded value into a UTC timestamp.
///
/// Accepts RFC 3339 text, digit strings as epoch seconds, and numbers as
/// epoch seconds. Anything else is absent.
pub fn to_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            if let Ok(t) = DateTime::parse_from_rfc3339(s) {
                return Some(t.with_timezone(&Utc));
            }
            let secs = s.parse::<i64>().ok()?;
            Utc.timestamp_opt(secs, 0).single()
        }
        Value::Number(n) => {
            let secs = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            Utc.timestamp_opt(secs, 0).single()
        }
        _ => None,
    }
}

/// Coerce a decoded value into an ordered string list.
///
/// Arrays map element-wise through [`to_string_lossy`]; a lone string is a
/// one-element list; any other scalar is stringified as a one-element
/// list; null is empty.
pub fn to_string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.iter().map(to_string_lossy).collect(),
        Value::String(s) => vec![s.clone()],
        other => vec![other.to_string()],
    }
}

/// Coerce any decoded value into text.
///
/// Native strings pass through; every other value degrades to its compact
/// JSON encoding, so nested structures never abort a parse, they become an
/// opaque textual blob.
pub fn to_string_lossy(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Coerce a decoded value into an optional string field: null and absent
/// stay absent, everything else goes through [`to_string_lossy`].
pub fn to_opt_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        other => Some(to_string_lossy(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bigint_from_number_and_string() {
        assert_eq!(to_bigint(&json!(42)), Some(BigInt::from(42)));
        assert_eq!(to_bigint(&json!(-7)), Some(BigInt::from(-7)));
        assert_eq!(to_bigint(&json!("1000")), Some(BigInt::from(1000)));
        assert_eq!(to_bigint(&json!(u64::MAX)), Some(BigInt::from(u64::MAX)));
    }

    #[test]
    fn test_bigint_beyond_64_bits_via_string() {
        let huge = "123456789012345678901234567890123456789";
        assert_eq!(
            to_bigint(&json!(huge)),
            Some(BigInt::from_str(huge).unwrap())
        );
    }

    #[test]
    fn test_bigint_float_truncates_toward_zero() {
        assert_eq!(to_bigint(&json!(3.9)), Some(BigInt::from(3)));
        assert_eq!(to_bigint(&json!(-3.9)), Some(BigInt::from(-3)));
    }

    #[test]
    fn test_bigint_garbage_is_absent() {
        assert_eq!(to_bigint(&json!("not a number")), None);
        assert_eq!(to_bigint(&json!(true)), None);
        assert_eq!(to_bigint(&json!([1, 2])), None);
        assert_eq!(to_bigint(&Value::Null), None);
    }

    #[test]
    fn test_timestamp_rfc3339_and_epoch() {
        let expected = Utc.timestamp_opt(1_700_000_000, 0).single();
        assert_eq!(to_timestamp(&json!("2023-11-14T22:13:20Z")), expected);
        assert_eq!(to_timestamp(&json!(1_700_000_000)), expected);
        assert_eq!(to_timestamp(&json!("1700000000")), expected);
    }

    #[test]
    fn test_timestamp_garbage_is_absent() {
        assert_eq!(to_timestamp(&json!("yesterday")), None);
        assert_eq!(to_timestamp(&json!(["2023"])), None);
        assert_eq!(to_timestamp(&Value::Null), None);
    }

    #[test]
    fn test_string_list_variants() {
        assert_eq!(
            to_string_list(&json!(["a", "b"])),
            vec!["a".to_string(), "b".to_string()]
        );
        assert_eq!(to_string_list(&json!("solo")), vec!["solo".to_string()]);
        assert_eq!(to_string_list(&json!(5)), vec!["5".to_string()]);
        assert_eq!(to_string_list(&Value::Null), Vec::<String>::new());
        // Non-string elements degrade through the lossy string coercion
        assert_eq!(
            to_string_list(&json!([1, {"k": "v"}])),
            vec!["1".to_string(), "{\"k\":\"v\"}".to_string()]
        );
    }

    #[test]
    fn test_string_lossy_degrades_structures() {
        assert_eq!(to_string_lossy(&json!("plain")), "plain");
        assert_eq!(to_string_lossy(&json!({"a": 1})), "{\"a\":1}");
        assert_eq!(to_string_lossy(&json!(true)), "true");
        assert_eq!(to_string_lossy(&Value::Null), "");
    }
}
