// Lenient field decoders for the planning API
//
// The backend serialises Django DecimalFields as strings ("500.00"), foreign
// keys either as bare ids or as nested objects, and sometimes sends `null`
// where a list is expected. These helpers accept every shape we have seen.

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Number(f64),
    Text(String),
}

fn parse_amount<E: de::Error>(raw: RawAmount) -> Result<Option<f64>, E> {
    match raw {
        RawAmount::Number(n) => Ok(Some(n)),
        RawAmount::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<f64>()
                .map(Some)
                .map_err(|_| E::custom(format!("invalid decimal amount: {:?}", s)))
        }
    }
}

/// Decimal that may be a number, a numeric string, blank or null (→ 0).
pub fn decimal<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    match Option::<RawAmount>::deserialize(d)? {
        Some(raw) => Ok(parse_amount(raw)?.unwrap_or(0.0)),
        None => Ok(0.0),
    }
}

/// Decimal where blank and null mean "not set".
pub fn optional_decimal<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    match Option::<RawAmount>::deserialize(d)? {
        Some(raw) => parse_amount(raw),
        None => Ok(None),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRef {
    Id(u64),
    Text(String),
    Object { id: u64 },
}

fn parse_ref<E: de::Error>(raw: RawRef) -> Result<Option<u64>, E> {
    match raw {
        RawRef::Id(id) | RawRef::Object { id } => Ok(Some(id)),
        RawRef::Text(s) if s.trim().is_empty() => Ok(None),
        RawRef::Text(s) => s
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| E::custom(format!("invalid id reference: {:?}", s))),
    }
}

/// Foreign key given as an id, a numeric string, `{ "id": .. }` or null.
pub fn id_ref<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    match Option::<RawRef>::deserialize(d)? {
        Some(raw) => parse_ref(raw),
        None => Ok(None),
    }
}

/// Many-to-many list of ids or nested objects.
pub fn id_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u64>, D::Error> {
    let raw = Option::<Vec<RawRef>>::deserialize(d)?.unwrap_or_default();
    let mut ids = Vec::with_capacity(raw.len());
    for item in raw {
        if let Some(id) = parse_ref(item)? {
            ids.push(id);
        }
    }
    Ok(ids)
}

/// Free text that the backend sometimes sends as a number.
pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawText {
        Text(String),
        Number(f64),
    }

    Ok(match Option::<RawText>::deserialize(d)? {
        Some(RawText::Text(s)) if s.trim().is_empty() => None,
        Some(RawText::Text(s)) => Some(s),
        Some(RawText::Number(n)) => Some(format_number(n)),
        None => None,
    })
}

/// List that may be null.
pub fn list<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(Option::<Vec<T>>::deserialize(d)?.unwrap_or_default())
}

/// `{ "<objective id>": weight }` map, weights as numbers or strings.
pub fn weight_map<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<Option<BTreeMap<u64, f64>>, D::Error> {
    let Some(raw) = Option::<BTreeMap<String, RawAmount>>::deserialize(d)? else {
        return Ok(None);
    };
    let mut weights = BTreeMap::new();
    for (key, value) in raw {
        let id = key
            .trim()
            .parse::<u64>()
            .map_err(|_| de::Error::custom(format!("invalid objective id key: {:?}", key)))?;
        if let Some(weight) = parse_amount(value)? {
            weights.insert(id, weight);
        }
    }
    Ok(Some(weights))
}

/// Render a number without a trailing ".0" for whole values.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "decimal")]
        amount: f64,
        #[serde(default, deserialize_with = "optional_decimal")]
        override_weight: Option<f64>,
        #[serde(default, deserialize_with = "id_ref")]
        organization: Option<u64>,
        #[serde(default, deserialize_with = "id_list")]
        objectives: Vec<u64>,
        #[serde(default, deserialize_with = "text")]
        baseline: Option<String>,
        #[serde(default, deserialize_with = "list")]
        months: Vec<String>,
        #[serde(default, deserialize_with = "weight_map")]
        weights: Option<BTreeMap<u64, f64>>,
    }

    #[test]
    fn test_decimal_accepts_strings_numbers_and_null() {
        let s: Sample = serde_json::from_str(r#"{"amount": "500.00"}"#).unwrap();
        assert_eq!(s.amount, 500.0);
        let s: Sample = serde_json::from_str(r#"{"amount": 12}"#).unwrap();
        assert_eq!(s.amount, 12.0);
        let s: Sample = serde_json::from_str(r#"{"amount": null}"#).unwrap();
        assert_eq!(s.amount, 0.0);
        let s: Sample = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(s.amount, 0.0);
    }

    #[test]
    fn test_decimal_rejects_garbage() {
        let result: Result<Sample, _> = serde_json::from_str(r#"{"amount": "abc"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_optional_decimal_blank_is_none() {
        let s: Sample = serde_json::from_str(r#"{"override_weight": ""}"#).unwrap();
        assert_eq!(s.override_weight, None);
        let s: Sample = serde_json::from_str(r#"{"override_weight": "55"}"#).unwrap();
        assert_eq!(s.override_weight, Some(55.0));
    }

    #[test]
    fn test_id_ref_shapes() {
        let s: Sample = serde_json::from_str(r#"{"organization": 7}"#).unwrap();
        assert_eq!(s.organization, Some(7));
        let s: Sample = serde_json::from_str(r#"{"organization": "7"}"#).unwrap();
        assert_eq!(s.organization, Some(7));
        let s: Sample =
            serde_json::from_str(r#"{"organization": {"id": 9, "name": "x"}}"#).unwrap();
        assert_eq!(s.organization, Some(9));
        let s: Sample = serde_json::from_str(r#"{"organization": null}"#).unwrap();
        assert_eq!(s.organization, None);
    }

    #[test]
    fn test_id_list_mixed() {
        let s: Sample = serde_json::from_str(r#"{"objectives": [1, "2", {"id": 3}]}"#).unwrap();
        assert_eq!(s.objectives, vec![1, 2, 3]);
        let s: Sample = serde_json::from_str(r#"{"objectives": null}"#).unwrap();
        assert!(s.objectives.is_empty());
    }

    #[test]
    fn test_text_from_number() {
        let s: Sample = serde_json::from_str(r#"{"baseline": 40}"#).unwrap();
        assert_eq!(s.baseline.as_deref(), Some("40"));
        let s: Sample = serde_json::from_str(r#"{"baseline": "  "}"#).unwrap();
        assert_eq!(s.baseline, None);
    }

    #[test]
    fn test_list_null_is_empty() {
        let s: Sample = serde_json::from_str(r#"{"months": null}"#).unwrap();
        assert!(s.months.is_empty());
    }

    #[test]
    fn test_weight_map_parses_keys_and_values() {
        let s: Sample = serde_json::from_str(r#"{"weights": {"4": "55.5", "9": 44.5}}"#).unwrap();
        let weights = s.weights.unwrap();
        assert_eq!(weights.get(&4), Some(&55.5));
        assert_eq!(weights.get(&9), Some(&44.5));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(40.0), "40");
        assert_eq!(format_number(12.5), "12.5");
    }
}
