//! Deserializers for records written by HTML forms or the mock REST endpoint, where numbers
//! often arrive as strings and optional numbers as `""`.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Integer(i64),
    Float(f64),
    Text(String),
}

/// `Option<T>` from a number, a numeric string, `""`, or `null`.
pub fn optional_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64> + FromStr,
{
    let raw = Option::<NumberOrText>::deserialize(deserializer)?;
    let invalid = |shown: String| -> D::Error {
        serde::de::Error::custom(format!("invalid number: {shown}"))
    };

    match raw {
        None => Ok(None),
        Some(NumberOrText::Integer(n)) => T::try_from(n).map(Some).map_err(|_| invalid(n.to_string())),
        Some(NumberOrText::Float(f)) if f.fract() == 0.0 => {
            // Integral floats such as `1925.0` are accepted as their integer value
            T::try_from(f as i64).map(Some).map_err(|_| invalid(f.to_string()))
        }
        Some(NumberOrText::Float(f)) => Err(invalid(f.to_string())),
        Some(NumberOrText::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(NumberOrText::Text(text)) => text.trim().parse().map(Some).map_err(|_| invalid(text)),
    }
}

/// Decimal from a number or string; `""` and `null` become zero.
pub fn decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<NumberOrText>::deserialize(deserializer)?;
    match raw {
        None => Ok(Decimal::ZERO),
        Some(NumberOrText::Integer(n)) => Ok(Decimal::from(n)),
        Some(NumberOrText::Float(f)) => Decimal::try_from(f)
            .map(|d| d.round_dp(2))
            .map_err(|_| serde::de::Error::custom(format!("invalid price: {f}"))),
        Some(NumberOrText::Text(text)) if text.trim().is_empty() => Ok(Decimal::ZERO),
        Some(NumberOrText::Text(text)) => Decimal::from_str(text.trim())
            .map_err(|_| serde::de::Error::custom(format!("invalid price: {text}"))),
    }
}

/// Identifier from either a JSON string or a JSON integer.
pub fn id_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Integer(n) => Ok(n.to_string()),
        NumberOrText::Float(f) => Ok(f.to_string()),
        NumberOrText::Text(text) => Ok(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Form {
        #[serde(default, deserialize_with = "optional_number")]
        pages: Option<u32>,
        #[serde(default, deserialize_with = "decimal")]
        price: Decimal,
        #[serde(deserialize_with = "id_text")]
        id: String,
    }

    fn parse(value: serde_json::Value) -> Result<Form, serde_json::Error> {
        serde_json::from_value(value)
    }

    #[test]
    fn numbers_may_arrive_as_strings() {
        let form = parse(json!({"pages": "328", "price": "12.50", "id": 7})).unwrap();
        assert_eq!(form.pages, Some(328));
        assert_eq!(form.price, Decimal::new(1250, 2));
        assert_eq!(form.id, "7");
    }

    #[test]
    fn blanks_are_absent() {
        let form = parse(json!({"pages": "", "price": "", "id": "abc"})).unwrap();
        assert_eq!(form.pages, None);
        assert_eq!(form.price, Decimal::ZERO);

        let form = parse(json!({"id": "x"})).unwrap();
        assert_eq!(form.pages, None);
    }

    #[test]
    fn float_prices_round_to_cents() {
        let form = parse(json!({"price": 19.99, "id": "1"})).unwrap();
        assert_eq!(form.price, Decimal::new(1999, 2));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse(json!({"pages": "many", "id": "1"})).is_err());
        assert!(parse(json!({"pages": -3, "id": "1"})).is_err());
        assert!(parse(json!({"price": "free", "id": "1"})).is_err());
    }
}
