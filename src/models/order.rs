use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One person's lunch order for a restaurant on a given day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    pub date: NaiveDate,
    pub restaurant: String,
    pub person: String,
    pub order_text: String,
    pub price: BigDecimal,
    /// Informational only, never part of a key
    pub timestamp: Option<DateTime<Utc>>,
}

/// Order as submitted by the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderInput {
    #[serde(alias = "person")]
    pub name: String,
    #[serde(alias = "orderText")]
    pub order: String,
    #[serde(default, deserialize_with = "lenient_price")]
    pub price: BigDecimal,
}

impl OrderInput {
    pub fn new(name: impl Into<String>, order: impl Into<String>, price: &str) -> Self {
        Self {
            name: name.into(),
            order: order.into(),
            price: parse_price(price),
        }
    }

    /// Stamp the order for the given partition at write time
    pub fn into_record(
        self,
        restaurant: &str,
        date: NaiveDate,
        timestamp: DateTime<Utc>,
    ) -> OrderRecord {
        OrderRecord {
            date,
            restaurant: restaurant.to_string(),
            person: self.name,
            order_text: self.order,
            price: self.price,
            timestamp: Some(timestamp),
        }
    }
}

impl From<&OrderRecord> for OrderInput {
    fn from(record: &OrderRecord) -> Self {
        Self {
            name: record.person.clone(),
            order: record.order_text.clone(),
            price: record.price.clone(),
        }
    }
}

/// Largest number of digits a price may have before the decimal point
const MAX_PRICE_INTEGER_DIGITS: i64 = 12;
/// Largest number of digits a price may have after the decimal point
const MAX_PRICE_SCALE: i64 = 10;

/// Parse a user-entered price. Blank, malformed, negative or absurdly
/// large/precise input becomes 0.
pub fn parse_price(input: &str) -> BigDecimal {
    let trimmed = input.trim();
    let trimmed = trimmed.strip_prefix('$').unwrap_or(trimmed).trim();

    match BigDecimal::from_str(trimmed) {
        Ok(price) if within_bounds(&price) && price >= BigDecimal::zero() => price,
        _ => BigDecimal::zero(),
    }
}

/// Exponent notation parses cheaply but renders every digit, so bound the
/// rendered width before the value is stored anywhere.
fn within_bounds(price: &BigDecimal) -> bool {
    let (_, scale) = price.as_bigint_and_exponent();
    let integer_digits = price.digits() as i64 - scale;
    scale <= MAX_PRICE_SCALE && integer_digits <= MAX_PRICE_INTEGER_DIGITS
}

/// Accepts a JSON string, number or null for a price field
pub fn lenient_price<'de, D>(deserializer: D) -> Result<BigDecimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => parse_price(&s),
        Some(serde_json::Value::Number(n)) => parse_price(&n.to_string()),
        _ => BigDecimal::zero(),
    })
}

/// Today's date in local time
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse a `YYYY-MM-DD` date, falling back to `fallback` when missing or malformed
pub fn parse_date_or(input: Option<&str>, fallback: NaiveDate) -> NaiveDate {
    input
        .and_then(|s| NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok())
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn price_parsing_normalizes_bad_input_to_zero() {
        assert_eq!(parse_price("abc"), BigDecimal::zero());
        assert_eq!(parse_price(""), BigDecimal::zero());
        assert_eq!(parse_price("   "), BigDecimal::zero());
        assert_eq!(parse_price("-3"), BigDecimal::zero());
        assert_eq!(parse_price("7.5"), dec("7.5"));
        assert_eq!(parse_price(" $12.25 "), dec("12.25"));
    }

    #[test]
    fn price_parsing_rejects_values_too_wide_to_store() {
        assert_eq!(parse_price("1e200000"), BigDecimal::zero());
        assert_eq!(parse_price("1e1000000000"), BigDecimal::zero());
        assert_eq!(parse_price("5e-300000"), BigDecimal::zero());
        assert_eq!(parse_price("0.12345678901"), BigDecimal::zero());
        assert_eq!(parse_price("1.5e2"), dec("150"));
        assert_eq!(parse_price("999999999999.99"), dec("999999999999.99"));
        assert!(parse_price("9e11").to_string().len() <= 12);
    }

    #[test]
    fn order_input_accepts_number_string_or_missing_price() {
        let a: OrderInput =
            serde_json::from_str(r#"{"name":"Alice","order":"Burger","price":10}"#).unwrap();
        let b: OrderInput =
            serde_json::from_str(r#"{"name":"Bob","order":"Pizza","price":"7.5"}"#).unwrap();
        let c: OrderInput =
            serde_json::from_str(r#"{"person":"Cy","orderText":"Soup"}"#).unwrap();
        let d: OrderInput =
            serde_json::from_str(r#"{"name":"Di","order":"Tea","price":"free"}"#).unwrap();

        assert_eq!(a.price, dec("10"));
        assert_eq!(b.price, dec("7.5"));
        assert_eq!(c.name, "Cy");
        assert_eq!(c.price, BigDecimal::zero());
        assert_eq!(d.price, BigDecimal::zero());
    }

    #[test]
    fn malformed_date_falls_back() {
        let fallback = NaiveDate::from_ymd_opt(2024, 6, 5).unwrap();
        assert_eq!(parse_date_or(Some("2024-06-03"), fallback).to_string(), "2024-06-03");
        assert_eq!(parse_date_or(Some("06/03/2024"), fallback), fallback);
        assert_eq!(parse_date_or(None, fallback), fallback);
    }
}
