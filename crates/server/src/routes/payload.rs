//! Request bodies, from either JSON or a urlencoded form.
//!
//! The declared `Content-Type` picks the decoder: `application/json` is read
//! with `serde_json`, anything else as `application/x-www-form-urlencoded`
//! with `serde_urlencoded` (the decoder behind `axum::Form`). Each handler
//! declares its fields as a `Deserialize` struct and receives it typed.

use std::fmt;

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
};
use serde::{
    Deserializer,
    de::{self, DeserializeOwned, Visitor},
};

use crate::error::AppError;

/// Typed request body.
///
/// Malformed bodies, repeated fields and non-scalar field values are
/// rejected with `AppError::BadRequest`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload<T>(pub T);

impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| {
                value
                    .trim_start()
                    .to_ascii_lowercase()
                    .starts_with("application/json")
            });

        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        let fields = if is_json {
            decode_json(&body)?
        } else {
            decode_form(&body)?
        };
        Ok(Self(fields))
    }
}

/// Decode a JSON object body. A blank body decodes as `{}`.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if the body is not a JSON object matching `T`.
pub fn decode_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    let body = body.trim_ascii();
    let body: &[u8] = if body.is_empty() { b"{}" } else { body };

    // Structs also deserialize from arrays; only objects name their fields.
    if body.first() != Some(&b'{') {
        return Err(AppError::BadRequest(
            "JSON body must be an object".to_string(),
        ));
    }

    serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("malformed JSON body: {e}")))
}

/// Decode an `application/x-www-form-urlencoded` body.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if the body does not decode into `T`.
pub fn decode_form<T: DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    serde_urlencoded::from_bytes(body)
        .map_err(|e| AppError::BadRequest(format!("malformed form body: {e}")))
}

/// Deserialize a scalar field as text.
///
/// Strings pass through, JSON numbers and booleans are rendered as text, and
/// `null` or blank values become `None`. Use with
/// `#[serde(default, deserialize_with = "payload::text")]`.
///
/// # Errors
///
/// Fails for arrays and objects.
pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_option(TextVisitor)
}

struct TextVisitor;

impl<'de> Visitor<'de> for TextVisitor {
    type Value = Option<String>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string, number or boolean")
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        Ok(Some(value.to_owned()).filter(|v| !v.trim().is_empty()))
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<Self::Value, E> {
        Ok(Some(value.to_string()))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
        Ok(Some(value.to_string()))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
        Ok(Some(value.to_string()))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
        Ok(Some(value.to_string()))
    }
}

/// Interpret an optional field as a boolean flag.
///
/// Absent and unparseable values are `false`.
#[must_use]
pub fn flag(value: Option<&str>) -> bool {
    value.is_some_and(|v| parse_flag(v.trim()))
}

/// Parse a boolean the lenient way: `1 t T true TRUE True` are true,
/// everything else is false.
#[must_use]
pub fn parse_flag(value: &str) -> bool {
    matches!(value, "1" | "t" | "T" | "true" | "TRUE" | "True")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Default, PartialEq, Eq, Deserialize)]
    struct Fields {
        #[serde(default, deserialize_with = "text")]
        balance: Option<String>,
        #[serde(default, deserialize_with = "text")]
        amount: Option<String>,
        #[serde(default, deserialize_with = "text")]
        overwrite: Option<String>,
    }

    #[test]
    fn test_json_scalars_become_text() {
        let fields: Fields =
            decode_json(br#"{"balance": 100, "amount": -3.5, "overwrite": true}"#).unwrap();
        assert_eq!(fields.balance.as_deref(), Some("100"));
        assert_eq!(fields.amount.as_deref(), Some("-3.5"));
        assert!(flag(fields.overwrite.as_deref()));
    }

    #[test]
    fn test_json_null_and_blank_are_absent() {
        let fields: Fields = decode_json(br#"{"balance": null, "amount": "  "}"#).unwrap();
        assert_eq!(fields, Fields::default());
    }

    #[test]
    fn test_json_unknown_fields_are_ignored() {
        let fields: Fields = decode_json(br#"{"amount": "2", "note": [1]}"#).unwrap();
        assert_eq!(fields.amount.as_deref(), Some("2"));
    }

    #[test]
    fn test_json_malformed() {
        assert!(matches!(
            decode_json::<Fields>(b"{not json"),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            decode_json::<Fields>(b"[\"1\", \"2\"]"),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            decode_json::<Fields>(br#"{"amount": [1]}"#),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            decode_json::<Fields>(br#"{"amount": {"value": 1}}"#),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_json_empty_body() {
        assert_eq!(decode_json::<Fields>(b"  ").unwrap(), Fields::default());
    }

    #[test]
    fn test_form_decoding() {
        let fields: Fields = decode_form(b"balance=1%2C5&amount=+19.99&overwrite=t").unwrap();
        assert_eq!(fields.balance.as_deref(), Some("1,5"));
        assert_eq!(fields.amount.as_deref(), Some(" 19.99"));
        assert!(flag(fields.overwrite.as_deref()));
    }

    #[test]
    fn test_form_empty_and_bare_keys_are_absent() {
        assert_eq!(decode_form::<Fields>(b"").unwrap(), Fields::default());
        assert_eq!(
            decode_form::<Fields>(b"balance&amount=").unwrap(),
            Fields::default()
        );
    }

    #[test]
    fn test_form_repeated_field_is_rejected() {
        assert!(matches!(
            decode_form::<Fields>(b"amount=1&amount=2"),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_parse_flag() {
        for truthy in ["1", "t", "T", "true", "TRUE", "True"] {
            assert!(parse_flag(truthy), "{truthy}");
        }
        for falsy in ["0", "false", "yes", "tRuE", "", "2"] {
            assert!(!parse_flag(falsy), "{falsy}");
        }
    }

    #[test]
    fn test_unparseable_flag_is_false() {
        assert!(!flag(Some("maybe")));
        assert!(!flag(None));
        assert!(flag(Some(" 1 ")));
    }
}
