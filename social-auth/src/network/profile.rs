//! Remote identity returned by a provider.

use secrecy::SecretString;
use serde_json::{Map, Value};

use crate::error::{invalid_profile_error, Error};

/// Remote profile of an authenticated user.
///
/// `fields` holds the provider's full response so provider-specific data survives
/// reconciliation.
#[derive(Debug, Clone)]
pub struct Profile {
    pub id: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub access_token: SecretString,
    pub fields: Map<String, Value>,
}

impl Profile {
    /// Build a profile from a decoded provider response.
    ///
    /// A JSON `null` yields `Ok(None)`; anything other than an object is invalid.
    pub fn from_json(value: Value, access_token: SecretString) -> Result<Option<Self>, Error> {
        let fields = match value {
            Value::Null => return Ok(None),
            Value::Object(fields) => fields,
            other => {
                return Err(invalid_profile_error(&format!(
                    "expected a JSON object, got {}",
                    kind_of(&other)
                )))
            }
        };

        let id = fields
            .get("id")
            .or_else(|| fields.get("sub"))
            .and_then(scalar_to_string);
        let email = fields
            .get("email")
            .and_then(Value::as_str)
            .filter(|email| !email.is_empty())
            .map(str::to_string);
        let name = fields.get("name").and_then(Value::as_str).map(str::to_string);

        Ok(Some(Self {
            id,
            email,
            name,
            access_token,
            fields,
        }))
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use secrecy::ExposeSecret;
    use serde_json::json;

    fn token() -> SecretString {
        SecretString::from("tok123".to_string())
    }

    #[test]
    fn test_object_profile() {
        let profile = Profile::from_json(
            json!({"id": "99", "email": "a@b.com", "name": "Ada", "locale": "en"}),
            token(),
        )
        .unwrap()
        .unwrap();

        assert_eq!(profile.id.as_deref(), Some("99"));
        assert_eq!(profile.email.as_deref(), Some("a@b.com"));
        assert_eq!(profile.name.as_deref(), Some("Ada"));
        assert_eq!(profile.fields["locale"], "en");
        assert_eq!(profile.access_token.expose_secret(), "tok123");
    }

    #[test]
    fn test_numeric_id_and_sub_fallback() {
        let numeric = Profile::from_json(json!({"id": 583231}), token()).unwrap().unwrap();
        assert_eq!(numeric.id.as_deref(), Some("583231"));

        let oidc = Profile::from_json(json!({"sub": "1100"}), token()).unwrap().unwrap();
        assert_eq!(oidc.id.as_deref(), Some("1100"));
    }

    #[test]
    fn test_null_is_absent_profile() {
        assert!(Profile::from_json(Value::Null, token()).unwrap().is_none());
    }

    #[test]
    fn test_non_object_is_invalid() {
        let err = Profile::from_json(json!(["a@b.com"]), token()).unwrap_err();
        assert_eq!(err.error_kind, ErrorKind::InvalidProfile);
    }

    #[test]
    fn test_empty_email_is_treated_as_missing() {
        let profile = Profile::from_json(json!({"id": "1", "email": ""}), token())
            .unwrap()
            .unwrap();
        assert!(profile.email.is_none());
    }
}
