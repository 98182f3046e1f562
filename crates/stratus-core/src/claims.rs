//! JWT claim sets.
//!
//! Two shapes are supported: [`StandardClaims`] carries the registered
//! claims, [`ExpandedClaims`] adds user profile fields on top. Both are
//! plain serde structs; callers pick one when decoding and the result is
//! stored in the request context as a [`Claims`] value.
//!
//! Every field is optional on the wire. A field that is present with the
//! wrong JSON type is a decode error.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

fn is_zero(value: &i64) -> bool {
    *value == 0
}

/// Registered JWT claims.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StandardClaims {
    /// Audience (`aud`).
    #[serde(rename = "aud", skip_serializing_if = "String::is_empty")]
    pub audience: String,

    /// Expiry as Unix seconds (`exp`).
    #[serde(rename = "exp", skip_serializing_if = "is_zero")]
    pub expires_at: i64,

    /// Token id (`jti`).
    #[serde(rename = "jti", skip_serializing_if = "String::is_empty")]
    pub id: String,

    /// Issue time as Unix seconds (`iat`).
    #[serde(rename = "iat", skip_serializing_if = "is_zero")]
    pub issued_at: i64,

    /// Issuer (`iss`).
    #[serde(rename = "iss", skip_serializing_if = "String::is_empty")]
    pub issuer: String,

    /// Not-before as Unix seconds (`nbf`).
    #[serde(rename = "nbf", skip_serializing_if = "is_zero")]
    pub not_before: i64,

    /// Subject (`sub`).
    #[serde(rename = "sub", skip_serializing_if = "String::is_empty")]
    pub subject: String,
}

/// Registered claims plus user profile fields.
///
/// # Example
///
/// ```
/// use stratus_core::ExpandedClaims;
///
/// let claims: ExpandedClaims = serde_json::from_value(serde_json::json!({
///     "sub": "u-1",
///     "email": "ada@example.com",
///     "firstName": "Ada",
///     "userType": "admin",
/// })).unwrap();
///
/// assert_eq!(claims.standard.subject, "u-1");
/// assert_eq!(claims.first_name, "Ada");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExpandedClaims {
    /// Registered claims.
    #[serde(flatten)]
    pub standard: StandardClaims,

    /// Email address.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub email: String,

    /// Given name.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub first_name: String,

    /// Display name.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub full_name: String,

    /// Access level.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub level: String,

    /// Kind of user.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub user_type: String,
}

/// Decoded claims of either shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claims {
    /// Registered claims only.
    Standard(StandardClaims),
    /// Registered claims plus profile fields.
    Expanded(ExpandedClaims),
}

impl Claims {
    /// The registered claims, whichever shape was decoded.
    #[must_use]
    pub fn standard(&self) -> &StandardClaims {
        match self {
            Self::Standard(claims) => claims,
            Self::Expanded(claims) => &claims.standard,
        }
    }

    /// The expanded claims, if that shape was decoded.
    #[must_use]
    pub fn expanded(&self) -> Option<&ExpandedClaims> {
        match self {
            Self::Standard(_) => None,
            Self::Expanded(claims) => Some(claims),
        }
    }

    /// Populated claim fields keyed by their wire names.
    #[must_use]
    pub fn to_map(&self) -> Map<String, Value> {
        let value = match self {
            Self::Standard(claims) => serde_json::to_value(claims),
            Self::Expanded(claims) => serde_json::to_value(claims),
        };
        match value {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// A claims shape that can be bound from a verified claim mapping.
pub trait ClaimSet: DeserializeOwned + Serialize + Send + 'static {
    /// Short name used in logs and errors.
    const KIND: &'static str;

    /// Wraps the decoded value for storage in the request context.
    fn into_claims(self) -> Claims;
}

impl ClaimSet for StandardClaims {
    const KIND: &'static str = "standard";

    fn into_claims(self) -> Claims {
        Claims::Standard(self)
    }
}

impl ClaimSet for ExpandedClaims {
    const KIND: &'static str = "expanded";

    fn into_claims(self) -> Claims {
        Claims::Expanded(self)
    }
}

impl From<StandardClaims> for Claims {
    fn from(claims: StandardClaims) -> Self {
        Self::Standard(claims)
    }
}

impl From<ExpandedClaims> for Claims {
    fn from(claims: ExpandedClaims) -> Self {
        Self::Expanded(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_standard_wire_names() {
        let claims = StandardClaims {
            audience: "books".to_string(),
            expires_at: 1_900_000_000,
            id: "t-1".to_string(),
            issued_at: 1_700_000_000,
            issuer: "auth.example".to_string(),
            not_before: 1_700_000_000,
            subject: "u-1".to_string(),
        };

        let wire = serde_json::to_value(&claims).unwrap();
        assert_eq!(
            wire,
            json!({
                "aud": "books",
                "exp": 1_900_000_000,
                "jti": "t-1",
                "iat": 1_700_000_000,
                "iss": "auth.example",
                "nbf": 1_700_000_000,
                "sub": "u-1",
            })
        );
    }

    #[test]
    fn test_expanded_flattens_standard() {
        let claims: ExpandedClaims = serde_json::from_value(json!({
            "sub": "u-2",
            "exp": 1_900_000_000,
            "fullName": "Grace Hopper",
            "level": "3",
        }))
        .unwrap();

        assert_eq!(claims.standard.subject, "u-2");
        assert_eq!(claims.standard.expires_at, 1_900_000_000);
        assert_eq!(claims.full_name, "Grace Hopper");
        assert_eq!(claims.level, "3");
        assert_eq!(claims.email, "");
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        let result = serde_json::from_value::<StandardClaims>(json!({"exp": "tomorrow"}));
        assert!(result.is_err());

        let result = serde_json::from_value::<ExpandedClaims>(json!({"level": 3}));
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_claims_are_ignored() {
        let claims: StandardClaims =
            serde_json::from_value(json!({"sub": "u-3", "scope": "read"})).unwrap();
        assert_eq!(claims.subject, "u-3");
    }

    #[test]
    fn test_claims_accessors() {
        let expanded = ExpandedClaims {
            standard: StandardClaims {
                subject: "u-4".to_string(),
                ..StandardClaims::default()
            },
            email: "u4@example.com".to_string(),
            ..ExpandedClaims::default()
        };
        let claims = expanded.clone().into_claims();

        assert_eq!(claims.standard().subject, "u-4");
        assert_eq!(claims.expanded(), Some(&expanded));

        let map = claims.to_map();
        assert_eq!(map["sub"], "u-4");
        assert_eq!(map["email"], "u4@example.com");
        assert!(!map.contains_key("firstName"));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(StandardClaims::KIND, "standard");
        assert_eq!(ExpandedClaims::KIND, "expanded");
    }
}
