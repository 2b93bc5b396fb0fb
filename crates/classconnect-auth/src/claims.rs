use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use classconnect_models::UserRole;

/// Access token payload.
///
/// Older clients signed the user id as `userID`; both spellings decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    #[serde(rename = "userId", alias = "userID")]
    pub user_id: i64,
    pub email: String,
    pub role: UserRole,
    /// Expiry as a Unix timestamp in seconds.
    pub exp: i64,
}

impl Claims {
    pub fn new(user_id: i64, email: impl Into<String>, role: UserRole, exp: i64) -> Self {
        Self {
            user_id,
            email: email.into(),
            role,
            exp,
        }
    }

    /// A token is expired from its `exp` second onwards.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_serialize_user_id_camel_case() {
        let claims = Claims::new(42, "t@example.com", UserRole::Teacher, 1_700_000_000);
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["userId"], 42);
        assert_eq!(json["role"], "teacher");
        assert!(json.get("userID").is_none());
    }

    #[test]
    fn test_claims_accept_legacy_user_id_spelling() {
        let json = r#"{"userID":7,"email":"s@example.com","role":"student","exp":1}"#;
        let claims: Claims = serde_json::from_str(json).unwrap();
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.role, UserRole::Student);
    }

    #[test]
    fn test_claims_reject_missing_role() {
        let json = r#"{"userId":7,"email":"s@example.com","exp":1}"#;
        assert!(serde_json::from_str::<Claims>(json).is_err());
    }

    #[test]
    fn test_is_expired_at_boundary() {
        let now = DateTime::from_timestamp(1_000, 0).unwrap();
        assert!(Claims::new(1, "a@b.c", UserRole::Student, 1_000).is_expired_at(now));
        assert!(!Claims::new(1, "a@b.c", UserRole::Student, 1_001).is_expired_at(now));
    }
}
