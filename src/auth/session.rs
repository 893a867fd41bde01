use chrono::{DateTime, Duration, Utc};

/// Client-held identity state spanning login through authenticated browsing.
/// Created when phone submission succeeds; the token lands on OTP
/// verification. Never persisted across restarts.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub phone_number: String,
    pub session_id: String,
    pub otp_verified: bool,
    pub auth_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(phone_number: &str, session_id: &str, expires_in_seconds: i64) -> Self {
        Self {
            phone_number: phone_number.to_string(),
            session_id: session_id.to_string(),
            otp_verified: false,
            auth_token: None,
            expires_at: Utc::now() + Duration::seconds(expires_in_seconds),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_unverified() {
        let session = Session::new("5551234567", "session-1", 300);
        assert!(!session.otp_verified);
        assert_eq!(session.auth_token, None);
        assert!(!session.is_expired());
    }

    #[test]
    fn test_session_with_past_expiry_is_expired() {
        let session = Session::new("5551234567", "session-1", -1);
        assert!(session.is_expired());
    }
}
