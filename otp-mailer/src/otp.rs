//! One-time passcode issuance
//!
//! Codes are six decimal digits and stay valid for [`OTP_TTL_MINUTES`].
//! Storing and verifying them is left to the caller.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

/// Validity window of an issued code
pub const OTP_TTL_MINUTES: i64 = 10;

const OTP_MIN: u32 = 100_000;
const OTP_MAX: u32 = 999_999;

/// A freshly issued passcode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneTimeCode {
    pub code: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl OneTimeCode {
    pub fn generate() -> Self {
        Self::generate_at(Utc::now())
    }

    pub fn generate_at(now: DateTime<Utc>) -> Self {
        let code = rand::thread_rng().gen_range(OTP_MIN..=OTP_MAX);
        Self {
            code: code.to_string(),
            issued_at: now,
            expires_at: now + Duration::minutes(OTP_TTL_MINUTES),
        }
    }

    /// Expired strictly after `expires_at`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}
