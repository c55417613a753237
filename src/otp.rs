//! One-time codes for email verification and account recovery flows.
//!
//! A code is bound to one user and one purpose, expires after a fixed window,
//! and is consumed exactly once. Failed checks are counted and capped.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

pub const CODE_LEN: usize = 6;
pub const TTL_MINUTES: i64 = 60;
pub const MAX_ATTEMPTS: u32 = 3;

const CODE_SPACE: u32 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    EmailVerification,
    PasswordReset,
    TwoFactor,
    AccountRecovery,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Otp {
    pub id: Uuid,
    pub user_id: Uuid,
    pub code: String,
    pub purpose: OtpPurpose,
    pub expires_at: DateTime<Utc>,
    pub attempt_count: u32,
    pub is_used: bool,
    pub used_at: Option<DateTime<Utc>>,
}

/// Draw a zero-padded numeric code.
///
/// Codes are delivered out-of-band over a channel that is verified
/// separately, so a uniform draw from `thread_rng` is used rather than a
/// CSPRNG; the expiry window and attempt cap bound online guessing.
#[must_use]
pub fn generate_code() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..CODE_SPACE);
    format!("{n:0width$}", width = CODE_LEN)
}

impl Otp {
    /// Issue a fresh code for `user_id` with the standard expiry window.
    #[must_use]
    pub fn issue(user_id: Uuid, purpose: OtpPurpose, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            code: generate_code(),
            purpose,
            expires_at: now + Duration::minutes(TTL_MINUTES),
            attempt_count: 0,
            is_used: false,
            used_at: None,
        }
    }

    /// A code is valid while unused, unexpired, and under the attempt cap.
    #[must_use]
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        !self.is_used && now <= self.expires_at && self.attempt_count < MAX_ATTEMPTS
    }

    /// Check a presented code.
    ///
    /// Classification order: exhausted attempts, then expiry, then the code
    /// itself. A wrong code increments the attempt count; once the cap is
    /// reached even the correct code is rejected.
    ///
    /// # Errors
    ///
    /// [`Error::MaxOtpAttempts`], [`Error::OtpExpired`], or
    /// [`Error::WrongOtpCode`] per the order above.
    pub fn check(&mut self, code: &str, now: DateTime<Utc>) -> Result<(), Error> {
        if self.attempt_count >= MAX_ATTEMPTS {
            return Err(Error::MaxOtpAttempts);
        }
        if now > self.expires_at {
            return Err(Error::OtpExpired);
        }
        if self.code != code {
            self.attempt_count += 1;
            return Err(Error::WrongOtpCode);
        }
        Ok(())
    }

    /// Consume the code. Single use; the timestamp is recorded.
    pub fn mark_used(&mut self, now: DateTime<Utc>) {
        self.is_used = true;
        self.used_at = Some(now);
    }
}
