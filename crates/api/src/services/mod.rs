//! Business logic services.

pub mod auth;
pub mod notify;
pub mod otp;

pub use auth::{AuthError, AuthService, IssuedToken};
pub use notify::{CodeChannel, DeliveryError, LogCodeChannel, SmtpCodeChannel};
pub use otp::{MokaOtpStore, OtpChannel, OtpGate, OtpKey, OtpStore, SignupError};
