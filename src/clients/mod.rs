//! Client modules for external API interactions

pub mod captcha;

pub use captcha::{CaptchaVerdict, CaptchaVerifier, Recaptcha};
