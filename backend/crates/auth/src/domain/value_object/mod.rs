//! Value Object Module

pub mod otp_code;
pub mod phone;
