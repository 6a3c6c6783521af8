//! One-time passwords that let owners log in with their flat number.

mod core;
mod endpoints;

pub use core::{create_otp_table, delete_otps_for_flat, find_valid_otp, generate_code, insert_otp};
pub use endpoints::{send_otp_endpoint, verify_otp_endpoint};
