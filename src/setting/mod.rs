//! Key-value settings such as the society's opening balance.

mod core;
mod endpoints;

pub use core::{
    INITIAL_BALANCE, Setting, SettingForm, create_setting_table, get_setting, upsert_setting,
};
pub use endpoints::{get_setting_endpoint, upsert_setting_endpoint};
