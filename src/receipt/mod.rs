//! Maintenance receipts issued to owners.

mod core;
mod month_label;
mod receipt_id;

pub use core::{
    NewReceipt, Receipt, create_receipt, create_receipt_table, get_all_receipts,
    map_row_to_receipt, mark_receipt_notified,
};
pub use month_label::{month_key, parse_month_label};
pub use receipt_id::next_receipt_id;
