//! Emails each owner the receipt for the current month as a PDF.

mod job;
mod pdf;
mod schedule;

pub use job::{MonthlyReceiptNotifier, NotifierConfig, NotifierReport, send_monthly_receipts};
pub use pdf::{Society, render_receipt_pdf};
pub use schedule::{IntervalSchedule, MonthlySchedule, Schedule, run_on_schedule};
