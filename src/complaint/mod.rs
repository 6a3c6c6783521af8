//! Complaints raised by owners and handled by the admin.

mod core;
mod retention;
mod status;
mod update;

pub use core::{
    Complaint, ComplaintId, NewComplaint, create_complaint, create_complaint_table,
    get_visible_complaints,
};
pub use retention::run_complaint_cleanup;
pub use status::ComplaintStatus;
pub use update::{ComplaintPatch, update_complaint};
