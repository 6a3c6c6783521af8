mod core;

pub use core::{NewOwner, create_owner, create_owner_table, get_all_owners, get_owner_email};
