//! Generic list, create and delete endpoints over the society's tables.

mod endpoints;
mod table;

pub use endpoints::{
    create_endpoint, delete_endpoint, get_row_endpoint, list_endpoint, update_endpoint,
};
pub use table::Table;
