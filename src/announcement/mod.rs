mod core;

pub use core::{
    NewAnnouncement, create_announcement, create_announcement_table, get_all_announcements,
};
