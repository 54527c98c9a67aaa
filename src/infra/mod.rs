pub mod confirm;
pub mod fs_store;
pub mod housekeeping;
pub mod memory_store;
pub mod session_listing;
