pub mod category;
pub mod leave_request;
pub mod role;
pub mod status;
pub mod summary;
pub mod time_entry;
