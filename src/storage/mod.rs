pub mod file_lock;
pub mod layout;
pub mod record;
pub mod record_store;
