pub mod file_storage;
pub mod posting;
pub mod state_set;
pub mod storage;
