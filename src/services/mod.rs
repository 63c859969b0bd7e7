pub mod library_sync;
pub mod spotify;
