//! Transfers liked tracks and playlists from one Spotify account to another.
//!
//! Reads go through [`paginator`], writes through [`batcher`]. Each selected library
//! is handled by its strategy ([`liked_tracks`] or [`playlist`]) and the
//! [`orchestrator`] folds their outcomes into a [`SyncSummary`].

pub mod batcher;
pub mod liked_tracks;
pub mod orchestrator;
pub mod paginator;
pub mod playlist;
pub mod types;

pub use orchestrator::SyncEngine;
pub use types::{
    LibraryId, SyncDirection, SyncFrequency, SyncRequest, SyncSummary, TransferOutcome,
};
