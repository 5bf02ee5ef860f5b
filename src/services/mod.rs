//! External service collaborators.
//!
//! The organizer core only sees the traits in [`traits`]; everything else
//! in here is a concrete client. Each client keeps its own wire types
//! (dto) separate from domain types (adapter converts).

pub mod acoustid;
pub mod catalog;
pub mod fingerprint;
pub mod lyrics;
pub mod traits;

pub use traits::{CatalogApi, Fingerprinter, LyricsApi};
