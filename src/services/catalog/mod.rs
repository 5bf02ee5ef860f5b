//! Spotify catalog integration.
//!
//! Split into the HTTP client ([`client`]), wire types ([`dto`]), and the
//! dto-to-domain conversion plus candidate matching ([`adapter`]).

pub mod adapter;
pub mod client;
pub mod dto;

pub use client::SpotifyClient;
