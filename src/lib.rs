//! Protein structure finder for the RCSB PDB.
//!
//! The pipeline flows one way: a free-text query becomes entry identifiers
//! ([`search`]), identifiers become flat metadata records under a bounded
//! worker pool ([`enrich`]), records pass a predicate conjunction
//! ([`filter`]), and the survivors feed ranking ([`rank`]) and zip export
//! ([`archive`]). [`app::App`] wires the stages together over swappable
//! client traits and keeps the session-scoped caches.

pub mod app;
pub mod archive;
pub mod cache;
pub mod config;
pub mod data;
pub mod domain;
pub mod enrich;
pub mod error;
pub mod files;
pub mod filter;
pub mod output;
pub mod rank;
pub mod search;
