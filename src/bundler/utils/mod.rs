//! Shared helpers for the maker pipeline.

pub mod fs;
