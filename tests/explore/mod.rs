//! End-to-end explore tests over synthetic images.

mod cache_roundtrip;
mod capsules;
