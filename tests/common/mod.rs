//! Common test utilities and helpers.
//!
//! `firmware` builds synthetic images and the matching in-memory trees;
//! `test_utils` wraps temporary files and report directories.
#![allow(dead_code)]

pub mod firmware;
pub mod test_utils;
