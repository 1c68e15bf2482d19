//! Binary layouts understood by the explorer.

pub mod uefi;
