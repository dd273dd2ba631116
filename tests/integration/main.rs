//! Integration test binary: every integration test module is linked into one
//! binary.

// Allow unwrap/expect in test code
#![allow(clippy::unwrap_used, clippy::expect_used)]

mod helpers;

mod compose_end_to_end;
mod config_roundtrip;
mod scene_split;
