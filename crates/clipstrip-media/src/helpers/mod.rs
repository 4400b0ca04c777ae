// crates/clipstrip-media/src/helpers/mod.rs
//
// Internal helpers for decoder backends. Not re-exported from lib.rs.

pub mod seek;
