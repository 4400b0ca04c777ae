// crates/clipstrip-core/src/helpers/mod.rs
//
// Stateless helpers shared by the controller and any presentation layer.

pub mod time;
pub mod track;
