/// Rectangular tag annotation: the tag model and its gesture engine

pub mod engine;
pub mod tag;

pub use engine::{TagEngine, TagEvent, TagState};
