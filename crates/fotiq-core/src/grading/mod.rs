//! Grading tools: tone, point curve, color mixer, and detail.

pub mod color_mixer;
pub mod curves;
pub mod detail;
pub mod tone;
