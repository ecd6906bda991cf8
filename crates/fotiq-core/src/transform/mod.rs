//! Transform pipeline: edit state, uniform packing, evaluation, and rendering.

pub mod evaluate;
pub mod params;
pub mod render;
pub mod uniforms;
