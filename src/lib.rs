//! Terrain/water sandbox core
//!
//! Re-exports modules for use by binaries and tools.

pub mod ascii;
pub mod export;
pub mod grid;
pub mod quality;
pub mod snapshot;
pub mod stepper;
pub mod terrain;
pub mod water;
pub mod zones;
