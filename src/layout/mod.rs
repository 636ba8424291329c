//! Spatial bookkeeping behind the stack: the region tree used for
//! occlusion and back-to-front composition.

pub mod region;

pub use region::*;
