//! Integration test modules for pingscope

pub mod control;
pub mod params;
pub mod pipeline;
pub mod render;
pub mod session;
