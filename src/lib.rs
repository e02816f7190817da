//! Signal-light practice for COLREGS study: a 12x8 grid of lights, named
//! presets kept locally and optionally shared through a small presets
//! service, and a session that compares the learner's pattern with a preset.

pub mod config;
pub mod grid;
pub mod practice;
pub mod preset;
pub mod remote;
pub mod server;
pub mod session;
pub mod store;
