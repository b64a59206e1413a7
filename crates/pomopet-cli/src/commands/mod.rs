pub mod config;
pub mod pet;
pub mod plan;
pub mod session;
pub mod slider;
pub mod sounds;
pub mod stats;
