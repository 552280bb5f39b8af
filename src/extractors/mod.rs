//! Domain field extractors: noise scenarios, double-talk rows,
//! equipment settings, and version banners.

pub mod double_talk;
pub mod noise;
pub mod settings;
pub mod version;
