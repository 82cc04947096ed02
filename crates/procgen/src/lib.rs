//! Procedural generation for clouds, islands and island decorations.

pub mod cloud;
pub mod decoration;
pub mod island;
pub mod noise_source;

pub use cloud::*;
pub use decoration::*;
pub use island::*;
pub use noise_source::*;
