pub mod app;
pub mod audio;
pub mod config;
pub mod error;
pub mod gradient;
pub mod pixel;
pub mod random;
pub mod visual;
