pub mod audio_spec;
pub mod codec;
pub mod config;
pub mod error;
pub mod state;
