pub mod audio_processor;
pub mod encoder;
pub mod packet_sink;
pub mod transport;
