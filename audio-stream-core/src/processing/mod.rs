pub mod capture_buffer;
pub mod frame_slicer;
pub mod sample_convert;
pub mod tone;
