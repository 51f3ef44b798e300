pub mod clip;
pub mod clip_queue;
pub mod gain;
pub mod wav_format;
