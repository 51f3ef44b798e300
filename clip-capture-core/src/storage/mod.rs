pub mod fs_storage;
pub mod memory_storage;
pub mod metadata;
pub mod wav_codec;
