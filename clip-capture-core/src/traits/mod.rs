pub mod sample_source;
pub mod storage;
