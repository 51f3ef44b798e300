//! # clip-capture-core
//!
//! Capture-to-clip audio pipeline.
//!
//! A capture thread pulls mono 16-bit samples from a `SampleSource`, applies
//! a left-shift gain, and packs them into fixed-size clips. Full clips travel
//! through a bounded `ClipQueue` to the consumer, who gathers them into a
//! `Sound` that can be saved to and loaded from a 44-byte-header WAV file.
//!
//! ## Architecture
//!
//! ```text
//! clip-capture-core (this crate)
//! ├── traits/       ← SampleSource, Storage, StorageReader
//! ├── models/       ← CaptureError, CaptureState, CaptureConfiguration, CaptureDiagnostics
//! ├── processing/   ← Clip, ClipQueue, gain, WAV header generation and parsing
//! ├── recording/    ← Sound (clip collection with load/save)
//! ├── session/      ← CaptureSession (capture thread orchestration)
//! ├── sources/      ← ReplaySource
//! └── storage/      ← FsStorage, MemoryStorage, WAV codec, metadata sidecar
//! ```

pub mod models;
pub mod processing;
pub mod recording;
pub mod session;
pub mod sources;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::config::CaptureConfiguration;
pub use models::diagnostics::CaptureDiagnostics;
pub use models::error::CaptureError;
pub use models::recording_result::{RecordingMetadata, SaveReport};
pub use models::state::CaptureState;
pub use processing::clip::Clip;
pub use processing::clip_queue::ClipQueue;
pub use processing::wav_format::WavHeader;
pub use recording::sound::{ExistingFilePolicy, MissingFilePolicy, Sound};
pub use session::capture::CaptureSession;
pub use sources::replay_source::ReplaySource;
pub use storage::fs_storage::FsStorage;
pub use storage::memory_storage::MemoryStorage;
pub use traits::sample_source::SampleSource;
pub use traits::storage::{Storage, StorageReader};
