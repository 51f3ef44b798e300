use std::fmt;
use std::sync::Arc;

use crate::models::config::CaptureConfiguration;
use crate::models::error::CaptureError;
use crate::models::recording_result::SaveReport;
use crate::processing::clip::Clip;
use crate::processing::wav_format::WAV_HEADER_SIZE;
use crate::storage::wav_codec;
use crate::traits::storage::{ancestor_dirs, normalize_path, Storage};

/// What `Sound::load` does when the bound source file does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingFilePolicy {
    /// Clear the sound and return successfully.
    #[default]
    Ignore,
    /// Fail with `CaptureError::SourceMissing`.
    Require,
}

/// What `Sound::save` does when the bound destination already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExistingFilePolicy {
    #[default]
    Overwrite,
    /// Fail with `CaptureError::DestinationExists`.
    Refuse,
}

#[derive(Clone)]
struct Binding {
    storage: Arc<dyn Storage>,
    path: String,
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding").field("path", &self.path).finish()
    }
}

/// An ordered sequence of clips making up one recording.
///
/// Clips are kept in recording order. Appending an empty clip or an empty
/// sound is a usage error rather than a silent no-op.
///
/// ```text
/// bind_source(storage, path).load(policy)       storage → clips
/// bind_destination(storage, path).save(policy)  clips → storage
/// ```
#[derive(Debug, Clone)]
pub struct Sound {
    clips: Vec<Clip>,
    sample_rate: u32,
    clip_size: usize,
    source: Option<Binding>,
    destination: Option<Binding>,
    header: [u8; WAV_HEADER_SIZE],
}

impl Sound {
    /// An empty sound for `config`, which must pass `validate`.
    pub fn new(config: &CaptureConfiguration) -> Result<Self, CaptureError> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    /// Build without validating; for configurations already checked.
    pub(crate) fn with_config(config: &CaptureConfiguration) -> Self {
        Self {
            clips: Vec::with_capacity(config.reserve_clip_count),
            sample_rate: config.sample_rate,
            clip_size: config.clip_size,
            source: None,
            destination: None,
            header: [0; WAV_HEADER_SIZE],
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Samples per clip when loading from storage.
    pub fn clip_size(&self) -> usize {
        self.clip_size
    }

    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// Every sample of every clip, in recording order.
    pub fn samples(&self) -> impl Iterator<Item = i16> + '_ {
        self.clips.iter().flat_map(|clip| clip.samples().iter().copied())
    }

    /// The 44-byte header produced by the last save or read by the last load.
    pub fn header(&self) -> &[u8; WAV_HEADER_SIZE] {
        &self.header
    }

    pub fn append_clip(&mut self, clip: Clip) -> Result<(), CaptureError> {
        if clip.is_empty() {
            return Err(CaptureError::EmptyInput("clip is empty".into()));
        }
        self.clips.push(clip);
        Ok(())
    }

    /// Append a copy of `clip`, leaving the original untouched.
    pub fn append_clip_copy(&mut self, clip: &Clip) -> Result<(), CaptureError> {
        if clip.is_empty() {
            return Err(CaptureError::EmptyInput("clip is empty".into()));
        }
        self.clips.push(clip.clone());
        Ok(())
    }

    /// Move the samples out of `clip`, leaving it empty but reusable.
    pub fn append_clip_from(&mut self, clip: &mut Clip) -> Result<(), CaptureError> {
        if clip.is_empty() {
            return Err(CaptureError::EmptyInput("clip is empty".into()));
        }
        self.clips.push(clip.take());
        Ok(())
    }

    pub fn append_sound(&mut self, other: Sound) -> Result<(), CaptureError> {
        if other.clips.is_empty() {
            return Err(CaptureError::EmptyInput("sound is empty".into()));
        }
        self.clips.extend(other.clips);
        Ok(())
    }

    /// Append copies of every clip in `other`.
    pub fn append_sound_copy(&mut self, other: &Sound) -> Result<(), CaptureError> {
        if other.clips.is_empty() {
            return Err(CaptureError::EmptyInput("sound is empty".into()));
        }
        self.clips.extend(other.clips.iter().cloned());
        Ok(())
    }

    pub fn total_samples(&self) -> usize {
        self.clips.iter().map(Clip::len).sum()
    }

    pub fn duration_secs(&self) -> f64 {
        self.total_samples() as f64 / self.sample_rate as f64
    }

    /// Drop every clip. Bindings are left as they are.
    pub fn clear(&mut self) {
        self.clips.clear();
    }

    /// Bind the file the next `load` reads from.
    pub fn bind_source(&mut self, storage: Arc<dyn Storage>, path: &str) -> &mut Self {
        self.source = Some(Binding {
            storage,
            path: normalize_path(path),
        });
        self
    }

    /// Bind the file every `save` writes to.
    pub fn bind_destination(&mut self, storage: Arc<dyn Storage>, path: &str) -> &mut Self {
        self.destination = Some(Binding {
            storage,
            path: normalize_path(path),
        });
        self
    }

    pub fn source_path(&self) -> Option<&str> {
        self.source.as_ref().map(|b| b.path.as_str())
    }

    pub fn destination_path(&self) -> Option<&str> {
        self.destination.as_ref().map(|b| b.path.as_str())
    }

    /// Decode the bound source and append its clips.
    ///
    /// The file is split into clips of `clip_size` samples plus a shorter
    /// trailing clip for the remainder. Nothing is appended if decoding
    /// fails. On success the source binding is released.
    pub fn load(&mut self, policy: MissingFilePolicy) -> Result<(), CaptureError> {
        let binding = self
            .source
            .clone()
            .ok_or_else(|| CaptureError::InvalidArgument("no source bound, call bind_source first".into()))?;
        let path = binding.path.as_str();

        if !binding.storage.exists(path) {
            return match policy {
                MissingFilePolicy::Ignore => {
                    log::warn!("Missing file {}, clearing sound", path);
                    self.clear();
                    Ok(())
                }
                MissingFilePolicy::Require => Err(CaptureError::SourceMissing(path.to_string())),
            };
        }

        let mut reader = binding
            .storage
            .open_read(path)
            .map_err(|e| CaptureError::StorageError(format!("unable to open {}: {}", path, e)))?;
        let file_size = reader.size();
        let decoded = wav_codec::decode(&mut reader, file_size, self.clip_size)?;

        if decoded.wav.sample_rate != self.sample_rate {
            log::warn!(
                "{} was recorded at {} Hz but the sound runs at {} Hz",
                path,
                decoded.wav.sample_rate,
                self.sample_rate
            );
        }

        let loaded_clips = decoded.clips.len();
        self.header = decoded.header;
        self.clips.extend(decoded.clips);
        self.source = None;

        log::info!("Loaded {} clips ({} bytes) from {}", loaded_clips, file_size, path);
        Ok(())
    }

    /// Encode every clip to the bound destination.
    ///
    /// Missing parent directories are created first. The destination stays
    /// bound, so repeated saves rewrite the same file.
    pub fn save(&mut self, policy: ExistingFilePolicy) -> Result<SaveReport, CaptureError> {
        let binding = self
            .destination
            .clone()
            .ok_or_else(|| CaptureError::InvalidArgument("no destination bound, call bind_destination first".into()))?;
        let path = binding.path.as_str();
        let storage = binding.storage.as_ref();

        if storage.exists(path) {
            match policy {
                ExistingFilePolicy::Overwrite => log::info!("File {} already exists, overwriting", path),
                ExistingFilePolicy::Refuse => return Err(CaptureError::DestinationExists(path.to_string())),
            }
        } else {
            for dir in ancestor_dirs(path) {
                if !storage.exists(&dir) {
                    storage
                        .create_dir(&dir)
                        .map_err(|e| CaptureError::StorageError(format!("failed to create directory {}: {}", dir, e)))?;
                }
            }
        }

        let mut writer = storage
            .open_write(path)
            .map_err(|e| CaptureError::WriteError(format!("unable to create {}: {}", path, e)))?;
        let summary = wav_codec::encode(&mut writer, &self.clips, self.sample_rate)?;
        drop(writer);

        self.header = summary.header;
        let report = SaveReport {
            path: path.to_string(),
            sample_rate: self.sample_rate,
            clip_count: self.clips.len(),
            total_samples: self.total_samples(),
            bytes_written: summary.bytes_written,
            duration_secs: self.duration_secs(),
            checksum: summary.checksum,
        };

        log::info!(
            "Saved {} clips ({:.2}s) to {}",
            report.clip_count,
            report.duration_secs,
            report.path
        );
        Ok(report)
    }
}

impl Default for Sound {
    fn default() -> Self {
        Self::with_config(&CaptureConfiguration::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::fs_storage::FsStorage;
    use crate::storage::memory_storage::MemoryStorage;
    use approx::assert_relative_eq;

    fn config(sample_rate: u32, clip_size: usize) -> CaptureConfiguration {
        CaptureConfiguration {
            sample_rate,
            clip_size,
            ..Default::default()
        }
    }

    fn ramp(len: usize) -> Vec<i16> {
        (0..len).map(|i| (i % 65536) as u16 as i16).collect()
    }

    fn sound_with(config: &CaptureConfiguration, chunks: Vec<Vec<i16>>) -> Sound {
        let mut sound = Sound::new(config).unwrap();
        for chunk in chunks {
            sound.append_clip(Clip::from_samples(&chunk)).unwrap();
        }
        sound
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        for rate in [0, 3_000_000_000] {
            let err = Sound::new(&config(rate, 4)).unwrap_err();
            assert!(matches!(err, CaptureError::InvalidArgument(_)));
        }
    }

    #[test]
    fn empty_clip_is_rejected() {
        let mut sound = Sound::default();
        let mut empty = Clip::new(10);

        assert!(matches!(sound.append_clip(Clip::new(10)), Err(CaptureError::EmptyInput(_))));
        assert!(matches!(sound.append_clip_copy(&empty), Err(CaptureError::EmptyInput(_))));
        assert!(matches!(sound.append_clip_from(&mut empty), Err(CaptureError::EmptyInput(_))));
        assert!(sound.is_empty());
    }

    #[test]
    fn empty_sound_is_rejected() {
        let mut sound = Sound::default();
        assert!(matches!(sound.append_sound(Sound::default()), Err(CaptureError::EmptyInput(_))));
        assert!(matches!(
            sound.append_sound_copy(&Sound::default()),
            Err(CaptureError::EmptyInput(_))
        ));
    }

    #[test]
    fn copy_append_keeps_original() {
        let mut sound = Sound::default();
        let clip = Clip::from_samples(&[1, 2, 3]);
        sound.append_clip_copy(&clip).unwrap();

        assert_eq!(clip.samples(), &[1, 2, 3]);
        assert_eq!(sound.clips()[0].samples(), &[1, 2, 3]);
    }

    #[test]
    fn move_append_empties_original() {
        let mut sound = Sound::default();
        let mut clip = Clip::new(4);
        clip.append(&[4, 5]).unwrap();
        sound.append_clip_from(&mut clip).unwrap();

        assert!(clip.is_empty());
        assert_eq!(sound.clips()[0].samples(), &[4, 5]);
    }

    #[test]
    fn appending_sounds_preserves_order() {
        let cfg = config(8000, 4);
        let mut first = sound_with(&cfg, vec![vec![1], vec![2, 2]]);
        let second = sound_with(&cfg, vec![vec![3, 3, 3]]);

        first.append_sound_copy(&second).unwrap();
        assert_eq!(second.clip_count(), 1);
        first.append_sound(second).unwrap();

        let lengths: Vec<usize> = first.clips().iter().map(Clip::len).collect();
        assert_eq!(lengths, vec![1, 2, 3, 3]);
        assert_eq!(first.samples().collect::<Vec<_>>(), vec![1, 2, 2, 3, 3, 3, 3, 3, 3]);
    }

    #[test]
    fn totals_and_duration() {
        let cfg = config(44100, 22050);
        let samples = ramp(55125);
        let sound = sound_with(
            &cfg,
            vec![
                samples[..22050].to_vec(),
                samples[22050..44100].to_vec(),
                samples[44100..].to_vec(),
            ],
        );

        assert_eq!(sound.total_samples(), 55125);
        assert_relative_eq!(sound.duration_secs(), 1.25);
    }

    #[test]
    fn clear_keeps_bindings() {
        let storage = Arc::new(MemoryStorage::new());
        let mut sound = sound_with(&config(8000, 4), vec![vec![1, 2]]);
        sound.bind_destination(storage, "out.wav");
        sound.clear();

        assert!(sound.is_empty());
        assert_eq!(sound.destination_path(), Some("/out.wav"));
    }

    #[test]
    fn load_and_save_need_bindings() {
        let mut sound = Sound::default();
        assert!(matches!(
            sound.load(MissingFilePolicy::Ignore),
            Err(CaptureError::InvalidArgument(_))
        ));
        assert!(matches!(
            sound.save(ExistingFilePolicy::Overwrite),
            Err(CaptureError::InvalidArgument(_))
        ));
    }

    #[test]
    fn half_second_clips_round_trip() {
        let cfg = config(44100, 22050);
        let storage = Arc::new(MemoryStorage::new());
        let samples = ramp(55125);

        let mut recorded = Sound::new(&cfg).unwrap();
        recorded.append_clip(Clip::from_samples(&samples)).unwrap();
        let report = recorded
            .bind_destination(storage.clone(), "/rec/take.wav")
            .save(ExistingFilePolicy::Overwrite)
            .unwrap();
        assert_eq!(report.bytes_written, 44 + 110250);
        assert_eq!(report.clip_count, 1);

        let mut loaded = Sound::new(&cfg).unwrap();
        loaded
            .bind_source(storage.clone(), "/rec/take.wav")
            .load(MissingFilePolicy::Require)
            .unwrap();

        let lengths: Vec<usize> = loaded.clips().iter().map(Clip::len).collect();
        assert_eq!(lengths, vec![22050, 22050, 11025]);
        assert_eq!(loaded.samples().collect::<Vec<_>>(), samples);
        assert_relative_eq!(loaded.duration_secs(), 1.25);
        assert_eq!(loaded.header(), recorded.header());
    }

    #[test]
    fn round_trip_clip_counts_follow_clip_size() {
        let storage = Arc::new(MemoryStorage::new());
        for (total, clip_size) in [(1usize, 7usize), (7, 7), (50, 7), (49, 7)] {
            let cfg = config(8000, clip_size);
            let samples = ramp(total);
            let mut sound = sound_with(&cfg, vec![samples.clone()]);
            sound
                .bind_destination(storage.clone(), "/rt.wav")
                .save(ExistingFilePolicy::Overwrite)
                .unwrap();

            let mut loaded = Sound::new(&cfg).unwrap();
            loaded.bind_source(storage.clone(), "/rt.wav").load(MissingFilePolicy::Require).unwrap();

            assert_eq!(loaded.clip_count(), total.div_ceil(clip_size));
            let expected_tail = if total % clip_size == 0 { clip_size } else { total % clip_size };
            assert_eq!(loaded.clips().last().map(Clip::len), Some(expected_tail));
            assert_eq!(loaded.samples().collect::<Vec<_>>(), samples);
        }
    }

    #[test]
    fn saved_bytes_are_exact() {
        let storage = Arc::new(MemoryStorage::new());
        let mut sound = sound_with(&config(8000, 4), vec![vec![1, -1], vec![256]]);
        let report = sound
            .bind_destination(storage.clone(), "/x.wav")
            .save(ExistingFilePolicy::Overwrite)
            .unwrap();

        let bytes = storage.file("/x.wav").unwrap();
        let mut expected = crate::processing::wav_format::generate_wav_header(8000, 6).to_vec();
        expected.extend_from_slice(&[1, 0, 0xFF, 0xFF, 0, 1]);
        assert_eq!(bytes, expected);
        assert_eq!(&bytes[..44], &sound.header()[..]);
        assert_eq!(report.bytes_written, bytes.len() as u64);
    }

    #[test]
    fn missing_source_is_ignored_by_default() {
        let storage = Arc::new(MemoryStorage::new());
        let mut sound = sound_with(&config(8000, 4), vec![vec![1, 2]]);
        sound.bind_source(storage, "/nope.wav").load(MissingFilePolicy::Ignore).unwrap();
        assert!(sound.is_empty());
    }

    #[test]
    fn missing_source_can_be_required() {
        let storage = Arc::new(MemoryStorage::new());
        let mut sound = Sound::default();
        let err = sound
            .bind_source(storage, "/nope.wav")
            .load(MissingFilePolicy::Require)
            .unwrap_err();
        assert_eq!(err, CaptureError::SourceMissing("/nope.wav".into()));
    }

    #[test]
    fn load_rejects_non_riff() {
        let storage = Arc::new(MemoryStorage::new());
        let mut bytes = b"JUNK".to_vec();
        bytes.extend_from_slice(&[0u8; 100]);
        storage.insert_file("/junk.wav", bytes);

        let mut sound = Sound::default();
        let err = sound
            .bind_source(storage, "/junk.wav")
            .load(MissingFilePolicy::Require)
            .unwrap_err();
        assert!(matches!(err, CaptureError::MalformedHeader(_)));
        assert!(sound.is_empty());
        assert_eq!(sound.source_path(), Some("/junk.wav"));
    }

    #[test]
    fn load_appends_and_releases_source() {
        let cfg = config(8000, 4);
        let storage = Arc::new(MemoryStorage::new());
        sound_with(&cfg, vec![vec![5, 6, 7]])
            .bind_destination(storage.clone(), "/a.wav")
            .save(ExistingFilePolicy::Overwrite)
            .unwrap();

        let mut sound = sound_with(&cfg, vec![vec![1]]);
        sound.bind_source(storage.clone(), "/a.wav").load(MissingFilePolicy::Require).unwrap();
        assert_eq!(sound.samples().collect::<Vec<_>>(), vec![1, 5, 6, 7]);
        assert_eq!(sound.source_path(), None);

        assert!(matches!(
            sound.load(MissingFilePolicy::Require),
            Err(CaptureError::InvalidArgument(_))
        ));
    }

    #[test]
    fn load_tolerates_other_sample_rate() {
        let storage = Arc::new(MemoryStorage::new());
        sound_with(&config(16000, 4), vec![vec![1, 2]])
            .bind_destination(storage.clone(), "/a.wav")
            .save(ExistingFilePolicy::Overwrite)
            .unwrap();

        let mut sound = Sound::new(&config(44100, 4)).unwrap();
        sound.bind_source(storage, "/a.wav").load(MissingFilePolicy::Require).unwrap();
        assert_eq!(sound.total_samples(), 2);
    }

    #[test]
    fn existing_destination_policies() {
        let cfg = config(8000, 4);
        let storage = Arc::new(MemoryStorage::new());
        storage.insert_file("/a.wav", vec![0xEE; 3]);

        let mut sound = sound_with(&cfg, vec![vec![1, 2]]);
        sound.bind_destination(storage.clone(), "/a.wav");

        let err = sound.save(ExistingFilePolicy::Refuse).unwrap_err();
        assert_eq!(err, CaptureError::DestinationExists("/a.wav".into()));
        assert_eq!(storage.file("/a.wav").unwrap(), vec![0xEE; 3]);

        sound.save(ExistingFilePolicy::Overwrite).unwrap();
        assert_eq!(storage.file("/a.wav").unwrap().len(), 48);
        assert_eq!(sound.destination_path(), Some("/a.wav"));
    }

    #[test]
    fn save_creates_missing_directories() {
        let storage = Arc::new(MemoryStorage::new());
        storage.create_dir("/rec").unwrap();

        let mut sound = sound_with(&config(8000, 4), vec![vec![1]]);
        sound
            .bind_destination(storage.clone(), "rec//2024/06/take.wav")
            .save(ExistingFilePolicy::Overwrite)
            .unwrap();

        assert!(storage.is_dir("/rec/2024"));
        assert!(storage.is_dir("/rec/2024/06"));
        assert!(storage.file("/rec/2024/06/take.wav").is_some());
    }

    #[test]
    fn short_write_is_reported() {
        let storage = Arc::new(MemoryStorage::with_write_limit(50));
        let mut sound = sound_with(&config(8000, 4), vec![vec![1, 2, 3, 4], vec![5, 6, 7, 8]]);
        let err = sound
            .bind_destination(storage, "/a.wav")
            .save(ExistingFilePolicy::Overwrite)
            .unwrap_err();
        assert!(matches!(err, CaptureError::WriteError(_)));
    }

    #[test]
    fn round_trip_through_host_files() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(FsStorage::new(dir.path()));
        let cfg = config(44100, 100);
        let samples = ramp(250);

        let report = sound_with(&cfg, vec![samples.clone()])
            .bind_destination(storage.clone(), "/takes/one.wav")
            .save(ExistingFilePolicy::Overwrite)
            .unwrap();
        assert!(dir.path().join("takes/one.wav").is_file());

        let mut loaded = Sound::new(&cfg).unwrap();
        loaded.bind_source(storage, "/takes/one.wav").load(MissingFilePolicy::Require).unwrap();
        assert_eq!(loaded.clip_count(), 3);
        assert_eq!(loaded.samples().collect::<Vec<_>>(), samples);
        assert_eq!(report.total_samples, 250);
    }
}
