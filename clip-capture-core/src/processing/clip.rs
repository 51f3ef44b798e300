use std::io::Read;

use crate::models::error::CaptureError;

/// A run of consecutive mono 16-bit samples with a fixed capacity.
///
/// Storage is allocated on the first append, not at construction, so a
/// freshly created clip costs nothing until the capture loop fills it.
/// Capacity only ever grows, and only while the clip is empty, so that a
/// single oversized load (e.g. a whole file) fits in one clip.
///
/// Cloning copies exactly `len()` samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clip {
    capacity: usize,
    samples: Vec<i16>,
}

impl Clip {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            samples: Vec::new(),
        }
    }

    /// A full clip holding a copy of `samples`.
    pub fn from_samples(samples: &[i16]) -> Self {
        Self {
            capacity: samples.len(),
            samples: samples.to_vec(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity
    }

    /// Samples that still fit before the clip is full.
    pub fn remaining(&self) -> usize {
        self.capacity - self.samples.len()
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Whether backing storage has been allocated.
    pub fn has_storage(&self) -> bool {
        self.samples.capacity() > 0
    }

    /// Append every sample in `source` after the current contents.
    ///
    /// Fails with `InvalidArgument` for an empty slice and with
    /// `CapacityExceeded` if the samples do not fit. Nothing is written on
    /// failure.
    pub fn append(&mut self, source: &[i16]) -> Result<(), CaptureError> {
        self.make_room(source.len())?;
        self.samples.extend_from_slice(source);
        Ok(())
    }

    /// Read `count` little-endian samples from `reader` into the clip.
    ///
    /// Whatever was read is kept; if the reader ran dry before `count`
    /// samples the call fails with `TruncatedRead`.
    pub fn load_from<R: Read + ?Sized>(&mut self, reader: &mut R, count: usize) -> Result<(), CaptureError> {
        self.make_room(count)?;

        let mut bytes = Vec::with_capacity(count * 2);
        let mut limited = Read::take(&mut *reader, (count * 2) as u64);
        limited
            .read_to_end(&mut bytes)
            .map_err(|e| CaptureError::StorageError(format!("read failed: {}", e)))?;

        let actual = bytes.len() / 2;
        self.samples
            .extend(bytes.chunks_exact(2).map(|pair| i16::from_le_bytes([pair[0], pair[1]])));

        if actual != count {
            return Err(CaptureError::TruncatedRead { expected: count, actual });
        }
        Ok(())
    }

    /// Move the contents out, leaving this clip empty with its capacity intact.
    pub fn take(&mut self) -> Clip {
        Clip {
            capacity: self.capacity,
            samples: std::mem::take(&mut self.samples),
        }
    }

    /// Samples serialized as little-endian 16-bit PCM.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.samples.len() * 2);
        for sample in &self.samples {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        bytes
    }

    /// Validate an incoming count, grow an empty clip if needed, and allocate storage.
    fn make_room(&mut self, count: usize) -> Result<(), CaptureError> {
        if count == 0 {
            return Err(CaptureError::InvalidArgument("cannot append zero samples".into()));
        }
        if self.samples.is_empty() && count > self.capacity {
            self.capacity = count;
        }
        let available = self.remaining();
        if count > available {
            return Err(CaptureError::CapacityExceeded {
                requested: count,
                available,
            });
        }
        if !self.has_storage() {
            self.samples.reserve_exact(self.capacity);
        }
        Ok(())
    }
}
