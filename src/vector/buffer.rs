use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use arrow::buffer::MutableBuffer;
use tracing::debug;

use crate::error::{Error, Result};

/// Largest buffer a vector may hold: `isize::MAX` rounded down to the 64 byte alignment
/// arrow allocates with.
pub const MAX_BUFFER_SIZE: usize = isize::MAX as usize & !63;

/// Fails when a buffer of `current` bytes cannot become `new_size` bytes.
pub(crate) fn check_size(current: usize, new_size: usize) -> Result<()> {
    if new_size > MAX_BUFFER_SIZE {
        return Err(Error::AllocationFailed {
            requested: new_size.saturating_sub(current),
            available: MAX_BUFFER_SIZE.saturating_sub(current),
        });
    }
    Ok(())
}

/// Owner of the raw memory behind column vectors.
///
/// Implementations are shared between independent builds, so every method must be
/// safe to call concurrently. A failed request is reported right away and never waits
/// for memory to become available.
pub trait BufferManager: Send + Sync + fmt::Debug {
    /// Hands out a zeroed buffer of `size` bytes.
    fn allocate(&self, size: usize) -> Result<BufferHandle>;

    /// Grows `handle` to `new_size` bytes in place. Existing bytes are kept and the new
    /// tail is zeroed. On failure the handle is left untouched.
    fn grow(&self, handle: &mut BufferHandle, new_size: usize) -> Result<()>;

    fn release(&self, handle: BufferHandle);
}

/// A buffer handed out by a [`BufferManager`], or allocated directly for unmanaged vectors.
#[derive(Debug)]
pub struct BufferHandle {
    id: u64,
    buffer: MutableBuffer,
}

impl BufferHandle {
    /// Id 0 marks a buffer that no manager knows about.
    pub const UNMANAGED: u64 = 0;

    pub fn new(id: u64, buffer: MutableBuffer) -> Self {
        Self { id, buffer }
    }

    pub fn unmanaged(size: usize) -> Result<Self> {
        check_size(0, size)?;
        Ok(Self::new(Self::UNMANAGED, MutableBuffer::from_len_zeroed(size)))
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    pub fn as_slice_mut(&mut self) -> &mut [u8] {
        self.buffer.as_slice_mut()
    }

    pub(crate) fn buffer(&self) -> &MutableBuffer {
        &self.buffer
    }

    pub(crate) fn buffer_mut(&mut self) -> &mut MutableBuffer {
        &mut self.buffer
    }

    /// Zero-extends the buffer. Shrinking is not supported and is ignored.
    pub(crate) fn resize(&mut self, new_size: usize) -> Result<()> {
        if new_size > self.buffer.len() {
            check_size(self.buffer.len(), new_size)?;
            self.buffer.resize(new_size, 0);
        }
        Ok(())
    }
}

/// A [`BufferManager`] that keeps atomic byte accounting and enforces an optional limit.
#[derive(Debug)]
pub struct TrackingBufferManager {
    limit: Option<usize>,
    next_id: AtomicU64,
    allocated: AtomicUsize,
    peak: AtomicUsize,
    live: AtomicUsize,
}

impl TrackingBufferManager {
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            limit,
            next_id: AtomicU64::new(BufferHandle::UNMANAGED + 1),
            allocated: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            live: AtomicUsize::new(0),
        }
    }

    pub fn unlimited() -> Self {
        Self::new(None)
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Bytes currently held by live buffers.
    pub fn allocated_bytes(&self) -> usize {
        self.allocated.load(Ordering::Relaxed)
    }

    pub fn peak_bytes(&self) -> usize {
        self.peak.load(Ordering::Relaxed)
    }

    pub fn live_buffers(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }

    fn reserve(&self, bytes: usize) -> Result<()> {
        let mut current = self.allocated.load(Ordering::Relaxed);
        loop {
            let wanted = current.saturating_add(bytes);
            if let Some(limit) = self.limit {
                if wanted > limit {
                    return Err(Error::AllocationFailed {
                        requested: bytes,
                        available: limit.saturating_sub(current),
                    });
                }
            }
            match self.allocated.compare_exchange(
                current,
                wanted,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    self.update_peak(wanted);
                    return Ok(());
                }
                Err(actual) => current = actual,
            }
        }
    }

    fn unreserve(&self, bytes: usize) {
        self.allocated.fetch_sub(bytes, Ordering::AcqRel);
    }

    fn update_peak(&self, value: usize) {
        let mut prev = self.peak.load(Ordering::Relaxed);
        while value > prev {
            match self
                .peak
                .compare_exchange(prev, value, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => break,
                Err(actual) => prev = actual,
            }
        }
    }
}

impl Default for TrackingBufferManager {
    fn default() -> Self {
        Self::unlimited()
    }
}

impl BufferManager for TrackingBufferManager {
    fn allocate(&self, size: usize) -> Result<BufferHandle> {
        check_size(0, size)?;
        self.reserve(size)?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.live.fetch_add(1, Ordering::AcqRel);
        debug!(id, size, "allocated buffer");
        Ok(BufferHandle::new(id, MutableBuffer::from_len_zeroed(size)))
    }

    fn grow(&self, handle: &mut BufferHandle, new_size: usize) -> Result<()> {
        let old_size = handle.len();
        if new_size <= old_size {
            return Ok(());
        }
        check_size(old_size, new_size)?;
        self.reserve(new_size - old_size)?;
        if let Err(e) = handle.resize(new_size) {
            self.unreserve(new_size - old_size);
            return Err(e);
        }
        debug!(id = handle.id(), old_size, new_size, "grew buffer");
        Ok(())
    }

    fn release(&self, handle: BufferHandle) {
        self.unreserve(handle.len());
        self.live.fetch_sub(1, Ordering::AcqRel);
        debug!(id = handle.id(), size = handle.len(), "released buffer");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_allocate_and_release_accounting() -> Result<()> {
        let manager = TrackingBufferManager::unlimited();
        let a = manager.allocate(64)?;
        let b = manager.allocate(32)?;
        assert_ne!(a.id(), b.id());
        assert_eq!(manager.allocated_bytes(), 96);
        assert_eq!(manager.live_buffers(), 2);

        manager.release(a);
        assert_eq!(manager.allocated_bytes(), 32);
        assert_eq!(manager.live_buffers(), 1);
        assert_eq!(manager.peak_bytes(), 96);

        manager.release(b);
        assert_eq!(manager.allocated_bytes(), 0);
        assert_eq!(manager.live_buffers(), 0);
        Ok(())
    }

    #[test]
    fn test_grow_preserves_bytes() -> Result<()> {
        let manager = TrackingBufferManager::unlimited();
        let mut handle = manager.allocate(4)?;
        handle.as_slice_mut().copy_from_slice(&[1, 2, 3, 4]);

        manager.grow(&mut handle, 10)?;
        assert_eq!(handle.len(), 10);
        assert_eq!(handle.as_slice(), &[1, 2, 3, 4, 0, 0, 0, 0, 0, 0]);
        assert_eq!(manager.allocated_bytes(), 10);

        manager.grow(&mut handle, 2)?;
        assert_eq!(handle.len(), 10);
        manager.release(handle);
        Ok(())
    }

    #[test]
    fn test_limit_is_enforced() -> Result<()> {
        let manager = TrackingBufferManager::new(Some(100));
        let mut handle = manager.allocate(60)?;

        let err = manager.allocate(50).unwrap_err();
        assert!(matches!(
            err,
            Error::AllocationFailed {
                requested: 50,
                available: 40
            }
        ));

        assert!(manager.grow(&mut handle, 120).is_err());
        assert_eq!(handle.len(), 60);
        assert_eq!(manager.allocated_bytes(), 60);

        manager.grow(&mut handle, 100)?;
        assert_eq!(manager.allocated_bytes(), 100);
        manager.release(handle);
        Ok(())
    }

    #[test]
    fn test_oversized_requests_fail_without_panicking() -> Result<()> {
        assert!(matches!(
            BufferHandle::unmanaged(usize::MAX),
            Err(Error::AllocationFailed { .. })
        ));
        let mut handle = BufferHandle::unmanaged(8)?;
        assert!(handle.resize(MAX_BUFFER_SIZE + 1).is_err());
        assert_eq!(handle.len(), 8);

        let manager = TrackingBufferManager::unlimited();
        assert!(matches!(
            manager.allocate(usize::MAX - 1),
            Err(Error::AllocationFailed { .. })
        ));
        let mut handle = manager.allocate(16)?;
        let err = manager.grow(&mut handle, usize::MAX).unwrap_err();
        assert!(matches!(
            err,
            Error::AllocationFailed { requested, available }
                if requested == usize::MAX - 16 && available == MAX_BUFFER_SIZE - 16
        ));
        assert_eq!(handle.len(), 16);
        assert_eq!(manager.allocated_bytes(), 16);
        assert_eq!(manager.live_buffers(), 1);
        manager.release(handle);
        Ok(())
    }

    #[test]
    fn test_concurrent_builds_share_manager() {
        let manager = Arc::new(TrackingBufferManager::new(Some(1 << 20)));
        let workers: Vec<_> = (0..8)
            .map(|_| {
                let manager = Arc::clone(&manager);
                thread::spawn(move || {
                    for _ in 0..100 {
                        let mut handle = manager.allocate(16).unwrap();
                        manager.grow(&mut handle, 64).unwrap();
                        manager.release(handle);
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
        assert_eq!(manager.allocated_bytes(), 0);
        assert_eq!(manager.live_buffers(), 0);
        assert!(manager.peak_bytes() >= 64);
    }
}
