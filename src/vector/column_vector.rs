use std::fmt;
use std::sync::Arc;

use arrow::array::ArrayRef;
use arrow::buffer::MutableBuffer;
use arrow::util::bit_util;
use tracing::{debug, warn};

use crate::config::LiteralConfig;
use crate::datatype::element_type::{ElementLayout, ElementType};
use crate::datatype::scalar::Scalar;
use crate::datatype::value::ElementValue;
use crate::error::{Error, Result};
use crate::vector::buffer::{BufferHandle, BufferManager, TrackingBufferManager, MAX_BUFFER_SIZE};
use crate::vector::builder::builder_for;

/// Bytes of the slot table entry kept per variable-width element: offset and length as u32.
pub(crate) const SLOT_WIDTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorState {
    /// Backing storage exists, nothing written yet.
    Allocated,
    Writing,
    /// Logical length is fixed, no more writes.
    Finalized,
    /// Buffers were handed back to the manager.
    Released,
}

/// How vectors get their memory and how they grow.
#[derive(Clone)]
pub struct VectorOptions {
    /// `None` allocates directly, outside of any manager.
    pub manager: Option<Arc<dyn BufferManager>>,
    /// Bytes reserved per STRING element at allocation.
    pub string_length_estimate: usize,
    pub growth_factor: usize,
}

impl VectorOptions {
    pub fn new(manager: Option<Arc<dyn BufferManager>>) -> Self {
        Self {
            manager,
            ..Self::default()
        }
    }

    /// Options for `config`, with a tracking manager that enforces its memory limit.
    pub fn from_config(config: &LiteralConfig) -> Self {
        Self {
            manager: Some(Arc::new(TrackingBufferManager::new(config.memory_limit))),
            string_length_estimate: config.string_length_estimate,
            growth_factor: config.growth_factor,
        }
    }

    pub fn with_manager(mut self, manager: Arc<dyn BufferManager>) -> Self {
        self.manager = Some(manager);
        self
    }
}

impl Default for VectorOptions {
    fn default() -> Self {
        Self {
            manager: None,
            string_length_estimate: 32,
            growth_factor: 2,
        }
    }
}

impl fmt::Debug for VectorOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VectorOptions")
            .field("managed", &self.manager.is_some())
            .field("string_length_estimate", &self.string_length_estimate)
            .field("growth_factor", &self.growth_factor)
            .finish()
    }
}

/// A typed, growable, buffer-backed vector holding one array literal's elements.
///
/// `capacity >= cursor` holds at all times and capacity never shrinks. The vector owns its
/// buffers and hands them back to the manager on [`ColumnVector::release`] or on drop.
pub struct ColumnVector {
    element_type: ElementType,
    state: VectorState,
    capacity: usize,
    cursor: usize,
    len: usize,
    scale: Option<i8>,
    values: Option<BufferHandle>,
    heap: Option<BufferHandle>,
    heap_len: usize,
    manager: Option<Arc<dyn BufferManager>>,
    growth_factor: usize,
}

impl ColumnVector {
    /// Allocates storage for `max(1, requested)` elements of `element_type`.
    pub(crate) fn allocate(
        element_type: ElementType,
        requested: usize,
        options: &VectorOptions,
    ) -> Result<Self> {
        let capacity = requested.max(1);
        let manager = options.manager.clone();
        let values = alloc_buffer(manager.as_deref(), values_bytes(element_type, capacity)?)?;
        let heap = match element_type.layout() {
            ElementLayout::Variable { .. } => {
                let size = capacity.saturating_mul(options.string_length_estimate);
                match alloc_buffer(manager.as_deref(), size) {
                    Ok(heap) => Some(heap),
                    Err(e) => {
                        free_buffer(manager.as_deref(), values);
                        return Err(e);
                    }
                }
            }
            _ => None,
        };
        debug!(%element_type, capacity, managed = manager.is_some(), "allocated column vector");
        Ok(Self {
            element_type,
            state: VectorState::Allocated,
            capacity,
            cursor: 0,
            len: 0,
            scale: None,
            values: Some(values),
            heap,
            heap_len: 0,
            manager,
            growth_factor: options.growth_factor.max(2),
        })
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    pub fn state(&self) -> VectorState {
        self.state
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// One past the highest index written so far.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Logical length: fixed by finalize, the cursor before that.
    pub fn len(&self) -> usize {
        match self.state {
            VectorState::Finalized => self.len,
            VectorState::Released => 0,
            _ => self.cursor,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Scale shared by every element of a decimal vector.
    pub fn scale(&self) -> Option<i8> {
        self.scale
    }

    pub fn is_managed(&self) -> bool {
        self.manager.is_some()
    }

    pub fn write_at(&mut self, index: usize, value: &ElementValue) -> Result<()> {
        builder_for(self.element_type).write_at(self, index, value)
    }

    pub fn get(&self, index: usize) -> Result<Scalar> {
        builder_for(self.element_type).read_at(self, index)
    }

    /// Every element up to the logical length.
    pub fn values(&self) -> Result<Vec<Scalar>> {
        (0..self.len()).map(|index| self.get(index)).collect()
    }

    pub fn finalize(&mut self, count: usize) -> Result<()> {
        builder_for(self.element_type).finalize(self, count)
    }

    pub fn to_array(&self) -> Result<ArrayRef> {
        builder_for(self.element_type).to_array(self)
    }

    /// Hands the buffers back to the manager. A vector that was never finalized counts as
    /// a cancelled build.
    pub fn release(mut self) {
        self.release_buffers();
    }

    fn release_buffers(&mut self) {
        if self.state == VectorState::Released {
            return;
        }
        if self.state != VectorState::Finalized {
            warn!(
                element_type = %self.element_type,
                cursor = self.cursor,
                "releasing column vector that was never finalized"
            );
        }
        if let Some(values) = self.values.take() {
            free_buffer(self.manager.as_deref(), values);
        }
        if let Some(heap) = self.heap.take() {
            free_buffer(self.manager.as_deref(), heap);
        }
        debug!(element_type = %self.element_type, capacity = self.capacity, "released column vector");
        self.state = VectorState::Released;
    }

    pub(crate) fn check_writable(&self, operation: &'static str) -> Result<()> {
        match self.state {
            VectorState::Allocated | VectorState::Writing => Ok(()),
            state => Err(Error::InvalidVectorState { state, operation }),
        }
    }

    /// Fails unless `index` is below the logical length of a live vector.
    pub(crate) fn check_readable(&self, index: usize) -> Result<()> {
        if self.state == VectorState::Released {
            return Err(Error::InvalidVectorState {
                state: self.state,
                operation: "read",
            });
        }
        if index >= self.len() {
            return Err(Error::IndexOutOfBounds {
                index,
                len: self.len(),
            });
        }
        Ok(())
    }

    /// Grows the vector until `index` fits. Capacity is multiplied by the growth factor,
    /// and is at least `index + 1`. On failure nothing changes.
    pub(crate) fn reserve_index(&mut self, index: usize) -> Result<()> {
        if index < self.capacity {
            return Ok(());
        }
        let required = index.checked_add(1).ok_or(Error::AllocationFailed {
            requested: usize::MAX,
            available: MAX_BUFFER_SIZE,
        })?;
        let grown = self.capacity.saturating_mul(self.growth_factor).max(required);
        // fall back to the exact size when geometric growth would overshoot the cap
        let (new_capacity, new_size) = match values_bytes(self.element_type, grown) {
            Ok(size) => (grown, size),
            Err(_) => (required, values_bytes(self.element_type, required)?),
        };
        let values = self.values.as_mut().ok_or(Error::InvalidVectorState {
            state: self.state,
            operation: "grow",
        })?;
        grow_buffer(self.manager.as_deref(), values, new_size)?;
        debug!(
            element_type = %self.element_type,
            old_capacity = self.capacity,
            new_capacity,
            "grew column vector"
        );
        self.capacity = new_capacity;
        Ok(())
    }

    /// Records a successful write at `index`.
    pub(crate) fn mark_written(&mut self, index: usize) {
        self.cursor = self.cursor.max(index + 1);
        self.state = VectorState::Writing;
    }

    pub(crate) fn set_finalized(&mut self, count: usize) -> Result<()> {
        self.check_writable("finalize")?;
        if count > self.capacity {
            return Err(Error::IndexOutOfBounds {
                index: count,
                len: self.capacity,
            });
        }
        self.len = count;
        self.state = VectorState::Finalized;
        debug!(element_type = %self.element_type, len = count, capacity = self.capacity, "finalized column vector");
        Ok(())
    }

    pub(crate) fn set_scale(&mut self, scale: i8) {
        self.scale = Some(scale);
    }

    pub(crate) fn values_buffer(&self) -> Result<&MutableBuffer> {
        self.values
            .as_ref()
            .map(BufferHandle::buffer)
            .ok_or(Error::InvalidVectorState {
                state: self.state,
                operation: "access",
            })
    }

    pub(crate) fn values_buffer_mut(&mut self) -> Result<&mut MutableBuffer> {
        let state = self.state;
        self.values
            .as_mut()
            .map(BufferHandle::buffer_mut)
            .ok_or(Error::InvalidVectorState {
                state,
                operation: "access",
            })
    }

    /// Bytes of the string heap in use.
    pub(crate) fn heap_bytes(&self) -> Result<&[u8]> {
        self.heap
            .as_ref()
            .map(|heap| &heap.as_slice()[..self.heap_len])
            .ok_or(Error::UnsupportedElementType(self.element_type))
    }

    /// Makes room for `additional` more bytes on the string heap. On failure nothing changes.
    pub(crate) fn reserve_heap(&mut self, additional: usize) -> Result<()> {
        let needed = self.heap_len.saturating_add(additional);
        let growth_factor = self.growth_factor;
        let heap = self
            .heap
            .as_mut()
            .ok_or(Error::UnsupportedElementType(self.element_type))?;
        if needed > heap.len() {
            let new_size = heap
                .len()
                .saturating_mul(growth_factor)
                .min(MAX_BUFFER_SIZE)
                .max(needed);
            grow_buffer(self.manager.as_deref(), heap, new_size)?;
        }
        Ok(())
    }

    /// Appends `bytes` to the string heap, growing it if needed, and returns their offset.
    pub(crate) fn push_heap(&mut self, bytes: &[u8]) -> Result<usize> {
        self.reserve_heap(bytes.len())?;
        let offset = self.heap_len;
        let end = offset + bytes.len();
        let heap = self
            .heap
            .as_mut()
            .ok_or(Error::UnsupportedElementType(self.element_type))?;
        heap.as_slice_mut()[offset..end].copy_from_slice(bytes);
        self.heap_len = end;
        Ok(offset)
    }

    /// Overwrites heap bytes that are already in use, starting at `offset`.
    pub(crate) fn overwrite_heap(&mut self, offset: usize, bytes: &[u8]) -> Result<()> {
        let end = offset + bytes.len();
        if end > self.heap_len {
            return Err(Error::IndexOutOfBounds {
                index: end,
                len: self.heap_len,
            });
        }
        let heap = self
            .heap
            .as_mut()
            .ok_or(Error::UnsupportedElementType(self.element_type))?;
        heap.as_slice_mut()[offset..end].copy_from_slice(bytes);
        Ok(())
    }

    pub(crate) fn is_bit_set(&self, index: usize) -> Result<bool> {
        Ok(bit_util::get_bit(self.values_buffer()?.as_slice(), index))
    }
}

impl Drop for ColumnVector {
    fn drop(&mut self) {
        self.release_buffers();
    }
}

impl fmt::Debug for ColumnVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnVector")
            .field("element_type", &self.element_type)
            .field("state", &self.state)
            .field("capacity", &self.capacity)
            .field("cursor", &self.cursor)
            .field("len", &self.len)
            .field("scale", &self.scale)
            .finish()
    }
}

/// Size of the values buffer for `capacity` elements, failing past [`MAX_BUFFER_SIZE`].
fn values_bytes(element_type: ElementType, capacity: usize) -> Result<usize> {
    let size = match element_type.layout() {
        ElementLayout::Bit => Some(capacity.div_ceil(8)),
        ElementLayout::Fixed { width } => capacity.checked_mul(width),
        ElementLayout::Variable { .. } => capacity.checked_mul(SLOT_WIDTH),
        ElementLayout::Unsized => Some(0),
    };
    match size {
        Some(size) if size <= MAX_BUFFER_SIZE => Ok(size),
        _ => Err(Error::AllocationFailed {
            requested: size.unwrap_or(usize::MAX),
            available: MAX_BUFFER_SIZE,
        }),
    }
}

fn alloc_buffer(manager: Option<&dyn BufferManager>, size: usize) -> Result<BufferHandle> {
    match manager {
        Some(manager) => manager.allocate(size),
        None => BufferHandle::unmanaged(size),
    }
}

fn grow_buffer(
    manager: Option<&dyn BufferManager>,
    handle: &mut BufferHandle,
    new_size: usize,
) -> Result<()> {
    match manager {
        Some(manager) => manager.grow(handle, new_size),
        None => handle.resize(new_size),
    }
}

fn free_buffer(manager: Option<&dyn BufferManager>, handle: BufferHandle) {
    if let Some(manager) = manager {
        manager.release(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tracked(limit: Option<usize>) -> (Arc<TrackingBufferManager>, VectorOptions) {
        let manager = Arc::new(TrackingBufferManager::new(limit));
        let options = VectorOptions::default().with_manager(manager.clone());
        (manager, options)
    }

    #[test]
    #[allow(clippy::approx_constant)]
    fn test_growth_preserves_written_values() -> Result<()> {
        let mut vector = ColumnVector::allocate(ElementType::Double, 1, &VectorOptions::default())?;
        assert_eq!(vector.capacity(), 1);

        vector.write_at(0, &Scalar::Float64(Some(3.14)).into())?;
        vector.write_at(5, &Scalar::Float64(Some(2.71)).into())?;
        vector.finalize(6)?;

        assert!(vector.capacity() >= 6);
        assert_eq!(vector.get(0)?, Scalar::Float64(Some(3.14)));
        assert_eq!(vector.get(5)?, Scalar::Float64(Some(2.71)));
        assert_eq!(vector.get(3)?, Scalar::Float64(Some(0.0)));
        Ok(())
    }

    #[test]
    fn test_zero_request_allocates_one_slot() -> Result<()> {
        let vector = ColumnVector::allocate(ElementType::Int, 0, &VectorOptions::default())?;
        assert_eq!(vector.capacity(), 1);
        assert_eq!(vector.state(), VectorState::Allocated);
        assert!(vector.is_empty());
        Ok(())
    }

    #[test]
    fn test_growth_uses_factor() -> Result<()> {
        let mut vector = ColumnVector::allocate(ElementType::Int, 4, &VectorOptions::default())?;
        vector.write_at(4, &Scalar::Int32(Some(1)).into())?;
        assert_eq!(vector.capacity(), 8);
        vector.write_at(100, &Scalar::Int32(Some(1)).into())?;
        assert_eq!(vector.capacity(), 101);
        assert_eq!(vector.cursor(), 101);
        Ok(())
    }

    #[test]
    fn test_no_writes_after_finalize() -> Result<()> {
        let mut vector = ColumnVector::allocate(ElementType::Int, 2, &VectorOptions::default())?;
        vector.write_at(0, &Scalar::Int32(Some(7)).into())?;
        vector.finalize(1)?;

        let err = vector.write_at(1, &Scalar::Int32(Some(8)).into()).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidVectorState {
                state: VectorState::Finalized,
                ..
            }
        ));
        assert!(vector.finalize(1).is_err());
        assert_eq!(vector.values()?, vec![Scalar::Int32(Some(7))]);
        Ok(())
    }

    #[test]
    fn test_string_into_finalized_int_vector() -> Result<()> {
        let mut vector = ColumnVector::allocate(ElementType::Int, 2, &VectorOptions::default())?;
        vector.write_at(0, &Scalar::Int32(Some(1)).into())?;
        vector.write_at(1, &Scalar::Int32(Some(2)).into())?;
        vector.finalize(2)?;

        let err = vector
            .write_at(0, &Scalar::Utf8(Some("x".to_string())).into())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidElementValue {
                expected: ElementType::Int,
                ..
            }
        ));
        assert_eq!(
            vector.values()?,
            vec![Scalar::Int32(Some(1)), Scalar::Int32(Some(2))]
        );
        Ok(())
    }

    #[test]
    fn test_read_past_length() -> Result<()> {
        let mut vector = ColumnVector::allocate(ElementType::BigInt, 4, &VectorOptions::default())?;
        vector.write_at(0, &Scalar::Int64(Some(1)).into())?;
        vector.finalize(1)?;
        assert!(matches!(
            vector.get(1),
            Err(Error::IndexOutOfBounds { index: 1, len: 1 })
        ));
        Ok(())
    }

    #[test]
    fn test_release_returns_memory() -> Result<()> {
        let (manager, options) = tracked(None);
        let mut vector = ColumnVector::allocate(ElementType::Utf8, 4, &options)?;
        assert_eq!(manager.live_buffers(), 2);
        assert_eq!(manager.allocated_bytes(), 4 * SLOT_WIDTH + 4 * 32);

        vector.write_at(0, &Scalar::Utf8(Some("a".repeat(200))).into())?;
        vector.finalize(1)?;
        assert!(manager.allocated_bytes() > 4 * SLOT_WIDTH + 4 * 32);

        vector.release();
        assert_eq!(manager.live_buffers(), 0);
        assert_eq!(manager.allocated_bytes(), 0);
        Ok(())
    }

    #[test]
    fn test_drop_releases_cancelled_build() -> Result<()> {
        let (manager, options) = tracked(None);
        {
            let mut vector = ColumnVector::allocate(ElementType::Int, 8, &options)?;
            vector.write_at(3, &Scalar::Int32(Some(3)).into())?;
        }
        assert_eq!(manager.live_buffers(), 0);
        assert_eq!(manager.allocated_bytes(), 0);
        Ok(())
    }

    #[test]
    fn test_failed_growth_leaves_vector_unchanged() -> Result<()> {
        let (manager, options) = tracked(Some(64));
        let mut vector = ColumnVector::allocate(ElementType::BigInt, 4, &options)?;
        vector.write_at(1, &Scalar::Int64(Some(9)).into())?;

        let err = vector.write_at(100, &Scalar::Int64(Some(1)).into()).unwrap_err();
        assert!(matches!(err, Error::AllocationFailed { .. }));
        assert_eq!(vector.capacity(), 4);
        assert_eq!(vector.cursor(), 2);
        assert_eq!(vector.state(), VectorState::Writing);
        assert_eq!(vector.get(1)?, Scalar::Int64(Some(9)));
        assert_eq!(manager.allocated_bytes(), 32);
        Ok(())
    }

    #[test]
    fn test_unsatisfiable_growth_reports_allocation_failure() -> Result<()> {
        let (manager, tracked_options) = tracked(None);
        for options in [VectorOptions::default(), tracked_options] {
            let mut vector = ColumnVector::allocate(ElementType::Double, 1, &options)?;
            vector.write_at(0, &Scalar::Float64(Some(1.0)).into())?;
            for index in [usize::MAX / 8, usize::MAX / 16, usize::MAX] {
                let err = vector
                    .write_at(index, &Scalar::Float64(Some(1.0)).into())
                    .unwrap_err();
                assert!(matches!(err, Error::AllocationFailed { .. }));
            }
            assert_eq!(vector.capacity(), 1);
            assert_eq!(vector.get(0)?, Scalar::Float64(Some(1.0)));
        }
        assert_eq!(manager.allocated_bytes(), 0);

        let mut bits = ColumnVector::allocate(ElementType::Boolean, 1, &VectorOptions::default())?;
        assert!(matches!(
            bits.write_at(usize::MAX, &Scalar::Boolean(Some(true)).into()),
            Err(Error::AllocationFailed { .. })
        ));
        assert!(matches!(
            ColumnVector::allocate(ElementType::BigInt, usize::MAX / 4, &VectorOptions::default()),
            Err(Error::AllocationFailed { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_allocation_over_limit() {
        let (manager, options) = tracked(Some(16));
        let err = ColumnVector::allocate(ElementType::Double, 4, &options).unwrap_err();
        assert!(matches!(
            err,
            Error::AllocationFailed {
                requested: 32,
                available: 16
            }
        ));
        assert_eq!(manager.live_buffers(), 0);
    }

    #[test]
    fn test_string_heap_failure_frees_slot_table() {
        let (manager, options) = tracked(Some(40));
        let err = ColumnVector::allocate(ElementType::Utf8, 2, &options).unwrap_err();
        assert!(matches!(err, Error::AllocationFailed { .. }));
        assert_eq!(manager.allocated_bytes(), 0);
        assert_eq!(manager.live_buffers(), 0);
    }
}
