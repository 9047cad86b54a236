//! Fixed size circular sample buffers.

use std::ops::AddAssign;

use crate::Error;

// -------------------------------------------------------------------------------------------------

/// Single threaded circular buffer with independent read and write cursors.
///
/// The capacity must be a power of two, so cursor wraparound is a bit mask instead of a branch.
/// There's no overflow detection: the owner must keep reads and writes balanced. Both cursors
/// are expected to be driven from the same (real-time) thread.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    buffer: Vec<T>,
    buffer_mask: usize,
    read_pos: usize,
    write_pos: usize,
}

impl<T: Copy + Default> RingBuffer<T> {
    /// Create a new, default value filled buffer. Fails when capacity is not a power of two.
    pub fn new(capacity: usize) -> Result<Self, Error> {
        if !capacity.is_power_of_two() {
            return Err(Error::ParameterError(format!(
                "Ring buffer capacity must be a power of two, but is {capacity}"
            )));
        }
        Ok(Self {
            buffer: vec![T::default(); capacity],
            buffer_mask: capacity - 1,
            read_pos: 0,
            write_pos: 0,
        })
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    #[inline(always)]
    pub fn read_pos(&self) -> usize {
        self.read_pos
    }

    #[inline(always)]
    pub fn write_pos(&self) -> usize {
        self.write_pos
    }

    /// Store a value at the write cursor and move the cursor forward.
    #[inline]
    pub fn write(&mut self, value: T) {
        self.buffer[self.write_pos] = value;
        self.write_pos = (self.write_pos + 1) & self.buffer_mask;
    }

    /// Get the value at the read cursor and move the cursor forward.
    #[inline]
    pub fn read(&mut self) -> T {
        let value = self.buffer[self.read_pos];
        self.read_pos = (self.read_pos + 1) & self.buffer_mask;
        value
    }

    /// Like [`Self::read`], but resets the consumed slot to its default value.
    #[inline]
    pub fn take(&mut self) -> T {
        let value = std::mem::take(&mut self.buffer[self.read_pos]);
        self.read_pos = (self.read_pos + 1) & self.buffer_mask;
        value
    }

    /// Peek at the value `offset` slots after the read cursor without consuming it.
    #[inline]
    pub fn peek(&self, offset: usize) -> T {
        self.buffer[(self.read_pos + offset) & self.buffer_mask]
    }

    /// Move the read cursor forward without reading.
    #[inline]
    pub fn skip(&mut self, count: usize) {
        self.read_pos = (self.read_pos + count) & self.buffer_mask;
    }

    /// Move the write cursor forward without writing.
    #[inline]
    pub fn advance(&mut self, count: usize) {
        self.write_pos = (self.write_pos + count) & self.buffer_mask;
    }

    /// Reset all values to their defaults and rewind both cursors.
    pub fn clear(&mut self) {
        self.buffer.fill(T::default());
        self.read_pos = 0;
        self.write_pos = 0;
    }
}

impl<T: Copy + Default + AddAssign> RingBuffer<T> {
    /// Add a value to the slot `offset` slots after the write cursor. Used for overlap-add.
    #[inline]
    pub fn accumulate(&mut self, offset: usize, value: T) {
        self.buffer[(self.write_pos + offset) & self.buffer_mask] += value;
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_back_writes_in_order() -> Result<(), Error> {
        let mut ring = RingBuffer::<f32>::new(8)?;
        for count in 1..=8 {
            let values = (0..count).map(|v| v as f32 * 0.5).collect::<Vec<_>>();
            for value in &values {
                ring.write(*value);
            }
            let read = (0..count).map(|_| ring.read()).collect::<Vec<_>>();
            assert_eq!(values, read);
        }
        Ok(())
    }

    #[test]
    fn wraps_around() -> Result<(), Error> {
        let mut ring = RingBuffer::<i32>::new(4)?;
        for value in 0..6 {
            ring.write(value);
        }
        assert_eq!(ring.write_pos(), 2);
        // oldest two values got overwritten
        ring.skip(2);
        assert_eq!(ring.read(), 2);
        assert_eq!(ring.read(), 3);
        assert_eq!(ring.read(), 4);
        assert_eq!(ring.read(), 5);
        assert_eq!(ring.read_pos(), 2);
        Ok(())
    }

    #[test]
    fn rejects_invalid_capacities() {
        assert!(RingBuffer::<f32>::new(0).is_err());
        assert!(RingBuffer::<f32>::new(3).is_err());
        assert!(RingBuffer::<f32>::new(1000).is_err());
        assert!(RingBuffer::<f32>::new(1).is_ok());
        assert!(RingBuffer::<f32>::new(1024).is_ok());
    }

    #[test]
    fn overlap_add() -> Result<(), Error> {
        let mut ring = RingBuffer::<f32>::new(8)?;
        for offset in 0..4 {
            ring.accumulate(offset, 1.0);
        }
        ring.advance(2);
        for offset in 0..4 {
            ring.accumulate(offset, 1.0);
        }
        let expected = [1.0, 1.0, 2.0, 2.0, 1.0, 1.0, 0.0, 0.0];
        for value in expected {
            assert_eq!(ring.peek(0), value);
            assert_eq!(ring.take(), value);
        }
        // taken slots got cleared
        for _ in 0..8 {
            assert_eq!(ring.read(), 0.0);
        }
        Ok(())
    }
}
