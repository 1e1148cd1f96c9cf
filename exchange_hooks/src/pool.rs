//! Fixed-size receive buffers shared across connections.
//!
//! A [`PooledBuffer`] is checked out for one operation and goes back to its
//! pool when freed or dropped. Once returned, the pool hands the same memory
//! to the next caller, so anything that outlives the operation must copy the
//! bytes out first (see [`merge_buffers`]).

use bytes::{BufMut, Bytes, BytesMut};
use std::ops::Deref;
use std::sync::{Arc, Mutex};

pub const DEFAULT_BUFFER_SIZE: usize = 16 * 1024;
pub const DEFAULT_MAX_POOLED: usize = 64;

#[derive(Debug)]
pub struct ByteBufferPool {
    buffer_size: usize,
    max_pooled: usize,
    free: Mutex<Vec<BytesMut>>,
}

impl ByteBufferPool {
    pub fn new(buffer_size: usize, max_pooled: usize) -> Arc<Self> {
        Arc::new(ByteBufferPool {
            buffer_size: buffer_size.max(1),
            max_pooled,
            free: Mutex::new(Vec::with_capacity(max_pooled)),
        })
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Number of buffers sitting in the free list.
    pub fn available(&self) -> usize {
        self.free.lock().map(|free| free.len()).unwrap_or(0)
    }

    pub fn allocate(self: &Arc<Self>) -> PooledBuffer {
        let reused = self.free.lock().ok().and_then(|mut free| free.pop());
        let buffer = reused.unwrap_or_else(|| BytesMut::with_capacity(self.buffer_size));
        PooledBuffer {
            buffer: Some(buffer),
            pool: self.clone(),
        }
    }

    /// Splits `data` across as many pooled buffers as it takes.
    pub fn fill(self: &Arc<Self>, data: &[u8]) -> Pooled<Vec<PooledBuffer>> {
        let buffers = data
            .chunks(self.buffer_size)
            .map(|chunk| {
                let mut buffer = self.allocate();
                buffer.put_slice(chunk);
                buffer
            })
            .collect();
        Pooled::new(buffers)
    }

    fn release(&self, mut buffer: BytesMut) {
        buffer.clear();
        if let Ok(mut free) = self.free.lock() {
            if free.len() < self.max_pooled {
                free.push(buffer);
            }
        }
    }
}

pub struct PooledBuffer {
    buffer: Option<BytesMut>,
    pool: Arc<ByteBufferPool>,
}

impl PooledBuffer {
    /// Writes as much of `data` as still fits and returns the number of bytes written.
    pub fn put_slice(&mut self, data: &[u8]) -> usize {
        let capacity = self.pool.buffer_size;
        match self.buffer.as_mut() {
            Some(buffer) => {
                let len = data.len().min(capacity.saturating_sub(buffer.len()));
                buffer.put_slice(&data[..len]);
                len
            }
            None => 0,
        }
    }

    pub fn free(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            self.pool.release(buffer);
        }
    }
}

impl Deref for PooledBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.buffer.as_deref().unwrap_or(&[])
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        self.release();
    }
}

/// A resource borrowed from a pool. `free` hands it back and consumes the handle.
pub struct Pooled<T: Release> {
    resource: T,
}

pub trait Release {
    fn release(self);
}

impl Release for Vec<PooledBuffer> {
    fn release(self) {
        self.into_iter().for_each(PooledBuffer::free);
    }
}

impl<T: Release> Pooled<T> {
    pub fn new(resource: T) -> Self {
        Pooled { resource }
    }

    pub fn resource(&self) -> &T {
        &self.resource
    }

    pub fn free(self) {
        self.resource.release();
    }
}

/// Copies the contents of `buffers` into one independently owned buffer.
pub fn merge_buffers(buffers: &[PooledBuffer]) -> Bytes {
    let total = buffers.iter().map(|buffer| buffer.len()).sum::<usize>();
    let mut merged = BytesMut::with_capacity(total);
    buffers.iter().for_each(|buffer| merged.put_slice(buffer));
    merged.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freed_buffers_return_to_the_pool() {
        let pool = ByteBufferPool::new(8, 4);
        let first = pool.allocate();
        let second = pool.allocate();
        assert_eq!(pool.available(), 0);
        first.free();
        drop(second);
        assert_eq!(pool.available(), 2);
    }

    #[test]
    fn free_list_is_bounded() {
        let pool = ByteBufferPool::new(8, 1);
        let buffers = vec![pool.allocate(), pool.allocate(), pool.allocate()];
        Pooled::new(buffers).free();
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn fill_splits_by_buffer_size() {
        let pool = ByteBufferPool::new(4, 8);
        let pooled = pool.fill(b"0123456789");
        let lengths: Vec<usize> = pooled.resource().iter().map(|b| b.len()).collect();
        assert_eq!(lengths, vec![4, 4, 2]);
        assert_eq!(&merge_buffers(pooled.resource())[..], b"0123456789");
        pooled.free();
        assert_eq!(pool.available(), 3);
    }

    #[test]
    fn put_slice_stops_at_capacity() {
        let pool = ByteBufferPool::new(3, 1);
        let mut buffer = pool.allocate();
        assert_eq!(buffer.put_slice(b"abcdef"), 3);
        assert_eq!(buffer.put_slice(b"g"), 0);
        assert_eq!(&buffer[..], b"abc");
    }

    #[test]
    fn reused_buffers_start_empty() {
        let pool = ByteBufferPool::new(8, 1);
        let mut buffer = pool.allocate();
        buffer.put_slice(b"stale");
        buffer.free();
        assert!(pool.allocate().is_empty());
    }
}
