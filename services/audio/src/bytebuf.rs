//! Single-producer single-consumer byte ring for PCM audio.
//!
//! The ring is sized at construction and never reallocates. One internal
//! slack byte distinguishes full from empty, so `read_available() +
//! write_available() == capacity()` always holds.
//!
//! Role contract (matching how the audio player uses it):
//!
//!  - the producer owns `head`: `prepare_write`, `commit_write` and `write`
//!    may only be called from one thread at a time;
//!  - the consumer owns `tail`: `read` and `skip` must be serialized by the
//!    caller (the player calls them from both the playback callback and,
//!    under the playback lock, from the producer thread).
//!
//! The lockless fast path: a producer that remembers `write_available()`
//! from its previous write may `prepare_write`/`commit_write` up to that
//! many bytes without taking any lock, because the consumer can only grow
//! the writable region, never shrink it.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct ByteBuf {
    data: UnsafeCell<Box<[u8]>>,
    /// data.len(); always capacity + 1.
    alloc_size: usize,
    head: AtomicUsize,
    tail: AtomicUsize,
}

// The SPSC role contract above is what makes the unsynchronized data
// accesses sound: head and tail only ever move forward, each owned by one
// side, and each side only touches bytes the other side cannot reach.
unsafe impl Sync for ByteBuf {}
unsafe impl Send for ByteBuf {}

impl ByteBuf {
    pub fn with_capacity(capacity: usize) -> ByteBuf {
        assert!(capacity > 0);
        ByteBuf {
            data: UnsafeCell::new(vec![0u8; capacity + 1].into_boxed_slice()),
            alloc_size: capacity + 1,
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.alloc_size - 1
    }

    pub fn read_available(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        (head + self.alloc_size - tail) % self.alloc_size
    }

    pub fn write_available(&self) -> usize {
        self.capacity() - self.read_available()
    }

    #[allow(clippy::mut_from_ref)]
    fn slice(&self) -> &mut [u8] {
        unsafe { &mut **self.data.get() }
    }

    /// Consume `dst.len()` bytes. The caller must have checked
    /// `read_available()`.
    pub fn read(&self, dst: &mut [u8]) {
        assert!(dst.len() <= self.read_available());
        let data = self.slice();
        let tail = self.tail.load(Ordering::Acquire);
        let first = dst.len().min(self.alloc_size - tail);
        dst[..first].copy_from_slice(&data[tail..tail + first]);
        if first < dst.len() {
            dst[first..].copy_from_slice(&data[..dst.len() - first]);
        }
        self.tail.store((tail + dst.len()) % self.alloc_size, Ordering::Release);
    }

    /// Drop `len` bytes without copying them out.
    pub fn skip(&self, len: usize) {
        assert!(len <= self.read_available());
        let tail = self.tail.load(Ordering::Acquire);
        self.tail.store((tail + len) % self.alloc_size, Ordering::Release);
    }

    /// Copy `src` into the ring after `head` without publishing it yet.
    /// Valid for up to the `write_available()` the producer last observed.
    pub fn prepare_write(&self, src: &[u8]) {
        assert!(src.len() <= self.write_available());
        let data = self.slice();
        let head = self.head.load(Ordering::Acquire);
        let first = src.len().min(self.alloc_size - head);
        data[head..head + first].copy_from_slice(&src[..first]);
        if first < src.len() {
            data[..src.len() - first].copy_from_slice(&src[first..]);
        }
    }

    /// Publish bytes previously staged by `prepare_write`.
    pub fn commit_write(&self, len: usize) {
        debug_assert!(len <= self.write_available());
        let head = self.head.load(Ordering::Acquire);
        self.head.store((head + len) % self.alloc_size, Ordering::Release);
    }

    pub fn write(&self, src: &[u8]) {
        self.prepare_write(src);
        self.commit_write(src.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct Rng(u64);

    impl Rng {
        fn next(&mut self) -> u64 {
            let mut x = self.0;
            x ^= x >> 12;
            x ^= x << 25;
            x ^= x >> 27;
            self.0 = x;
            x.wrapping_mul(0x2545_F491_4F6C_DD1D)
        }

        fn below(&mut self, max: usize) -> usize {
            if max == 0 { 0 } else { (self.next() % max as u64) as usize }
        }
    }

    #[test]
    fn counters_are_conserved() {
        let buf = ByteBuf::with_capacity(20);
        assert_eq!(buf.capacity(), 20);
        assert_eq!(buf.write_available(), 20);
        buf.write(&[1; 7]);
        assert_eq!(buf.read_available(), 7);
        assert_eq!(buf.write_available(), 13);
        buf.skip(3);
        assert_eq!(buf.read_available() + buf.write_available(), 20);
    }

    #[test]
    fn read_stream_equals_write_stream() {
        // Model-based fuzz against a simple FIFO, small capacity to force
        // wraparound constantly.
        let buf = ByteBuf::with_capacity(17);
        let mut model = std::collections::VecDeque::new();
        let mut rng = Rng(0x1234_5678_9ABC_DEF0);
        let mut next_value = 0u8;

        for _ in 0..100_000 {
            if rng.next() % 2 == 0 {
                let n = rng.below(buf.write_available() + 1);
                let chunk: Vec<u8> = (0..n)
                    .map(|_| {
                        next_value = next_value.wrapping_add(1);
                        next_value
                    })
                    .collect();
                buf.write(&chunk);
                model.extend(chunk);
            } else {
                let n = rng.below(buf.read_available() + 1);
                let mut out = vec![0u8; n];
                buf.read(&mut out);
                for byte in out {
                    assert_eq!(byte, model.pop_front().unwrap());
                }
            }
            assert!(buf.read_available() <= buf.capacity());
            assert_eq!(buf.read_available(), model.len());
        }
    }

    #[test]
    fn prepare_then_commit_publishes_once() {
        let buf = ByteBuf::with_capacity(8);
        buf.prepare_write(&[1, 2, 3]);
        assert_eq!(buf.read_available(), 0);
        buf.commit_write(3);
        assert_eq!(buf.read_available(), 3);
        let mut out = [0u8; 3];
        buf.read(&mut out);
        assert_eq!(out, [1, 2, 3]);
    }

    #[test]
    fn wraparound_is_transparent() {
        let buf = ByteBuf::with_capacity(4);
        buf.write(&[1, 2, 3]);
        let mut out = [0u8; 2];
        buf.read(&mut out);
        buf.write(&[4, 5, 6]); // wraps past the end
        let mut out = [0u8; 4];
        buf.read(&mut out);
        assert_eq!(out, [3, 4, 5, 6]);
    }

    #[test]
    fn spsc_threads_preserve_order() {
        let buf = Arc::new(ByteBuf::with_capacity(64));
        const N: usize = 100_000;

        let producer = {
            let buf = Arc::clone(&buf);
            std::thread::spawn(move || {
                let mut sent = 0usize;
                while sent < N {
                    let avail = buf.write_available();
                    if avail == 0 {
                        std::thread::yield_now();
                        continue;
                    }
                    let n = avail.min(N - sent).min(13);
                    let chunk: Vec<u8> = (sent..sent + n).map(|i| i as u8).collect();
                    buf.write(&chunk);
                    sent += n;
                }
            })
        };

        let mut received = 0usize;
        while received < N {
            let avail = buf.read_available();
            if avail == 0 {
                std::thread::yield_now();
                continue;
            }
            let mut out = vec![0u8; avail.min(N - received)];
            buf.read(&mut out);
            for byte in out {
                assert_eq!(byte, received as u8);
                received += 1;
            }
        }
        producer.join().unwrap();
    }
}
