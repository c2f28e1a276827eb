// Bounded lock-free MPSC ring for the event queue
//
// Slot-sequence design: each cell carries a sequence stamp that encodes
// whether it is free for the current producer lap or holds a published
// element for the consumer. Producers claim cells by CAS on the tail;
// a full ring is reported to the caller instead of overwriting.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Cache-aligned wrapper to prevent false sharing
#[repr(align(64))]
struct CacheAligned<T>(T);

struct Cell<T> {
    seq: AtomicUsize,
    slot: UnsafeCell<MaybeUninit<T>>,
}

/// Lock-free multiple-producer single-consumer bounded ring.
///
/// Capacity is rounded up to a power of two. `try_push` fails cleanly on a
/// full ring; blocking and wakeups are layered on top by the owning queue.
pub(crate) struct MpscRing<T> {
    cells: Box<[Cell<T>]>,
    mask: usize,
    head: CacheAligned<AtomicUsize>,
    tail: CacheAligned<AtomicUsize>,
}

// SAFETY: MpscRing is Sync because:
// - Producers coordinate via CAS on tail; a claimed cell is owned by exactly
//   one producer until its seq is published with Release.
// - Only one thread pops (guaranteed by the consumer worker); the Acquire
//   load of seq synchronizes with the producer's publish.
unsafe impl<T: Send> Sync for MpscRing<T> {}
unsafe impl<T: Send> Send for MpscRing<T> {}

impl<T> MpscRing<T> {
    /// Create a ring with at least `capacity` slots (rounded up to a power
    /// of two, minimum 1).
    pub fn new(capacity: usize) -> Self {
        let cap = capacity.max(1).next_power_of_two();
        let cells: Vec<Cell<T>> = (0..cap)
            .map(|i| Cell {
                seq: AtomicUsize::new(i),
                slot: UnsafeCell::new(MaybeUninit::uninit()),
            })
            .collect();

        Self {
            cells: cells.into_boxed_slice(),
            mask: cap - 1,
            head: CacheAligned(AtomicUsize::new(0)),
            tail: CacheAligned(AtomicUsize::new(0)),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.mask + 1
    }

    /// Push one element (lock-free, any producer thread).
    ///
    /// Returns the element back when the ring is full.
    pub fn try_push(&self, value: T) -> Result<(), T> {
        let mut pos = self.tail.0.load(Ordering::Relaxed);
        loop {
            let cell = &self.cells[pos & self.mask];
            let seq = cell.seq.load(Ordering::Acquire);
            let diff = seq.wrapping_sub(pos) as isize;

            if diff == 0 {
                // Cell is writable this lap; claim it.
                match self.tail.0.compare_exchange_weak(
                    pos,
                    pos.wrapping_add(1),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        // SAFETY: the successful CAS hands this producer
                        // exclusive ownership of the cell until the seq
                        // publish below makes it visible to the consumer.
                        unsafe { (*cell.slot.get()).write(value) };
                        cell.seq.store(pos.wrapping_add(1), Ordering::Release);
                        return Ok(());
                    }
                    Err(current) => pos = current,
                }
            } else if diff < 0 {
                return Err(value); // full
            } else {
                // Another producer raced ahead of our stale tail.
                pos = self.tail.0.load(Ordering::Relaxed);
            }
        }
    }

    /// Pop one element (single consumer).
    pub fn try_pop(&self) -> Option<T> {
        let mut pos = self.head.0.load(Ordering::Relaxed);
        loop {
            let cell = &self.cells[pos & self.mask];
            let seq = cell.seq.load(Ordering::Acquire);
            let diff = seq.wrapping_sub(pos.wrapping_add(1)) as isize;

            if diff == 0 {
                match self.head.0.compare_exchange_weak(
                    pos,
                    pos.wrapping_add(1),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        // SAFETY: seq == pos + 1 means a producer finished
                        // publishing this cell (Acquire above pairs with its
                        // Release), and the CAS makes us its sole reader.
                        let value = unsafe { (*cell.slot.get()).assume_init_read() };
                        // Mark the slot reusable on the next producer lap.
                        cell.seq
                            .store(pos.wrapping_add(self.capacity()), Ordering::Release);
                        return Some(value);
                    }
                    Err(current) => pos = current,
                }
            } else if diff < 0 {
                return None; // empty
            } else {
                pos = self.head.0.load(Ordering::Relaxed);
            }
        }
    }

    /// Pop up to `max` elements into `out`, returning how many were moved.
    pub fn pop_batch(&self, out: &mut Vec<T>, max: usize) -> usize {
        let mut n = 0;
        while n < max {
            match self.try_pop() {
                Some(v) => {
                    out.push(v);
                    n += 1;
                }
                None => break,
            }
        }
        n
    }

    /// Approximate occupancy (may transiently include claimed-but-unpublished
    /// slots).
    pub fn len_relaxed(&self) -> usize {
        let tail = self.tail.0.load(Ordering::Relaxed);
        let head = self.head.0.load(Ordering::Relaxed);
        tail.wrapping_sub(head).min(self.capacity())
    }
}

impl<T> Drop for MpscRing<T> {
    fn drop(&mut self) {
        // Destroy any elements still in flight.
        while self.try_pop().is_some() {}
    }
}
