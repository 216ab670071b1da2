use core::cell::RefCell;

use embassy_sync::blocking_mutex::CriticalSectionMutex;

use crate::config::READING_QUEUE_SIZE;

/// One decoded sample as produced by a mode handler.
///
/// The engine never looks inside a reading, `tag` is free for the mode to
/// use (unit, range, channel, ...).
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reading {
    pub value: i64,
    pub tag: u8,
}

impl Reading {
    pub const EMPTY: Reading = Reading { value: 0, tag: 0 };

    pub const fn new(value: i64, tag: u8) -> Self {
        Reading { value, tag }
    }
}

struct Ring<T, const N: usize> {
    slots: [T; N],
    head: usize,
    tail: usize,
}

impl<T: Copy, const N: usize> Ring<T, N> {
    const MASK: usize = N - 1;

    fn push(&mut self, value: T) -> bool {
        let head = self.head;
        let next = (head + 1) & Self::MASK;
        if next == self.tail {
            return false;
        }

        self.slots[head] = value;
        self.head = next;
        true
    }

    fn pop(&mut self) -> Option<T> {
        let tail = self.tail;
        if self.head == tail {
            return None;
        }

        let value = self.slots[tail];
        self.tail = (tail + 1) & Self::MASK;
        Some(value)
    }

    fn len(&self) -> usize {
        self.head.wrapping_sub(self.tail) & Self::MASK
    }
}

/// Fixed size circular buffer shared between interrupt time producers and
/// main loop consumers.
///
/// Every index update happens inside a critical section that only spans the
/// check and the slot copy, so `push` and `pop` may preempt each other freely.
/// A reading pushed into a full queue is dropped, the producer never waits.
pub struct ReadingQueue<T = Reading, const N: usize = READING_QUEUE_SIZE> {
    ring: CriticalSectionMutex<RefCell<Ring<T, N>>>,
}

impl<const N: usize> ReadingQueue<Reading, N> {
    pub const fn new() -> Self {
        Self::with_fill(Reading::EMPTY)
    }
}

impl<const N: usize> Default for ReadingQueue<Reading, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy, const N: usize> ReadingQueue<T, N> {
    /// Create a queue whose unused slots hold `fill`.
    ///
    /// # Panics
    ///
    /// Fails const evaluation if N is not a power of two of at least 2.
    pub const fn with_fill(fill: T) -> Self {
        assert!(N.is_power_of_two() && N >= 2, "queue size must be a power of 2");

        Self {
            ring: CriticalSectionMutex::new(RefCell::new(Ring {
                slots: [fill; N],
                head: 0,
                tail: 0,
            })),
        }
    }

    /// Number of readings the queue can hold at once.
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    /// Enqueue a reading. Returns `false` and drops it if the queue is full.
    pub fn push(&self, value: T) -> bool {
        self.ring.lock(|ring| ring.borrow_mut().push(value))
    }

    /// Dequeue the oldest reading, if any.
    pub fn pop(&self) -> Option<T> {
        self.ring.lock(|ring| ring.borrow_mut().pop())
    }

    /// Throw away everything buffered.
    pub fn clear(&self) {
        self.ring.lock(|ring| {
            let mut ring = ring.borrow_mut();
            ring.head = 0;
            ring.tail = 0;
        });
    }

    pub fn len(&self) -> usize {
        self.ring.lock(|ring| ring.borrow().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() == N - 1
    }

    /// Next slot to be written.
    pub fn head(&self) -> usize {
        self.ring.lock(|ring| ring.borrow().head)
    }

    /// Next slot to be read.
    pub fn tail(&self) -> usize {
        self.ring.lock(|ring| ring.borrow().tail)
    }
}
