//! Interrupt to main loop event queue.
//!
//! Interrupt handlers (PIR threshold crossing, optical pulse edges, timer
//! compare) must not do more than record what happened. They push onto an
//! [`EventQueue`] and the main loop drains it into the orchestrator.
//!
//! Backed by a `heapless::Deque` behind a `critical-section` mutex, so
//! producers in interrupt context and the consumer in the main loop never
//! observe a half-written queue.

use core::cell::RefCell;

use critical_section::Mutex;
use heapless::Deque;

#[cfg(feature = "esp32-log")]
use esp_println::println;

/// Error returned when pushing onto a full queue.
///
/// Carries the rejected event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFull<E>(pub E);

struct Inner<E, const SIZE: usize> {
    events: Deque<E, SIZE>,
    dropped: u32,
}

/// Bounded event queue shared between interrupt handlers and the main loop
pub struct EventQueue<E, const SIZE: usize> {
    inner: Mutex<RefCell<Inner<E, SIZE>>>,
}

impl<E, const SIZE: usize> EventQueue<E, SIZE> {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Inner {
                events: Deque::new(),
                dropped: 0,
            })),
        }
    }

    /// Producer handle for interrupt handlers
    pub const fn producer(&self) -> Producer<'_, E, SIZE> {
        Producer { queue: self }
    }

    /// Consumer handle for the main loop
    pub const fn consumer(&self) -> Consumer<'_, E, SIZE> {
        Consumer { queue: self }
    }

    /// Queue an event.
    ///
    /// A full queue keeps the older events; the new one is returned and
    /// counted as dropped.
    pub fn push(&self, event: E) -> Result<(), QueueFull<E>> {
        critical_section::with(|cs| {
            let mut inner = self.inner.borrow(cs).borrow_mut();
            match inner.events.push_back(event) {
                Ok(()) => Ok(()),
                Err(event) => {
                    inner.dropped = inner.dropped.saturating_add(1);
                    #[cfg(feature = "esp32-log")]
                    println!("[EventQueue.push] queue full, {} dropped", inner.dropped);
                    Err(QueueFull(event))
                }
            }
        })
    }

    /// Take the oldest event
    pub fn pop(&self) -> Option<E> {
        critical_section::with(|cs| self.inner.borrow(cs).borrow_mut().events.pop_front())
    }

    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.inner.borrow(cs).borrow().events.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of events rejected because the queue was full
    pub fn dropped(&self) -> u32 {
        critical_section::with(|cs| self.inner.borrow(cs).borrow().dropped)
    }

    /// Discard every queued event
    pub fn clear(&self) {
        critical_section::with(|cs| self.inner.borrow(cs).borrow_mut().events.clear());
    }
}

impl<E, const SIZE: usize> Default for EventQueue<E, SIZE> {
    fn default() -> Self {
        Self::new()
    }
}

/// Push side of an [`EventQueue`]
pub struct Producer<'a, E, const SIZE: usize> {
    queue: &'a EventQueue<E, SIZE>,
}

impl<E, const SIZE: usize> Clone for Producer<'_, E, SIZE> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E, const SIZE: usize> Copy for Producer<'_, E, SIZE> {}

impl<E, const SIZE: usize> Producer<'_, E, SIZE> {
    pub fn push(&self, event: E) -> Result<(), QueueFull<E>> {
        self.queue.push(event)
    }
}

/// Pop side of an [`EventQueue`]
pub struct Consumer<'a, E, const SIZE: usize> {
    queue: &'a EventQueue<E, SIZE>,
}

impl<E, const SIZE: usize> Consumer<'_, E, SIZE> {
    pub fn pop(&self) -> Option<E> {
        self.queue.pop()
    }

    pub fn clear(&self) {
        self.queue.clear();
    }

    pub fn dropped(&self) -> u32 {
        self.queue.dropped()
    }
}
