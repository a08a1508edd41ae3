use core::cell::{RefCell, UnsafeCell};
use core::fmt::Write;
use core::future::poll_fn;
use core::ops::Deref;
use core::task::{Poll, Waker};

use critical_section::Mutex;
use heapless::Deque;

use super::{encode_line, CaptureBuffer, FrameKind, LineFormat};
use crate::{Error, Result};

/// Who owns a buffer slot.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SlotState {
    /// In the free list, contents undefined.
    Free,
    /// Being filled by the producer.
    Producer,
    /// Waiting in the ready queue, must not be touched.
    Queued,
    /// Being rendered by the consumer.
    Consumer,
}

struct PoolState<const N: usize> {
    free: Deque<usize, N>,
    ready: Deque<usize, N>,
    slots: [SlotState; N],
    waker: Option<Waker>,
    dropped: u32,
}

impl<const N: usize> PoolState<N> {
    fn new() -> Self {
        let mut free = Deque::new();
        for index in 0..N {
            // The free list has room for every slot.
            let _ = free.push_back(index);
        }

        Self {
            free,
            ready: Deque::new(),
            slots: [SlotState::Free; N],
            waker: None,
            dropped: 0,
        }
    }

    fn transition(&mut self, index: usize, from: SlotState, to: SlotState) {
        debug_assert_eq!(self.slots[index], from, "invalid transition of slot {}", index);
        self.slots[index] = to;
    }
}

/// A fixed arena of `N` capture buffers of `CAP` bytes each.
///
/// Buffers are referred to by their index. The free list and the ready queue
/// both hold at most `N` indices, so queueing a buffer that was successfully
/// taken from the free list can not fail. The pool never grows: when all
/// buffers are taken, new frames are dropped and counted.
pub struct BufferPool<const N: usize, const CAP: usize> {
    buffers: [UnsafeCell<CaptureBuffer<CAP>>; N],
    state: Mutex<RefCell<PoolState<N>>>,
}

// Safety: the queues are only touched inside a critical section. A buffer is
// only dereferenced by the single owner recorded in its slot state, which is
// either the unique producer or the unique consumer handed out by `split`.
unsafe impl<const N: usize, const CAP: usize> Sync for BufferPool<N, CAP> {}

impl<const N: usize, const CAP: usize> Default for BufferPool<N, CAP> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize, const CAP: usize> BufferPool<N, CAP> {
    pub fn new() -> Self {
        Self {
            buffers: core::array::from_fn(|_| UnsafeCell::new(CaptureBuffer::new())),
            state: Mutex::new(RefCell::new(PoolState::new())),
        }
    }

    /// Split the pool in its producer and consumer halves. The pool is reset
    /// first, any frame still queued from a previous split is discarded.
    pub fn split(&mut self) -> (CaptureProducer<'_, N, CAP>, CaptureConsumer<'_, N, CAP>) {
        *self = Self::new(); // We have exclusive access here
        (CaptureProducer { pool: self }, CaptureConsumer { pool: self })
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of frames dropped because no buffer was free.
    pub fn dropped(&self) -> u32 {
        critical_section::with(|cs| self.state.borrow_ref(cs).dropped)
    }

    pub fn free_count(&self) -> usize {
        critical_section::with(|cs| self.state.borrow_ref(cs).free.len())
    }

    pub fn queued_count(&self) -> usize {
        critical_section::with(|cs| self.state.borrow_ref(cs).ready.len())
    }

    pub fn slot_state(&self, index: usize) -> Option<SlotState> {
        critical_section::with(|cs| self.state.borrow_ref(cs).slots.get(index).copied())
    }

    fn acquire(&self) -> Option<usize> {
        critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            match state.free.pop_front() {
                Some(index) => {
                    state.transition(index, SlotState::Free, SlotState::Producer);
                    Some(index)
                }
                None => {
                    state.dropped = state.dropped.wrapping_add(1);
                    None
                }
            }
        })
    }

    fn count_drop(&self) {
        critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            state.dropped = state.dropped.wrapping_add(1);
        })
    }

    fn enqueue(&self, index: usize) {
        let waker = critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            state.transition(index, SlotState::Producer, SlotState::Queued);
            let queued = state.ready.push_back(index);
            debug_assert!(queued.is_ok(), "ready queue can hold every slot");
            state.waker.take()
        });

        // Wake outside of the critical section
        if let Some(waker) = waker {
            waker.wake();
        }
    }

    fn dequeue(&self, waker: Option<&Waker>) -> Option<usize> {
        critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            match state.ready.pop_front() {
                Some(index) => {
                    state.transition(index, SlotState::Queued, SlotState::Consumer);
                    Some(index)
                }
                None => {
                    if let Some(new_waker) = waker {
                        match &mut state.waker {
                            Some(waker) => waker.clone_from(new_waker),
                            waker @ None => *waker = Some(new_waker.clone()),
                        }
                    }
                    None
                }
            }
        })
    }

    fn release(&self, index: usize) {
        critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            state.transition(index, SlotState::Consumer, SlotState::Free);
            let freed = state.free.push_back(index);
            debug_assert!(freed.is_ok(), "free list can hold every slot");
        })
    }
}

/// The capturing half of a [`BufferPool`], used from the PHY event path.
pub struct CaptureProducer<'a, const N: usize, const CAP: usize> {
    pool: &'a BufferPool<N, CAP>,
}

impl<const N: usize, const CAP: usize> CaptureProducer<'_, N, CAP> {
    /// Copy a frame into a free buffer and queue it for the consumer.
    ///
    /// Never blocks and never allocates. The frame is truncated to `CAP`
    /// bytes. When every buffer is in use the frame is dropped and
    /// [`Error::CaptureBufferExhausted`] is returned.
    pub fn capture(&mut self, kind: FrameKind, bytes: &[u8]) -> Result<()> {
        let Some(index) = self.pool.acquire() else {
            return Err(Error::CaptureBufferExhausted);
        };

        // Safety: the slot just left the free list and is owned by the
        // producer until it is queued below.
        let buffer = unsafe { &mut *self.pool.buffers[index].get() };
        buffer.fill(kind, bytes);

        self.pool.enqueue(index);
        Ok(())
    }

    /// Give up on a frame without trying to capture it. It is counted as
    /// dropped.
    pub fn discard(&mut self) {
        self.pool.count_drop();
    }

    pub fn pool(&self) -> &BufferPool<N, CAP> {
        self.pool
    }
}

/// The emitting half of a [`BufferPool`], owned by a single task.
pub struct CaptureConsumer<'a, const N: usize, const CAP: usize> {
    pool: &'a BufferPool<N, CAP>,
}

impl<const N: usize, const CAP: usize> CaptureConsumer<'_, N, CAP> {
    /// Wait for the next queued frame. Frames come out in the order they
    /// were captured.
    pub async fn next(&mut self) -> CapturedFrame<'_, N, CAP> {
        let pool = self.pool;
        let index = poll_fn(|cx| match pool.dequeue(Some(cx.waker())) {
            Some(index) => Poll::Ready(index),
            None => Poll::Pending,
        })
        .await;

        CapturedFrame { pool, index }
    }

    /// Take the next queued frame if there is one.
    pub fn try_next(&mut self) -> Option<CapturedFrame<'_, N, CAP>> {
        let pool = self.pool;
        pool.dequeue(None).map(|index| CapturedFrame { pool, index })
    }

    /// Emit every frame queued right now. Returns how many frames were taken,
    /// including those the sink refused.
    pub fn drain<W: Write>(&mut self, format: LineFormat, sink: &mut W) -> usize {
        let mut count = 0;
        while let Some(frame) = self.try_next() {
            if let Err(e) = frame.emit(format, sink) {
                warn!("Dropping {:?} line: {:?}", frame.kind(), e);
            }
            count += 1;
        }
        count
    }

    /// Emit frames forever. Should run in its own task.
    pub async fn run<W: Write>(&mut self, format: LineFormat, sink: &mut W) -> ! {
        loop {
            let frame = self.next().await;
            if let Err(e) = frame.emit(format, sink) {
                warn!("Dropping {:?} line: {:?}", frame.kind(), e);
            }
        }
    }

    pub fn pool(&self) -> &BufferPool<N, CAP> {
        self.pool
    }
}

/// A frame checked out by the consumer.
///
/// The buffer is cleared and returned to the pool when this is dropped,
/// whatever happened while emitting it.
pub struct CapturedFrame<'a, const N: usize, const CAP: usize> {
    pool: &'a BufferPool<N, CAP>,
    index: usize,
}

impl<const N: usize, const CAP: usize> CapturedFrame<'_, N, CAP> {
    /// Write the frame as one text line, terminated by `\n`.
    pub fn emit<W: Write>(&self, format: LineFormat, sink: &mut W) -> Result<()> {
        encode_line(self.kind(), self.payload(), format, sink)
            .and_then(|_| sink.write_char('\n'))
            .map_err(|_| Error::SinkRejected)
    }
}

impl<const N: usize, const CAP: usize> Deref for CapturedFrame<'_, N, CAP> {
    type Target = CaptureBuffer<CAP>;

    fn deref(&self) -> &Self::Target {
        // Safety: the slot is in the consumer state until this guard drops
        unsafe { &*self.pool.buffers[self.index].get() }
    }
}

impl<const N: usize, const CAP: usize> Drop for CapturedFrame<'_, N, CAP> {
    fn drop(&mut self) {
        // Safety: still owned by the consumer, no other reference is alive
        unsafe { (*self.pool.buffers[self.index].get()).clear() };
        self.pool.release(self.index);
    }
}
