use core::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

/// Drive two futures from the same task until both have an output.
///
/// Used to run a [`CaptureProducer`](crate::capture::CaptureProducer) side by
/// side with the matching consumer without an executor.
pub fn join<A: Future, B: Future>(a: A, b: B) -> Join<A, B> {
    Join {
        a: Slot::Running(a),
        b: Slot::Running(b),
    }
}

enum Slot<F: Future> {
    Running(F),
    Done(F::Output),
    Taken,
}

impl<F: Future> Slot<F> {
    /// Returns `true` once the output is available.
    ///
    /// # Safety
    /// `self` must be pinned.
    unsafe fn poll(&mut self, cx: &mut Context<'_>) -> bool {
        if let Slot::Running(f) = self {
            match Pin::new_unchecked(f).poll(cx) {
                Poll::Ready(output) => *self = Slot::Done(output),
                Poll::Pending => return false,
            }
        }
        matches!(self, Slot::Done(_))
    }

    fn take(&mut self) -> Option<F::Output> {
        match core::mem::replace(self, Slot::Taken) {
            Slot::Done(output) => Some(output),
            _ => None,
        }
    }
}

pub struct Join<A: Future, B: Future> {
    a: Slot<A>,
    b: Slot<B>,
}

impl<A: Future, B: Future> Future for Join<A, B> {
    type Output = (A::Output, B::Output);

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // Safety: neither slot is moved out of the pinned struct while running
        let this = unsafe { self.get_unchecked_mut() };
        let a_done = unsafe { this.a.poll(cx) };
        let b_done = unsafe { this.b.poll(cx) };

        if !(a_done && b_done) {
            return Poll::Pending;
        }

        match (this.a.take(), this.b.take()) {
            (Some(a), Some(b)) => Poll::Ready((a, b)),
            _ => panic!("Join polled after completion"),
        }
    }
}

#[cfg(test)]
mod tests {
    use core::future::poll_fn;
    use core::task::Poll;

    use pollster::FutureExt as _;

    use super::join;
    use crate::sync::yield_now::yield_now;

    fn pending_for(mut polls: usize) -> impl core::future::Future<Output = usize> {
        let total = polls;
        poll_fn(move |cx| {
            if polls == 0 {
                Poll::Ready(total)
            } else {
                polls -= 1;
                cx.waker().wake_by_ref();
                Poll::Pending
            }
        })
    }

    #[test]
    fn both_ready() {
        assert_eq!(join(async { 'H' }, async { 4u8 }).block_on(), ('H', 4));
    }

    #[test]
    fn waits_for_the_slower_side() {
        assert_eq!(join(pending_for(7), pending_for(0)).block_on(), (7, 0));
        assert_eq!(join(pending_for(0), pending_for(12)).block_on(), (0, 12));
    }

    #[test]
    fn sides_interleave() {
        let log = core::cell::RefCell::new(std::vec::Vec::new());
        let side = |name: char| {
            let log = &log;
            async move {
                for _ in 0..2 {
                    log.borrow_mut().push(name);
                    yield_now().await;
                }
            }
        };

        join(side('a'), side('b')).block_on();
        assert_eq!(*log.borrow(), ['a', 'b', 'a', 'b']);
    }
}
