//! Cooperative cancellation shared between the lexer and its consumer.
//!
//! A [`Context`] is a cheap, cloneable handle that reports when work should
//! stop, either because its [`Canceller`] fired or because its deadline
//! passed. Blocking operations in this crate wait on [`Context::done`] and
//! [`Context::expiry`] next to their own channel operation, so a cancelled
//! context always unblocks both the producer and the consumer.

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, Instant},
};

use crossbeam_channel::{Receiver, Sender, TryRecvError};

/// Why a context is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    #[error("context canceled")]
    Canceled,

    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

#[derive(Clone)]
pub struct Context {
    inner: Arc<Inner>,
}

struct Inner {
    // Nothing is ever sent on this channel; it reports done by disconnecting.
    done: Receiver<()>,
    // Held for contexts that can never be cancelled so `done` stays open.
    _never: Option<Sender<()>>,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never done.
    pub fn background() -> Self {
        let (tx, rx) = crossbeam_channel::bounded(0);
        Context {
            inner: Arc::new(Inner {
                done: rx,
                _never: Some(tx),
                deadline: None,
            }),
        }
    }

    /// A context that is done once the returned [`Canceller`] fires or is dropped.
    pub fn with_cancel() -> (Self, Canceller) {
        Self::build(None)
    }

    /// Like [`Context::with_cancel`], and additionally done after `timeout`.
    pub fn with_timeout(timeout: Duration) -> (Self, Canceller) {
        Self::build(Some(Instant::now() + timeout))
    }

    /// Like [`Context::with_cancel`], and additionally done at `deadline`.
    pub fn with_deadline(deadline: Instant) -> (Self, Canceller) {
        Self::build(Some(deadline))
    }

    fn build(deadline: Option<Instant>) -> (Self, Canceller) {
        let (tx, rx) = crossbeam_channel::bounded(0);
        let ctx = Context {
            inner: Arc::new(Inner {
                done: rx,
                _never: None,
                deadline,
            }),
        };
        let canceller = Canceller {
            trigger: Mutex::new(Some(tx)),
        };
        (ctx, canceller)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Receiver that becomes ready (disconnected) on cancellation.
    pub fn done(&self) -> &Receiver<()> {
        &self.inner.done
    }

    /// Receiver that fires when the deadline passes, or never if there is none.
    ///
    /// Each call returns a fresh timer, so use it for a single wait.
    pub fn expiry(&self) -> Receiver<Instant> {
        match self.inner.deadline {
            Some(deadline) => crossbeam_channel::at(deadline),
            None => crossbeam_channel::never(),
        }
    }

    /// Reports why the context is done, or `None` while it is still live.
    pub fn err(&self) -> Option<ContextError> {
        if let Err(TryRecvError::Disconnected) = self.inner.done.try_recv() {
            return Some(ContextError::Canceled);
        }
        match self.inner.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }
}

impl Default for Context {
    fn default() -> Self {
        Context::background()
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("deadline", &self.inner.deadline)
            .field("err", &self.err())
            .finish()
    }
}

/// Cancels the [`Context`] it was created with.
///
/// Cancelling is idempotent and may happen from any thread. Dropping the
/// canceller cancels as well, so keep it alive for as long as the work runs.
#[derive(Debug)]
pub struct Canceller {
    trigger: Mutex<Option<Sender<()>>>,
}

impl Canceller {
    pub fn cancel(&self) {
        let mut trigger = self.trigger.lock().unwrap_or_else(PoisonError::into_inner);
        if trigger.take().is_some() {
            log::debug!("context canceled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_is_never_done() {
        let ctx = Context::background();
        assert!(!ctx.is_done());
        assert_eq!(ctx.err(), None);
        assert!(ctx.deadline().is_none());
    }

    #[test]
    fn test_cancel_is_observed_by_clones() {
        let (ctx, cancel) = Context::with_cancel();
        let clone = ctx.clone();
        assert!(!clone.is_done());

        cancel.cancel();
        assert_eq!(ctx.err(), Some(ContextError::Canceled));
        assert_eq!(clone.err(), Some(ContextError::Canceled));

        // Idempotent
        cancel.cancel();
        assert!(ctx.is_done());
    }

    #[test]
    fn test_dropping_canceller_cancels() {
        let (ctx, cancel) = Context::with_cancel();
        drop(cancel);
        assert_eq!(ctx.err(), Some(ContextError::Canceled));
    }

    #[test]
    fn test_deadline_exceeded() {
        let (ctx, _cancel) = Context::with_deadline(Instant::now());
        assert_eq!(ctx.err(), Some(ContextError::DeadlineExceeded));
        assert!(ctx.expiry().recv().is_ok());
    }

    #[test]
    fn test_timeout_not_yet_expired() {
        let (ctx, _cancel) = Context::with_timeout(Duration::from_secs(3600));
        assert!(!ctx.is_done());
        assert!(ctx.expiry().try_recv().is_err());
    }

    #[test]
    fn test_done_channel_disconnects_on_cancel() {
        let (ctx, cancel) = Context::with_cancel();
        assert_eq!(ctx.done().try_recv(), Err(TryRecvError::Empty));
        cancel.cancel();
        assert_eq!(ctx.done().try_recv(), Err(TryRecvError::Disconnected));
    }
}
