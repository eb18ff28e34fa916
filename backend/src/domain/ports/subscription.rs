//! Push subscriptions handed out by the auth and document ports.
//!
//! A [`Subscription`] yields values in emission order and runs its
//! unsubscribe hook exactly once: when [`Subscription::unsubscribe`] is
//! called or when it is dropped, whichever comes first.

use std::fmt;

use tokio::sync::mpsc;

/// One-shot teardown hook.
pub struct Unsubscribe(Option<Box<dyn FnOnce() + Send>>);

impl Unsubscribe {
    /// Wrap a teardown closure.
    #[must_use]
    pub fn new(hook: impl FnOnce() + Send + 'static) -> Self {
        Self(Some(Box::new(hook)))
    }

    /// Hook with nothing to tear down.
    #[must_use]
    pub fn noop() -> Self {
        Self(None)
    }

    /// Run the hook now.
    pub fn run(mut self) {
        self.fire();
    }

    fn fire(&mut self) {
        if let Some(hook) = self.0.take() {
            hook();
        }
    }
}

impl Drop for Unsubscribe {
    fn drop(&mut self) {
        self.fire();
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Unsubscribe")
            .field(&self.0.as_ref().map(|_| "pending"))
            .finish()
    }
}

/// Stream of pushed values plus its teardown hook.
pub struct Subscription<T> {
    receiver: mpsc::UnboundedReceiver<T>,
    unsubscribe: Unsubscribe,
}

impl<T> Subscription<T> {
    /// Assemble a subscription from a receiver and a teardown hook.
    #[must_use]
    pub fn new(receiver: mpsc::UnboundedReceiver<T>, unsubscribe: Unsubscribe) -> Self {
        Self {
            receiver,
            unsubscribe,
        }
    }

    /// Create a subscription together with the sender that feeds it.
    ///
    /// # Examples
    /// ```
    /// use pocket_heist::domain::ports::{Subscription, Unsubscribe};
    ///
    /// let (tx, mut sub) = Subscription::channel(Unsubscribe::noop());
    /// tx.send(7).unwrap();
    /// assert_eq!(sub.try_next(), Some(7));
    /// ```
    #[must_use]
    pub fn channel(unsubscribe: Unsubscribe) -> (mpsc::UnboundedSender<T>, Self) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (sender, Self::new(receiver, unsubscribe))
    }

    /// Wait for the next value; `None` once the source has gone away.
    pub async fn next(&mut self) -> Option<T> {
        self.receiver.recv().await
    }

    /// Take a value that is already queued.
    pub fn try_next(&mut self) -> Option<T> {
        self.receiver.try_recv().ok()
    }

    /// Stop receiving and run the teardown hook.
    pub fn unsubscribe(self) {
        let Self {
            mut receiver,
            unsubscribe,
        } = self;
        receiver.close();
        unsubscribe.run();
    }
}

impl<T> fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("unsubscribe", &self.unsubscribe)
            .finish_non_exhaustive()
    }
}
