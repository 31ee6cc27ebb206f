//! Single task slot
//!
//! At most one task owns the hardware at a time. Every claim takes a new generation and asks
//! the current owner to stop, then waits until it has let go. Only the newest claim is
//! current: a claim overtaken while it waited for the lock is stale, so a new request always
//! replaces every older one and never runs next to it.

use {
    core::{
        cell::Cell,
        future::Future,
        ops::{Deref, DerefMut},
    },
    embassy_futures::select::{select, Either},
    embassy_sync::{
        blocking_mutex::{raw::RawMutex, Mutex as BlockingMutex},
        mutex::{Mutex, MutexGuard},
        signal::Signal,
    },
};

pub struct TaskSlot<M: RawMutex, T> {
    generation: BlockingMutex<M, Cell<u32>>,
    /// Wakes the owner whenever the generation moves
    wake: Signal<M, ()>,
    resource: Mutex<M, T>,
}

/// Resource held by one claim
pub struct Claim<'a, M: RawMutex, T> {
    guard: MutexGuard<'a, M, T>,
    ticket: u32,
}

impl<M: RawMutex, T> Claim<'_, M, T> {
    /// Generation this claim was taken in
    pub fn ticket(&self) -> u32 {
        self.ticket
    }
}

impl<M: RawMutex, T> Deref for Claim<'_, M, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<M: RawMutex, T> DerefMut for Claim<'_, M, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

impl<M: RawMutex, T> TaskSlot<M, T> {
    pub const fn new(resource: T) -> Self {
        Self {
            generation: BlockingMutex::new(Cell::new(0)),
            wake: Signal::new(),
            resource: Mutex::new(resource),
        }
    }

    /// Cancel the running task and every older claim, then wait for the resource
    pub async fn claim(&self) -> Claim<'_, M, T> {
        let ticket = self.generation.lock(|generation| {
            let next = generation.get().wrapping_add(1);
            generation.set(next);
            next
        });
        self.wake.signal(());

        Claim {
            guard: self.resource.lock().await,
            ticket,
        }
    }

    /// Wait for the running task to finish and take the resource
    pub async fn lock(&self) -> MutexGuard<'_, M, T> {
        self.resource.lock().await
    }

    /// Whether `ticket` is still the newest claim
    pub fn is_current(&self, ticket: u32) -> bool {
        self.generation.lock(|generation| generation.get() == ticket)
    }

    /// Run `task` until it completes or a newer claim is made.
    ///
    /// A stale `ticket` returns `None` without polling `task` at all.
    pub async fn run<F: Future>(&self, ticket: u32, task: F) -> Option<F::Output> {
        if !self.is_current(ticket) {
            return None;
        }

        match select(task, self.superseded(ticket)).await {
            Either::First(output) => Some(output),
            Either::Second(()) => None,
        }
    }

    async fn superseded(&self, ticket: u32) {
        while self.is_current(ticket) {
            self.wake.wait().await;
        }
    }
}
