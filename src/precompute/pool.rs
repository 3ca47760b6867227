// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        mpsc, Arc, Mutex, MutexGuard, PoisonError,
    },
    thread::{self, JoinHandle},
};

use log::{debug, info, warn};
use rand_core::OsRng;

use super::{PrecomputeConfig, PrecomputeState, PrecomputeStatus, PrecomputedTriple};
use crate::{group::ModP, Error, Result};

/// A bounded queue of [`PrecomputedTriple`]s filled by one dedicated background thread.
///
/// The worker generates triples for a single public key until the queue holds the requested
/// number of them (`Completed`) or [`Self::stop`] is called (`UserStopped`). Cancellation is
/// checked between triples, and a triple only becomes visible to consumers once it is complete.
/// Consumers drain the queue through [`Self::take_triple`]; an empty queue is not an error, the
/// caller computes the exponentiations itself.
pub struct PrecomputeBufferPool {
    config: PrecomputeConfig,
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

struct Shared {
    queue: Mutex<VecDeque<PrecomputedTriple>>,
    public_key: Mutex<Option<ModP>>,
    state: Mutex<PrecomputeState>,
    queue_size: AtomicUsize,
    stop_requested: AtomicBool,
    // Guards the final-state transition as well, so that no subscriber misses the notification.
    subscribers: Mutex<Vec<mpsc::Sender<PrecomputeStatus>>>,
}

/// A poisoned lock only means another thread panicked while holding it; queue mutations push or
/// pop whole triples, so the data behind it is still consistent.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl PrecomputeBufferPool {
    pub fn new(config: PrecomputeConfig) -> Self {
        Self {
            config,
            shared: Arc::new(Shared {
                queue: Mutex::new(VecDeque::new()),
                public_key: Mutex::new(None),
                state: Mutex::new(PrecomputeState::NotStarted),
                queue_size: AtomicUsize::new(0),
                stop_requested: AtomicBool::new(false),
                subscribers: Mutex::new(Vec::new()),
            }),
            worker: Mutex::new(None),
        }
    }

    /// Spawns the worker, filling the queue with triples for `public_key` up to `queue_size`
    /// (the configured default when `None`, clamped to the configured maximum).
    ///
    /// Triples left over from a previous run are kept if they were generated for the same key
    /// and discarded otherwise. Fails with [`Error::AlreadyExists`] while a worker is running.
    pub fn start(&self, public_key: &ModP, queue_size: Option<usize>) -> Result<()> {
        let queue_size = queue_size
            .unwrap_or(self.config.default_queue_size)
            .min(self.config.max_queue_size);
        if queue_size == 0 {
            return Err(Error::InvalidArgument(
                "the precompute queue size must be positive".to_string(),
            ));
        }

        let mut worker = lock(&self.worker);
        {
            let mut state = lock(&self.shared.state);
            if *state == PrecomputeState::Running {
                return Err(Error::AlreadyExists(
                    "a running precompute worker".to_string(),
                ));
            }
            *state = PrecomputeState::Running;
        }

        // The previous worker, if any, has already published its final state.
        if let Some(previous) = worker.take() {
            if previous.join().is_err() {
                warn!("a previous precompute worker panicked");
            }
        }

        {
            let mut current_key = lock(&self.shared.public_key);
            if current_key.as_ref() != Some(public_key) {
                lock(&self.shared.queue).clear();
                *current_key = Some(*public_key);
            }
        }

        self.shared.queue_size.store(queue_size, Ordering::SeqCst);
        self.shared.stop_requested.store(false, Ordering::SeqCst);

        let shared = Arc::clone(&self.shared);
        let public_key = *public_key;
        let handle = thread::Builder::new()
            .name("precompute".to_string())
            .spawn(move || shared.fill(public_key, queue_size))
            .map_err(|err| {
                *lock(&self.shared.state) = PrecomputeState::NotStarted;
                warn!("failed to spawn the precompute worker: {err}");

                Error::InternalError
            })?;
        *worker = Some(handle);

        info!("started precomputing up to {queue_size} triples");

        Ok(())
    }

    /// Asks the worker to exit after the triple it is computing and waits for it.
    ///
    /// Safe to call from any thread, any number of times; stopping an idle pool does nothing.
    pub fn stop(&self) {
        self.shared.stop_requested.store(true, Ordering::SeqCst);

        if let Some(handle) = lock(&self.worker).take() {
            if handle.join().is_err() {
                warn!("the precompute worker panicked");
            }
        }
    }

    pub fn status(&self) -> PrecomputeStatus {
        self.shared.status()
    }

    /// Returns a channel that receives exactly one status: the final status of the current run,
    /// or of the next one if no run has started. If the latest run already ended, its final
    /// status is delivered immediately.
    pub fn subscribe(&self) -> mpsc::Receiver<PrecomputeStatus> {
        let (sender, receiver) = mpsc::channel();

        let mut subscribers = lock(&self.shared.subscribers);
        let status = self.shared.status();
        if status.state.is_final() {
            // The receiver is still in scope, so the send cannot fail.
            let _ = sender.send(status);
        } else {
            subscribers.push(sender);
        }

        receiver
    }

    /// Dequeues a triple generated for `public_key`, if one is buffered.
    pub fn take_triple(&self, public_key: &ModP) -> Option<PrecomputedTriple> {
        // Held across the pop, so a concurrent `start` cannot re-key the queue in between.
        let current_key = lock(&self.shared.public_key);
        if current_key.as_ref() != Some(public_key) {
            return None;
        }

        let triple = lock(&self.shared.queue).pop_front();
        drop(current_key);

        triple
    }

    pub fn queue_len(&self) -> usize {
        lock(&self.shared.queue).len()
    }

    /// Drops every buffered triple.
    pub fn clear(&self) {
        lock(&self.shared.queue).clear();
    }
}

impl Default for PrecomputeBufferPool {
    fn default() -> Self {
        Self::new(PrecomputeConfig::default())
    }
}

impl Drop for PrecomputeBufferPool {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Shared {
    fn status(&self) -> PrecomputeStatus {
        let state = *lock(&self.state);
        let count = lock(&self.queue).len();
        let queue_size = self.queue_size.load(Ordering::SeqCst);

        let percentage = if queue_size == 0 {
            0.0
        } else {
            count as f64 / queue_size as f64
        };

        PrecomputeStatus {
            state,
            count,
            queue_size,
            percentage,
        }
    }

    /// The worker loop.
    fn fill(&self, public_key: ModP, queue_size: usize) {
        let mut rng = OsRng;
        let mut produced = 0usize;

        let final_state = loop {
            if self.stop_requested.load(Ordering::SeqCst) {
                break PrecomputeState::UserStopped;
            }
            if lock(&self.queue).len() >= queue_size {
                break PrecomputeState::Completed;
            }

            let triple = PrecomputedTriple::generate(&public_key, &mut rng);

            let mut queue = lock(&self.queue);
            if queue.len() < queue_size {
                queue.push_back(triple);
                produced += 1;
            }
        };

        let mut subscribers = lock(&self.subscribers);
        *lock(&self.state) = final_state;

        let status = self.status();
        for subscriber in subscribers.drain(..) {
            if subscriber.send(status).is_err() {
                debug!("a precompute subscriber hung up before completion");
            }
        }

        info!(
            "precompute worker exited as {final_state:?} after producing {produced} triples ({} buffered)",
            status.count
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elgamal::ElGamalKeyPair;
    use std::time::Duration;

    fn pool() -> PrecomputeBufferPool {
        PrecomputeBufferPool::new(PrecomputeConfig {
            max_queue_size: 10,
            default_queue_size: 4,
        })
    }

    #[test]
    fn stopping_immediately_reports_user_stopped() {
        let pool = pool();
        let key_pair = ElGamalKeyPair::random(&mut OsRng);

        pool.start(key_pair.public_key(), Some(10)).unwrap();
        pool.stop();

        let status = pool.status();
        assert_eq!(status.state, PrecomputeState::UserStopped);
        assert!(status.count <= 10);
        assert_eq!(status.queue_size, 10);
    }

    #[test]
    fn running_to_completion_fills_the_queue() {
        let pool = pool();
        let key_pair = ElGamalKeyPair::random(&mut OsRng);
        let completion = pool.subscribe();

        pool.start(key_pair.public_key(), Some(10)).unwrap();

        let notified = completion.recv().unwrap();
        assert_eq!(notified.state, PrecomputeState::Completed);
        // Exactly one notification per subscription.
        assert!(completion.recv_timeout(Duration::from_millis(50)).is_err());

        let status = pool.status();
        assert_eq!(status.state, PrecomputeState::Completed);
        assert_eq!(status.count, 10);
        assert_eq!(status.queue_size, 10);
        assert_eq!(status.percentage, 1.0);
        assert_eq!(pool.queue_len(), 10);

        // Stopping a finished run keeps its final state.
        pool.stop();
        assert_eq!(pool.status().state, PrecomputeState::Completed);
    }

    #[test]
    fn late_subscribers_receive_the_final_status() {
        let pool = pool();
        let key_pair = ElGamalKeyPair::random(&mut OsRng);

        pool.start(key_pair.public_key(), Some(1)).unwrap();
        pool.subscribe().recv().unwrap();

        assert_eq!(
            pool.subscribe().recv().unwrap().state,
            PrecomputeState::Completed
        );
    }

    #[test]
    fn rejects_a_second_concurrent_start() {
        let pool = pool();
        let key_pair = ElGamalKeyPair::random(&mut OsRng);

        pool.start(key_pair.public_key(), Some(10)).unwrap();
        let second = pool.start(key_pair.public_key(), Some(10));
        pool.stop();

        assert!(matches!(second, Err(Error::AlreadyExists(_))));
        assert!(pool.start(key_pair.public_key(), Some(0)).is_err());
    }

    #[test]
    fn hands_out_triples_only_for_the_key_they_were_built_for() {
        let pool = pool();
        let key_pair = ElGamalKeyPair::random(&mut OsRng);
        let other = ElGamalKeyPair::random(&mut OsRng);

        assert!(pool.take_triple(key_pair.public_key()).is_none());

        pool.start(key_pair.public_key(), Some(2)).unwrap();
        pool.subscribe().recv().unwrap();

        assert!(pool.take_triple(other.public_key()).is_none());

        let triple = pool.take_triple(key_pair.public_key()).unwrap();
        assert_eq!(
            triple.pubkey_to_exponent,
            key_pair.public_key().pow(triple.exponent())
        );
        assert_eq!(pool.queue_len(), 1);

        // Restarting for another key discards the stale triple.
        pool.start(other.public_key(), Some(1)).unwrap();
        pool.subscribe().recv().unwrap();
        assert!(pool.take_triple(key_pair.public_key()).is_none());
        assert!(pool.take_triple(other.public_key()).is_some());

        pool.clear();
        assert_eq!(pool.queue_len(), 0);
    }

    #[test]
    fn restarts_for_another_key_never_hand_out_its_triples() {
        let pool = pool();
        let key_pair = ElGamalKeyPair::random(&mut OsRng);
        let other = ElGamalKeyPair::random(&mut OsRng);
        let restarting = AtomicBool::new(true);

        thread::scope(|scope| {
            scope.spawn(|| {
                for round in 0..8 {
                    let public_key = if round % 2 == 0 {
                        other.public_key()
                    } else {
                        key_pair.public_key()
                    };
                    pool.stop();
                    pool.start(public_key, Some(2)).unwrap();
                    thread::sleep(Duration::from_millis(5));
                }
                pool.stop();
                restarting.store(false, Ordering::SeqCst);
            });

            while restarting.load(Ordering::SeqCst) {
                if let Some(triple) = pool.take_triple(key_pair.public_key()) {
                    assert_eq!(
                        triple.pubkey_to_exponent,
                        key_pair.public_key().pow(triple.exponent())
                    );
                }
            }
        });
    }

    #[test]
    fn clamps_requested_size_to_the_maximum() {
        let pool = pool();
        let key_pair = ElGamalKeyPair::random(&mut OsRng);

        pool.start(key_pair.public_key(), Some(1000)).unwrap();
        pool.stop();

        assert_eq!(pool.status().queue_size, 10);
    }
}
