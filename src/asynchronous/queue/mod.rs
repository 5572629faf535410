use crate::error::AdapterError;
use log::debug;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;

/// A FIFO admission queue that bounds how many executions run at once.
///
/// Callers obtain a [`SlotPermit`] with [`acquire`](ConcurrencyQueue::acquire) and hold it
/// for the duration of their work. Dropping the permit, on any path, frees the slot and
/// hands it straight to the oldest waiter, so start order follows arrival order and a
/// slot can never leak.
///
/// Waiters park on a oneshot channel instead of polling for a free slot.
#[derive(Debug, Clone)]
pub struct ConcurrencyQueue {
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    limit: usize,
    capacity: usize,
    state: Mutex<QueueState>,
}

#[derive(Debug, Default)]
struct QueueState {
    active: usize,
    waiting: VecDeque<oneshot::Sender<SlotPermit>>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Proof that the holder occupies one concurrency slot. Dropping it releases the slot.
#[derive(Debug)]
pub struct SlotPermit {
    shared: Arc<Shared>,
}

impl Drop for SlotPermit {
    fn drop(&mut self) {
        let next = {
            let mut state = self.shared.lock();
            match state.waiting.pop_front() {
                Some(next) => next,
                None => {
                    state.active -= 1;
                    return;
                }
            }
        };

        // The slot moves to the next waiter without touching the active count. If that
        // waiter has gone away the permit comes back and dropping it releases again.
        let _ = next.send(SlotPermit {
            shared: Arc::clone(&self.shared),
        });
    }
}

impl ConcurrencyQueue {
    /// Creates a queue running at most `limit` executions (at least one) with up to
    /// `capacity` executions waiting.
    pub fn new(limit: usize, capacity: usize) -> Self {
        ConcurrencyQueue {
            shared: Arc::new(Shared {
                limit: limit.max(1),
                capacity,
                state: Mutex::new(QueueState::default()),
            }),
        }
    }

    /// Waits for a free slot in arrival order.
    ///
    /// # Returns
    /// * `Ok(SlotPermit)` once a slot is available.
    /// * `Err(AdapterError::QueueFull)` immediately if `capacity` executions are
    ///   already waiting.
    pub async fn acquire(&self) -> Result<SlotPermit, AdapterError> {
        let receiver = {
            let mut state = self.shared.lock();
            state.waiting.retain(|waiter| !waiter.is_closed());

            if state.waiting.len() >= self.shared.capacity {
                debug!(
                    "Rejecting submission, {} executions already waiting",
                    state.waiting.len()
                );
                return Err(AdapterError::QueueFull {
                    capacity: self.shared.capacity,
                });
            }

            if state.active < self.shared.limit && state.waiting.is_empty() {
                state.active += 1;
                return Ok(SlotPermit {
                    shared: Arc::clone(&self.shared),
                });
            }

            let (sender, receiver) = oneshot::channel();
            state.waiting.push_back(sender);
            debug!(
                "All {} slots busy, queued at position {}",
                self.shared.limit,
                state.waiting.len()
            );
            receiver
        };

        receiver.await.map_err(|_| {
            AdapterError::Execution("admission queue closed before a slot was granted".into())
        })
    }

    /// Number of executions currently holding a slot.
    pub fn active(&self) -> usize {
        self.shared.lock().active
    }

    /// Number of executions waiting for a slot.
    pub fn waiting(&self) -> usize {
        self.shared.lock().waiting.len()
    }

    pub fn limit(&self) -> usize {
        self.shared.limit
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::join_all;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::task::yield_now;
    use tokio::time::{sleep, timeout};

    #[tokio::test]
    async fn test_immediate_admission_when_slot_free() {
        let queue = ConcurrencyQueue::new(2, 4);
        let first = queue.acquire().await.unwrap();
        let second = queue.acquire().await.unwrap();
        assert_eq!(queue.active(), 2);
        assert_eq!(queue.waiting(), 0);

        drop(first);
        drop(second);
        assert_eq!(queue.active(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_active_count_never_exceeds_limit() {
        let queue = ConcurrencyQueue::new(2, 10);
        let running = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let (queue, running, peak) = (&queue, &running, &peak);

        let tasks = (0..6).map(|_| async move {
            let _permit = queue.acquire().await.unwrap();
            let now = running.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            sleep(Duration::from_millis(50)).await;
            running.fetch_sub(1, Ordering::SeqCst);
        });
        join_all(tasks).await;

        assert_eq!(peak.load(Ordering::SeqCst), 2);
        assert_eq!(queue.active(), 0);
    }

    #[tokio::test]
    async fn test_waiters_start_in_arrival_order() {
        let queue = ConcurrencyQueue::new(1, 10);
        let held = queue.acquire().await.unwrap();
        let order = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for id in 0..5 {
            let task_queue = queue.clone();
            let order = Arc::clone(&order);
            handles.push(tokio::spawn(async move {
                let _permit = task_queue.acquire().await.unwrap();
                order.lock().unwrap().push(id);
            }));
            while queue.waiting() < id + 1 {
                yield_now().await;
            }
        }

        drop(held);
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
        assert_eq!(queue.active(), 0);
    }

    #[tokio::test]
    async fn test_over_capacity_rejected_without_waiting() {
        let queue = ConcurrencyQueue::new(1, 1);
        let _held = queue.acquire().await.unwrap();

        let waiter = {
            let task_queue = queue.clone();
            tokio::spawn(async move { task_queue.acquire().await.map(|_| ()) })
        };
        while queue.waiting() < 1 {
            yield_now().await;
        }

        let rejected = timeout(Duration::from_millis(50), queue.acquire())
            .await
            .expect("rejection must not wait");
        assert!(matches!(rejected, Err(AdapterError::QueueFull { capacity: 1 })));

        waiter.abort();
    }

    #[tokio::test]
    async fn test_zero_capacity_rejects_everything() {
        let queue = ConcurrencyQueue::new(3, 0);
        assert!(matches!(
            queue.acquire().await,
            Err(AdapterError::QueueFull { capacity: 0 })
        ));
        assert_eq!(queue.active(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_waiter_does_not_leak_slot() {
        let queue = ConcurrencyQueue::new(1, 4);
        let held = queue.acquire().await.unwrap();

        // gives up while still queued
        let gave_up = timeout(Duration::from_millis(10), queue.acquire()).await;
        assert!(gave_up.is_err());

        drop(held);
        assert_eq!(queue.active(), 0);
        assert_eq!(queue.waiting(), 0);

        let again = queue.acquire().await.unwrap();
        assert_eq!(queue.active(), 1);
        drop(again);
    }
}
