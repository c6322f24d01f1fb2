//! FIFO work queue shared between pipeline workers.

use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{mpsc, Mutex};

/// A queue entry: an item, or the sentinel telling the consuming worker to exit.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope<T> {
    Item(T),
    Shutdown,
}

/// Unbounded multi-producer queue with blocking dequeue.
///
/// Producers `push` from any task without waiting; the consumer `pop().await`s. The receiving end
/// sits behind an async mutex so the queue can be shared as `Arc<WorkQueue<T>>`.
pub struct WorkQueue<T> {
    name: &'static str,
    tx: mpsc::UnboundedSender<Envelope<T>>,
    rx: Mutex<mpsc::UnboundedReceiver<Envelope<T>>>,
    pending: AtomicUsize,
}

impl<T> WorkQueue<T> {
    pub fn new(name: &'static str) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            name,
            tx,
            rx: Mutex::new(rx),
            pending: AtomicUsize::new(0),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn push(&self, item: T) {
        self.enqueue(Envelope::Item(item));
    }

    /// Enqueues the shutdown sentinel behind everything already queued.
    pub fn shutdown(&self) {
        self.enqueue(Envelope::Shutdown);
    }

    fn enqueue(&self, envelope: Envelope<T>) {
        // Counted before the send: a waiting consumer may take the entry before `send` returns.
        self.pending.fetch_add(1, Ordering::SeqCst);
        if self.tx.send(envelope).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
        }
    }

    /// Waits for the next entry.
    pub async fn pop(&self) -> Envelope<T> {
        let mut rx = self.rx.lock().await;
        match rx.recv().await {
            Some(envelope) => {
                self.pending.fetch_sub(1, Ordering::SeqCst);
                envelope
            }
            None => Envelope::Shutdown,
        }
    }

    /// Next entry if one is ready and no other task is currently waiting in [`pop`](Self::pop).
    pub fn try_pop(&self) -> Option<Envelope<T>> {
        let mut rx = self.rx.try_lock().ok()?;
        let envelope = rx.try_recv().ok()?;
        self.pending.fetch_sub(1, Ordering::SeqCst);
        Some(envelope)
    }

    /// Entries (items and sentinels) not yet dequeued.
    pub fn len(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_fifo_order_and_sentinel() {
        let queue = WorkQueue::new("test");
        queue.push(1);
        queue.push(2);
        queue.shutdown();
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.try_pop(), Some(Envelope::Item(1)));
        assert_eq!(queue.try_pop(), Some(Envelope::Item(2)));
        assert_eq!(queue.try_pop(), Some(Envelope::Shutdown));
        assert_eq!(queue.try_pop(), None);
        assert!(queue.is_empty());
    }

    /// **Test: pop stays pending on an empty queue and is woken by a push.**
    #[test]
    fn test_pop_waits_for_push() {
        let queue = WorkQueue::new("test");
        let mut pop = tokio_test::task::spawn(queue.pop());
        tokio_test::assert_pending!(pop.poll());

        queue.push("hello".to_string());
        assert!(pop.is_woken());
        tokio_test::assert_ready_eq!(pop.poll(), Envelope::Item("hello".to_string()));
    }

    /// **Test: producers on other tasks and one consumer see every item.**
    #[tokio::test]
    async fn test_concurrent_producers() {
        let queue = Arc::new(WorkQueue::new("test"));
        let producers: Vec<_> = (0..4)
            .map(|p| {
                let queue = queue.clone();
                tokio::spawn(async move {
                    for i in 0..25 {
                        queue.push(p * 100 + i);
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.await.unwrap();
        }
        queue.shutdown();

        let mut seen = Vec::new();
        loop {
            match tokio::time::timeout(Duration::from_secs(1), queue.pop()).await.unwrap() {
                Envelope::Item(i) => seen.push(i),
                Envelope::Shutdown => break,
            }
        }
        assert_eq!(seen.len(), 100);
        assert!(queue.is_empty());
    }

    /// **Test: a consumer already waiting on pop never sees the count go below zero.**
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_len_stays_consistent_with_waiting_consumer() {
        let queue = Arc::new(WorkQueue::new("test"));
        let consumer = {
            let queue = queue.clone();
            tokio::spawn(async move {
                let mut taken = 0;
                while let Envelope::Item(_) = queue.pop().await {
                    taken += 1;
                    assert!(queue.len() <= 1000, "len wrapped: {}", queue.len());
                }
                taken
            })
        };
        for i in 0..1000 {
            queue.push(i);
            assert!(queue.len() <= 1000, "len wrapped: {}", queue.len());
        }
        queue.shutdown();

        let taken = tokio::time::timeout(Duration::from_secs(2), consumer)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(taken, 1000);
        assert!(queue.is_empty());
    }
}
