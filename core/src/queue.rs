use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;

struct Inner<T> {
	buffer: VecDeque<T>,
	finished: bool,
}

/// Fixed-capacity FIFO hand-off between stage threads.
///
/// A full queue blocks its producer and an empty queue blocks its consumer,
/// so a slow stage stalls its neighbours instead of growing a backlog.
/// `set_finished` latches end-of-stream: producers are turned away
/// immediately, consumers drain whatever is still buffered and then observe
/// `None`.
pub struct BoundedQueue<T> {
	inner: Mutex<Inner<T>>,
	not_full: Condvar,
	not_empty: Condvar,
	capacity: usize,
}

impl<T> BoundedQueue<T> {
	/// Panics if `capacity` is zero; such a queue could never hand anything over.
	pub fn new(capacity: usize) -> Self {
		assert!(capacity > 0, "bounded queue capacity must be at least 1");
		Self {
			inner: Mutex::new(Inner {
				buffer: VecDeque::with_capacity(capacity),
				finished: false,
			}),
			not_full: Condvar::new(),
			not_empty: Condvar::new(),
			capacity,
		}
	}

	/// Blocks while the queue is full. Returns `false` without inserting once
	/// the queue has been finished, telling the producer to stop.
	pub fn enqueue(&self, item: T) -> bool {
		let mut inner = self.inner.lock();
		while inner.buffer.len() == self.capacity && !inner.finished {
			self.not_full.wait(&mut inner);
		}
		if inner.finished {
			return false;
		}
		inner.buffer.push_back(item);
		drop(inner);
		self.not_empty.notify_one();
		true
	}

	/// Blocks while the queue is empty and not finished. Returns `None` only
	/// once the queue is both finished and drained.
	pub fn dequeue(&self) -> Option<T> {
		let mut inner = self.inner.lock();
		while inner.buffer.is_empty() && !inner.finished {
			self.not_empty.wait(&mut inner);
		}
		let item = inner.buffer.pop_front();
		drop(inner);
		if item.is_some() {
			self.not_full.notify_one();
		}
		item
	}

	/// Latches end-of-stream and wakes every waiter on both conditions.
	/// Idempotent; safe from any thread.
	pub fn set_finished(&self) {
		let mut inner = self.inner.lock();
		inner.finished = true;
		drop(inner);
		self.not_full.notify_all();
		self.not_empty.notify_all();
	}

	pub fn is_finished(&self) -> bool {
		self.inner.lock().finished
	}

	/// Advisory; may be stale by the time the caller looks at it.
	pub fn len(&self) -> usize {
		self.inner.lock().buffer.len()
	}

	pub fn is_empty(&self) -> bool {
		self.inner.lock().buffer.is_empty()
	}

	pub fn capacity(&self) -> usize {
		self.capacity
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::{
		sync::{
			atomic::{AtomicBool, Ordering},
			Arc,
		},
		thread,
		time::Duration,
	};

	#[test]
	fn fifo_order() {
		let queue = BoundedQueue::new(8);
		for i in 0..8 {
			assert!(queue.enqueue(i));
		}
		queue.set_finished();
		for i in 0..8 {
			assert_eq!(queue.dequeue(), Some(i));
		}
		assert_eq!(queue.dequeue(), None);
	}

	#[test]
	#[should_panic(expected = "capacity must be at least 1")]
	fn zero_capacity_rejected() {
		let _ = BoundedQueue::<usize>::new(0);
	}

	#[test]
	fn enqueue_blocks_at_capacity() {
		let queue = Arc::new(BoundedQueue::new(2));
		assert!(queue.enqueue(1));
		assert!(queue.enqueue(2));

		let landed = Arc::new(AtomicBool::new(false));
		let producer = {
			let queue = queue.clone();
			let landed = landed.clone();
			thread::spawn(move || {
				let accepted = queue.enqueue(3);
				landed.store(true, Ordering::SeqCst);
				accepted
			})
		};

		thread::sleep(Duration::from_millis(50));
		assert!(!landed.load(Ordering::SeqCst), "third enqueue should still be blocked");

		assert_eq!(queue.dequeue(), Some(1));
		assert!(producer.join().unwrap());
		assert_eq!(queue.dequeue(), Some(2));
		assert_eq!(queue.dequeue(), Some(3));
	}

	#[test]
	fn finish_drains_buffered_items_then_closes() {
		let queue = BoundedQueue::new(3);
		assert!(queue.enqueue("a"));
		assert!(queue.enqueue("b"));
		queue.set_finished();
		assert_eq!(queue.dequeue(), Some("a"));
		assert_eq!(queue.dequeue(), Some("b"));
		assert_eq!(queue.dequeue(), None);
	}

	#[test]
	fn finish_rejects_new_writes() {
		let queue = BoundedQueue::new(3);
		queue.set_finished();
		assert!(!queue.enqueue(1));
		assert!(queue.is_empty());
	}

	#[test]
	fn finish_is_idempotent() {
		let queue = BoundedQueue::new(1);
		assert!(queue.enqueue(7));
		queue.set_finished();
		queue.set_finished();
		assert!(queue.is_finished());
		assert_eq!(queue.dequeue(), Some(7));
		assert_eq!(queue.dequeue(), None);
	}

	#[test]
	fn finish_releases_blocked_consumer() {
		let queue = Arc::new(BoundedQueue::<usize>::new(2));
		let consumer = {
			let queue = queue.clone();
			thread::spawn(move || queue.dequeue())
		};
		thread::sleep(Duration::from_millis(50));
		queue.set_finished();
		assert_eq!(consumer.join().unwrap(), None);
	}

	#[test]
	fn finish_releases_blocked_producer() {
		let queue = Arc::new(BoundedQueue::new(1));
		assert!(queue.enqueue(1));
		let producer = {
			let queue = queue.clone();
			thread::spawn(move || queue.enqueue(2))
		};
		thread::sleep(Duration::from_millis(50));
		queue.set_finished();
		assert!(!producer.join().unwrap(), "blocked enqueue must fail after finish");
		assert_eq!(queue.len(), 1);
	}

	#[test]
	fn concurrent_producer_consumer_preserves_order() {
		let queue = Arc::new(BoundedQueue::new(2));
		let producer = {
			let queue = queue.clone();
			thread::spawn(move || {
				for i in 0..100_usize {
					assert!(queue.enqueue(i));
				}
				queue.set_finished();
			})
		};
		let mut seen = Vec::new();
		while let Some(i) = queue.dequeue() {
			seen.push(i);
		}
		producer.join().unwrap();
		assert_eq!(seen, (0..100).collect::<Vec<_>>());
	}
}
