//! One-shot timers fired by the tick loop. Nothing here sleeps: a timer is
//! just a due time that [`Timers::fire_due`] notices once the clock passes it.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

#[derive(Debug)]
struct Pending<E> {
	handle: TimerHandle,
	due: f64,
	event: E,
}

#[derive(Debug)]
pub struct Timers<E> {
	next_id: u64,
	pending: Vec<Pending<E>>,
}

impl<E> Default for Timers<E> {
	fn default() -> Self {
		Self {
			next_id: 0,
			pending: Vec::new(),
		}
	}
}

impl<E> Timers<E> {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn schedule_once(&mut self, now: f64, delay_ms: f64, event: E) -> TimerHandle {
		let handle = TimerHandle(self.next_id);
		self.next_id += 1;
		self.pending.push(Pending {
			handle,
			due: now + delay_ms.max(0.0),
			event,
		});
		handle
	}

	/// Returns false if the timer already fired or was cancelled.
	pub fn cancel(&mut self, handle: TimerHandle) -> bool {
		let before = self.pending.len();
		self.pending.retain(|p| p.handle != handle);
		self.pending.len() != before
	}

	pub fn is_pending(&self, handle: TimerHandle) -> bool {
		self.pending.iter().any(|p| p.handle == handle)
	}

	pub fn len(&self) -> usize {
		self.pending.len()
	}

	pub fn is_empty(&self) -> bool {
		self.pending.is_empty()
	}

	/// Removes and returns every timer due at or before `now`, earliest
	/// first; ties keep scheduling order.
	pub fn fire_due(&mut self, now: f64) -> Vec<(TimerHandle, E)> {
		let (mut due, rest): (Vec<_>, Vec<_>) = self.pending.drain(..).partition(|p| p.due <= now);
		self.pending = rest;
		due.sort_by(|a, b| a.due.total_cmp(&b.due).then(a.handle.cmp(&b.handle)));
		due.into_iter().map(|p| (p.handle, p.event)).collect()
	}
}


#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn fires_in_due_order() {
		let mut timers = Timers::new();
		timers.schedule_once(0.0, 300.0, "late");
		timers.schedule_once(0.0, 100.0, "early");
		timers.schedule_once(0.0, 100.0, "early-second");
		assert!(timers.fire_due(99.0).is_empty());
		let fired: Vec<_> = timers.fire_due(300.0).into_iter().map(|(_, e)| e).collect();
		assert_eq!(fired, vec!["early", "early-second", "late"]);
		assert!(timers.is_empty());
	}

	#[test]
	fn cancelled_timer_never_fires() {
		let mut timers = Timers::new();
		let handle = timers.schedule_once(0.0, 10.0, ());
		assert!(timers.cancel(handle));
		assert!(!timers.cancel(handle));
		assert!(timers.fire_due(1000.0).is_empty());
	}

	#[test]
	fn negative_delay_is_due_immediately() {
		let mut timers = Timers::new();
		let handle = timers.schedule_once(50.0, -20.0, ());
		assert!(timers.is_pending(handle));
		assert_eq!(timers.fire_due(50.0).len(), 1);
	}
}
