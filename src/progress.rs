//! Loading screen progress.
//!
//! The bar is purely time driven: it always takes `full_duration_ms` to fill,
//! whether the real assets arrive sooner or later. A smooth animation was
//! preferred over an accurate one.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
	/// Milestone `n` (0-based) passed; one flower goes up.
	Marker(u32),
	/// Progress reached 1.0. Emitted once.
	Complete,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressState {
	// Accumulated whole microseconds rather than accumulated fractions, so
	// that the same total reaches the same milestones however it was split
	// into ticks, fractional `performance.now()` readings included.
	elapsed_us: u64,
	pub flowers_shown: u32,
	pub last_timestamp: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct ProgressGate {
	full_duration_us: u64,
	milestones: u32,
	state: ProgressState,
	complete: bool,
}

/// Milliseconds to whole microseconds. Negative and NaN readings become 0.
fn to_micros(ms: f64) -> u64 {
	(ms * 1000.0).round().max(0.0) as u64
}

impl ProgressGate {
	/// A duration under one microsecond (zero, negative, NaN) is treated as
	/// one microsecond: the gate completes on its first non-empty advance.
	pub fn new(full_duration_ms: f64, milestones: u32) -> Self {
		Self {
			full_duration_us: to_micros(full_duration_ms).max(1),
			milestones,
			state: ProgressState::default(),
			complete: false,
		}
	}

	pub fn state(&self) -> &ProgressState {
		&self.state
	}

	/// In `[0, 1]`.
	pub fn visual_progress(&self) -> f64 {
		(self.state.elapsed_us as f64 / self.full_duration_us as f64).min(1.0)
	}

	pub fn flowers_shown(&self) -> u32 {
		self.state.flowers_shown
	}

	pub fn is_complete(&self) -> bool {
		self.complete
	}

	/// Feed the current clock reading. The first call only starts the clock.
	pub fn tick(&mut self, now: f64) -> Vec<ProgressEvent> {
		// snap both readings so consecutive deltas telescope exactly
		let delta_us = match self.state.last_timestamp {
			Some(last) => to_micros(now).saturating_sub(to_micros(last)),
			None => 0,
		};
		self.state.last_timestamp = Some(now);
		self.advance_micros(delta_us)
	}

	pub fn advance(&mut self, delta_ms: f64) -> Vec<ProgressEvent> {
		self.advance_micros(to_micros(delta_ms))
	}

	fn advance_micros(&mut self, delta_us: u64) -> Vec<ProgressEvent> {
		let mut events = Vec::new();
		if self.complete {
			return events;
		}

		self.state.elapsed_us = self.state.elapsed_us.saturating_add(delta_us).min(self.full_duration_us);

		// progress >= (shown + 1) / N, kept in time units
		let n = u128::from(self.milestones);
		while self.state.flowers_shown < self.milestones
			&& u128::from(self.state.elapsed_us) * n
				>= u128::from(self.state.flowers_shown + 1) * u128::from(self.full_duration_us)
		{
			events.push(ProgressEvent::Marker(self.state.flowers_shown));
			self.state.flowers_shown += 1;
		}

		if self.state.elapsed_us >= self.full_duration_us {
			self.complete = true;
			events.push(ProgressEvent::Complete);
		}
		events
	}
}
