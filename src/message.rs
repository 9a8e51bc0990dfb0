use crate::timer::{TimerHandle, Timers};

/// Event carried by the message expiry timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearMessage;

/// The single line of text shown at the bottom of the room.
#[derive(Debug, Default)]
pub struct MessageDisplay {
	text: String,
	expiry: Option<TimerHandle>,
}

impl MessageDisplay {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn text(&self) -> &str {
		&self.text
	}

	pub fn expiry(&self) -> Option<TimerHandle> {
		self.expiry
	}

	/// Replace the current message. Any pending expiry is cancelled before
	/// the new one is armed.
	pub fn show(&mut self, timers: &mut Timers<ClearMessage>, now: f64, text: &str, duration_ms: f64) {
		self.text = text.to_owned();
		if let Some(old) = self.expiry.take() {
			timers.cancel(old);
		}
		self.expiry = Some(timers.schedule_once(now, duration_ms, ClearMessage));
	}

	/// Called when an expiry timer fires. Returns true if the text was
	/// cleared; an expiry that is no longer current is ignored.
	pub fn expire(&mut self, handle: TimerHandle) -> bool {
		if self.expiry != Some(handle) {
			return false;
		}
		self.expiry = None;
		self.text.clear();
		true
	}
}


#[cfg(test)]
mod tests {
	use super::*;

	fn run(display: &mut MessageDisplay, timers: &mut Timers<ClearMessage>, now: f64) {
		for (handle, ClearMessage) in timers.fire_due(now) {
			display.expire(handle);
		}
	}

	#[test]
	fn newer_message_cancels_older_expiry() {
		let mut timers = Timers::new();
		let mut display = MessageDisplay::new();
		display.show(&mut timers, 0.0, "A", 1000.0);
		display.show(&mut timers, 0.0, "B", 500.0);
		assert_eq!(timers.len(), 1);

		run(&mut display, &mut timers, 499.0);
		assert_eq!(display.text(), "B");
		run(&mut display, &mut timers, 500.0);
		assert_eq!(display.text(), "");
		assert!(timers.is_empty());
	}

	#[test]
	fn later_message_survives_earlier_deadline() {
		let mut timers = Timers::new();
		let mut display = MessageDisplay::new();
		display.show(&mut timers, 0.0, "A", 1000.0);
		display.show(&mut timers, 900.0, "B", 2000.0);
		run(&mut display, &mut timers, 1000.0);
		assert_eq!(display.text(), "B");
		run(&mut display, &mut timers, 2900.0);
		assert_eq!(display.text(), "");
	}

	#[test]
	fn stale_handle_is_ignored() {
		let mut timers = Timers::new();
		let mut display = MessageDisplay::new();
		display.show(&mut timers, 0.0, "A", 10.0);
		let stale = display.expiry().unwrap();
		display.show(&mut timers, 0.0, "B", 10.0);
		assert!(!display.expire(stale));
		assert_eq!(display.text(), "B");
	}

	#[test]
	fn zero_duration_clears_on_next_update() {
		let mut timers = Timers::new();
		let mut display = MessageDisplay::new();
		display.show(&mut timers, 100.0, "", 0.0);
		run(&mut display, &mut timers, 100.0);
		assert_eq!(display.text(), "");
		assert_eq!(display.expiry(), None);
	}
}
