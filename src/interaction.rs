//! Room session state: what the player carries, what the room is saying, and
//! the rule deciding whether clicking an object does anything.

use indexmap::IndexMap;
use log::{debug, info};
use thiserror::Error;

use crate::{
	config::MessageConfig,
	inventory::Inventory,
	message::{ClearMessage, MessageDisplay},
	timer::Timers,
	world::InteractiveObject,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
	/// The object's own message was shown. `granted` names the item picked
	/// up, if the object grants one and it was not already held.
	Used { granted: Option<String> },
	/// The object needs an item the player does not have yet; the fallback
	/// message was shown and nothing changed.
	MissingRequirement { required: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InteractionError {
	#[error("unknown object '{0}'")]
	UnknownObject(String),
}

pub struct RoomSession {
	objects: IndexMap<String, InteractiveObject>,
	inventory: Inventory,
	display: MessageDisplay,
	timers: Timers<ClearMessage>,
	fallback: String,
	default_duration_ms: f64,
}

impl RoomSession {
	pub fn new(objects: IndexMap<String, InteractiveObject>, messages: &MessageConfig) -> Self {
		Self {
			objects,
			inventory: Inventory::new(),
			display: MessageDisplay::new(),
			timers: Timers::new(),
			fallback: messages.fallback.clone(),
			default_duration_ms: messages.default_duration_ms,
		}
	}

	pub fn objects(&self) -> impl Iterator<Item = &InteractiveObject> {
		self.objects.values()
	}

	pub fn object(&self, id: &str) -> Option<&InteractiveObject> {
		self.objects.get(id)
	}

	pub fn inventory(&self) -> &Inventory {
		&self.inventory
	}

	pub fn message(&self) -> &str {
		self.display.text()
	}

	/// Run the object's interaction. The requirement is checked before
	/// anything is touched, so either the message and the grant both happen
	/// or only the fallback message does.
	pub fn activate(&mut self, id: &str, now: f64) -> Result<Activation, InteractionError> {
		let obj = self.objects.get(id).ok_or_else(|| InteractionError::UnknownObject(id.to_owned()))?;

		if let Some(required) = &obj.required_item {
			if !self.inventory.contains(required) {
				debug!("[room] {id} needs {required}");
				let required = required.clone();
				let fallback = self.fallback.clone();
				self.show_message(&fallback, self.default_duration_ms, now);
				return Ok(Activation::MissingRequirement { required });
			}
		}

		let message = obj.message.clone();
		let granted = match &obj.grants_item {
			Some(item) if self.inventory.grant(item) => {
				info!("[inventory] picked up {item}");
				Some(item.clone())
			},
			_ => None,
		};
		self.show_message(&message, self.default_duration_ms, now);
		Ok(Activation::Used { granted })
	}

	pub fn show_message(&mut self, text: &str, duration_ms: f64, now: f64) {
		self.display.show(&mut self.timers, now, text, duration_ms);
	}

	/// Fire due message timers. Returns true if the visible text changed.
	pub fn update(&mut self, now: f64) -> bool {
		let mut changed = false;
		for (handle, ClearMessage) in self.timers.fire_due(now) {
			changed |= self.display.expire(handle);
		}
		changed
	}
}


#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::MessageConfig;

	const BLANKET: &str = "I can't make my bed with this blanket. It's dirty.";
	const FALLBACK: &str = "I can't use this yet.";

	fn object(id: &str, message: &str, requires: Option<&str>, grants: Option<&str>) -> (String, InteractiveObject) {
		(
			id.to_owned(),
			InteractiveObject {
				id: id.to_owned(),
				texture: id.to_owned(),
				x: 0.0,
				y: 0.0,
				scale: 1.0,
				message: message.to_owned(),
				required_item: requires.map(str::to_owned),
				grants_item: grants.map(str::to_owned),
			},
		)
	}

	fn session() -> RoomSession {
		let objects = IndexMap::from([
			object("blanket", BLANKET, Some("pen"), None),
			object("pen", "A pen. Might come in handy.", None, Some("pen")),
			object("slinky", "I should clean this up.", None, None),
		]);
		RoomSession::new(objects, &MessageConfig::default())
	}

	#[test]
	fn required_item_blocks_until_granted() {
		let mut room = session();
		let outcome = room.activate("blanket", 0.0).unwrap();
		assert_eq!(outcome, Activation::MissingRequirement { required: "pen".into() });
		assert_eq!(room.message(), FALLBACK);
		assert!(room.inventory().is_empty());
	}

	#[test]
	fn grant_is_idempotent_and_message_repeats() {
		let mut room = session();
		assert_eq!(room.activate("pen", 0.0).unwrap(), Activation::Used { granted: Some("pen".into()) });
		assert!(room.inventory().contains("pen"));

		room.update(5000.0);
		assert_eq!(room.message(), "");

		assert_eq!(room.activate("pen", 5000.0).unwrap(), Activation::Used { granted: None });
		assert_eq!(room.inventory().len(), 1);
		assert_eq!(room.message(), "A pen. Might come in handy.");
	}

	#[test]
	fn blanket_works_after_pen() {
		let mut room = session();
		room.activate("pen", 0.0).unwrap();
		assert_eq!(room.activate("blanket", 10.0).unwrap(), Activation::Used { granted: None });
		assert_eq!(room.message(), BLANKET);
		assert_eq!(room.inventory().iter().collect::<Vec<_>>(), ["pen"]);
	}

	#[test]
	fn unknown_object_changes_nothing() {
		let mut room = session();
		room.activate("slinky", 0.0).unwrap();
		assert_eq!(room.activate("lamp", 1.0), Err(InteractionError::UnknownObject("lamp".into())));
		assert_eq!(room.message(), "I should clean this up.");
		assert!(room.inventory().is_empty());
	}

	#[test]
	fn message_expires_after_default_duration() {
		let mut room = session();
		room.activate("slinky", 100.0).unwrap();
		assert!(!room.update(2099.0));
		assert_eq!(room.message(), "I should clean this up.");
		assert!(room.update(2100.0));
		assert_eq!(room.message(), "");
	}

	#[test]
	fn newer_message_is_not_cleared_by_older_timer() {
		let mut room = session();
		room.show_message("A", 1000.0, 0.0);
		room.show_message("B", 500.0, 0.0);
		assert_eq!(room.message(), "B");
		assert!(room.update(500.0));
		assert_eq!(room.message(), "");
		room.show_message("C", 2000.0, 600.0);
		assert!(!room.update(1000.0));
		assert_eq!(room.message(), "C");
	}

	#[test]
	fn click_replaces_pending_message() {
		let mut room = session();
		room.activate("slinky", 0.0).unwrap();
		room.activate("blanket", 1500.0).unwrap();
		room.update(2000.0);
		assert_eq!(room.message(), FALLBACK);
		room.update(3500.0);
		assert_eq!(room.message(), "");
	}
}
