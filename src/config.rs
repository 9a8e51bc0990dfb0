//! Game-wide configuration, passed explicitly into [`crate::scene::Game::new`].
//!
//! The defaults reproduce the shipped bedroom scene: a 1024×768 canvas, a two
//! second loading screen with ten flower markers, and gold two second
//! messages at the bottom of the room.

use thiserror::Error;

use crate::stage::{ImageSource, TextStyle};

#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
	pub width: f64,
	pub height: f64,
	/// Id of the element the browser stage renders into.
	pub parent: String,
	pub background_color: String,
	pub loading: LoadingConfig,
	pub messages: MessageConfig,
	/// Show the pointer coordinate read-out in the top left corner.
	pub debug_coordinates: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadingConfig {
	pub screen_texture: String,
	pub screen_source: ImageSource,
	pub marker_texture: String,
	pub marker_source: ImageSource,
	/// Time for the visual progress to go from 0 to 1, independent of how
	/// long the assets really take.
	pub full_duration_ms: f64,
	pub milestones: u32,
	pub marker_spacing: f64,
	pub marker_scale: f64,
	pub marker_y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageConfig {
	pub x: f64,
	pub y: f64,
	pub default_duration_ms: f64,
	pub fallback: String,
	pub style: TextStyle,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
	#[error("canvas size must be positive, got {0}x{1}")]
	CanvasSize(f64, f64),
	#[error("loading screen needs at least one milestone")]
	NoMilestones,
	#[error("loading duration must be positive, got {0}ms")]
	LoadingDuration(f64),
	#[error("default message duration must not be negative, got {0}ms")]
	MessageDuration(f64),
}

impl Default for GameConfig {
	fn default() -> Self {
		Self {
			width: 1024.0,
			height: 768.0,
			parent: "game-container".into(),
			background_color: "#e6e6e6".into(),
			loading: LoadingConfig::default(),
			messages: MessageConfig::default(),
			debug_coordinates: false,
		}
	}
}

impl Default for LoadingConfig {
	fn default() -> Self {
		Self {
			screen_texture: "loading-screen".into(),
			screen_source: ImageSource::Element("loading-logo".into()),
			marker_texture: "loadFlower".into(),
			marker_source: ImageSource::Element("loading-flower".into()),
			full_duration_ms: 2000.0,
			milestones: 10,
			marker_spacing: 60.0,
			marker_scale: 0.16,
			marker_y: 600.0,
		}
	}
}

impl Default for MessageConfig {
	fn default() -> Self {
		Self {
			x: 512.0,
			y: 700.0,
			default_duration_ms: 2000.0,
			fallback: "I can't use this yet.".into(),
			style: TextStyle {
				font_family: "Arial".into(),
				font_size: 20.0,
				fill: "#c5b632".into(),
				stroke: Some("#000".into()),
				stroke_thickness: 2.0,
				origin: 0.5,
			},
		}
	}
}

impl GameConfig {
	pub fn with_debug_coordinates(mut self, enabled: bool) -> Self {
		self.debug_coordinates = enabled;
		self
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		if !(self.width > 0.0 && self.height > 0.0) {
			return Err(ConfigError::CanvasSize(self.width, self.height));
		}
		if self.loading.milestones == 0 {
			return Err(ConfigError::NoMilestones);
		}
		if !(self.loading.full_duration_ms > 0.0) {
			return Err(ConfigError::LoadingDuration(self.loading.full_duration_ms));
		}
		if !(self.messages.default_duration_ms >= 0.0) {
			return Err(ConfigError::MessageDuration(self.messages.default_duration_ms));
		}
		Ok(())
	}

	/// Style of the pointer coordinate read-out.
	pub fn coordinate_style(&self) -> TextStyle {
		TextStyle {
			font_family: "Arial".into(),
			font_size: 16.0,
			fill: "#ffffff".into(),
			stroke: None,
			stroke_thickness: 0.0,
			origin: 0.0,
		}
	}
}

/// CSS scale that fits the canvas inside the viewport without ever
/// enlarging it.
pub fn fit_scale(viewport_width: f64, viewport_height: f64, width: f64, height: f64) -> f64 {
	(viewport_width / width).min(viewport_height / height).min(1.0)
}
