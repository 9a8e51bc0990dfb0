//! The two scenes and the [`Game`] that switches between them.

use std::collections::HashMap;

use log::{error, info, warn};

use crate::{
	config::{ConfigError, GameConfig, LoadingConfig},
	interaction::RoomSession,
	progress::{ProgressEvent, ProgressGate},
	stage::{ImageSource, SpriteHandle, Stage, TextHandle},
	world::RoomBundle,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneKey {
	Preload,
	Room,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
	None,
	SwitchTo(SceneKey),
}

/// Hooks a host calls on the active scene.
pub trait Scene {
	fn enter(&mut self, stage: &mut dyn Stage);
	fn tick(&mut self, now: f64, stage: &mut dyn Stage) -> SceneCommand;
	fn pointer_down(&mut self, _sprite: SpriteHandle, _now: f64, _stage: &mut dyn Stage) {}
	fn pointer_move(&mut self, _x: f64, _y: f64, _stage: &mut dyn Stage) {}
}

// ---------------------------------------------------------------------------
// Preload
// ---------------------------------------------------------------------------

pub struct PreloadScene {
	width: f64,
	height: f64,
	loading: LoadingConfig,
	assets: Vec<(String, ImageSource)>,
	gate: ProgressGate,
	marker_start_x: f64,
}

impl PreloadScene {
	pub fn new(config: &GameConfig, bundle: &RoomBundle) -> Self {
		let assets = bundle.assets.iter().map(|a| (a.key.clone(), ImageSource::Url(a.path.clone()))).collect();
		Self {
			width: config.width,
			height: config.height,
			loading: config.loading.clone(),
			assets,
			gate: ProgressGate::new(config.loading.full_duration_ms, config.loading.milestones),
			marker_start_x: 0.0,
		}
	}

	pub fn gate(&self) -> &ProgressGate {
		&self.gate
	}

	pub fn marker_x(&self, index: u32) -> f64 {
		self.marker_start_x + index as f64 * self.loading.marker_spacing
	}
}

/// Left edge of the marker row, centring it on the canvas.
pub fn marker_start_x(width: f64, loading: &LoadingConfig, marker_width: f64) -> f64 {
	width / 2.0 - 3.5 * loading.marker_spacing - (loading.milestones as f64 / 2.0) * marker_width
}

impl Scene for PreloadScene {
	fn enter(&mut self, stage: &mut dyn Stage) {
		let loading = &self.loading;
		stage.load_image(&loading.screen_texture, &loading.screen_source);
		let bg = stage.place_sprite(&loading.screen_texture, self.width / 2.0, self.height / 2.0);
		stage.set_display_size(bg, self.width, self.height);

		stage.load_image(&loading.marker_texture, &loading.marker_source);
		for (key, source) in &self.assets {
			stage.load_image(key, source);
		}

		let marker_width = match stage.texture_width(&loading.marker_texture) {
			Some(w) => w * loading.marker_scale,
			None => {
				warn!("[preload] width of {} unknown, markers will not be centred", loading.marker_texture);
				0.0
			},
		};
		self.marker_start_x = marker_start_x(self.width, loading, marker_width);
		info!("[preload] queued {} assets", self.assets.len());
	}

	fn tick(&mut self, now: f64, stage: &mut dyn Stage) -> SceneCommand {
		let mut command = SceneCommand::None;
		for event in self.gate.tick(now) {
			match event {
				ProgressEvent::Marker(i) => {
					let marker = stage.place_sprite(&self.loading.marker_texture, self.marker_x(i), self.loading.marker_y);
					stage.set_scale(marker, self.loading.marker_scale);
				},
				ProgressEvent::Complete => command = SceneCommand::SwitchTo(SceneKey::Room),
			}
		}
		command
	}
}

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

pub struct RoomScene {
	width: f64,
	height: f64,
	background: String,
	session: RoomSession,
	config: GameConfig,
	sprites: HashMap<SpriteHandle, String>,
	message_text: Option<TextHandle>,
	coord_text: Option<TextHandle>,
}

impl RoomScene {
	pub fn new(config: &GameConfig, bundle: &RoomBundle) -> Self {
		Self {
			width: config.width,
			height: config.height,
			background: bundle.room.background.clone(),
			session: RoomSession::new(bundle.room.objects.clone(), &config.messages),
			config: config.clone(),
			sprites: HashMap::new(),
			message_text: None,
			coord_text: None,
		}
	}

	pub fn session(&self) -> &RoomSession {
		&self.session
	}

	/// The sprite standing for an object, once the scene has been entered.
	pub fn sprite_of(&self, object_id: &str) -> Option<SpriteHandle> {
		self.sprites.iter().find(|(_, id)| id.as_str() == object_id).map(|(handle, _)| *handle)
	}

	fn render_message(&self, stage: &mut dyn Stage) {
		if let Some(text) = self.message_text {
			stage.set_text(text, self.session.message());
		}
	}
}

impl Scene for RoomScene {
	fn enter(&mut self, stage: &mut dyn Stage) {
		let bg = stage.place_sprite(&self.background, self.width / 2.0, self.height / 2.0);
		stage.set_display_size(bg, self.width, self.height);

		for obj in self.session.objects() {
			let sprite = stage.place_sprite(&obj.texture, obj.x, obj.y);
			stage.set_scale(sprite, obj.scale);
			stage.set_interactive(sprite);
			self.sprites.insert(sprite, obj.id.clone());
		}

		if self.config.debug_coordinates {
			self.coord_text = Some(stage.add_text(10.0, 10.0, &self.config.coordinate_style()));
		}

		let messages = &self.config.messages;
		self.message_text = Some(stage.add_text(messages.x, messages.y, &messages.style));
		info!("[room] entered with {} objects", self.sprites.len());
	}

	fn tick(&mut self, now: f64, stage: &mut dyn Stage) -> SceneCommand {
		if self.session.update(now) {
			self.render_message(stage);
		}
		SceneCommand::None
	}

	fn pointer_down(&mut self, sprite: SpriteHandle, now: f64, stage: &mut dyn Stage) {
		// Clicks on the background or on stale sprites are not interactions.
		let Some(id) = self.sprites.get(&sprite) else { return };
		match self.session.activate(id, now) {
			Ok(outcome) => info!("[room] {} -> {:?}", id, outcome),
			Err(e) => {
				error!("[room] {}", e);
				return;
			},
		}
		self.render_message(stage);
	}

	fn pointer_move(&mut self, x: f64, y: f64, stage: &mut dyn Stage) {
		if let Some(text) = self.coord_text {
			stage.set_text(text, &format!("X: {}, Y: {}", round_half_up(x), round_half_up(y)));
		}
	}
}

/// Halves round towards +inf, and the result never prints as `-0`.
fn round_half_up(v: f64) -> f64 {
	(v + 0.5).floor() + 0.0
}

// ---------------------------------------------------------------------------
// Game
// ---------------------------------------------------------------------------

pub enum ActiveScene {
	Preload(PreloadScene),
	Room(RoomScene),
}

impl ActiveScene {
	fn scene(&mut self) -> &mut dyn Scene {
		match self {
			ActiveScene::Preload(s) => s,
			ActiveScene::Room(s) => s,
		}
	}

	pub fn key(&self) -> SceneKey {
		match self {
			ActiveScene::Preload(_) => SceneKey::Preload,
			ActiveScene::Room(_) => SceneKey::Room,
		}
	}
}

/// Owns the configuration and the active scene. Ticks and pointer events
/// must be delivered from a single thread, in the order they happened.
pub struct Game {
	config: GameConfig,
	bundle: RoomBundle,
	active: ActiveScene,
	started: bool,
	last_now: f64,
}

impl Game {
	pub fn new(config: GameConfig, bundle: RoomBundle) -> Result<Self, ConfigError> {
		config.validate()?;
		let active = ActiveScene::Preload(PreloadScene::new(&config, &bundle));
		Ok(Self {
			config,
			bundle,
			active,
			started: false,
			last_now: 0.0,
		})
	}

	pub fn config(&self) -> &GameConfig {
		&self.config
	}

	pub fn scene(&self) -> SceneKey {
		self.active.key()
	}

	pub fn active(&self) -> &ActiveScene {
		&self.active
	}

	pub fn room(&self) -> Option<&RoomScene> {
		match &self.active {
			ActiveScene::Room(room) => Some(room),
			ActiveScene::Preload(_) => None,
		}
	}

	pub fn start(&mut self, stage: &mut dyn Stage) {
		if self.started {
			return;
		}
		self.started = true;
		info!("[game] entering {:?}", self.active.key());
		self.active.scene().enter(stage);
	}

	pub fn tick(&mut self, now: f64, stage: &mut dyn Stage) {
		if !self.started {
			self.start(stage);
		}
		self.last_now = now;
		if let SceneCommand::SwitchTo(key) = self.active.scene().tick(now, stage) {
			self.switch_to(key, stage);
		}
	}

	pub fn pointer_down(&mut self, sprite: SpriteHandle, stage: &mut dyn Stage) {
		let now = self.last_now;
		self.active.scene().pointer_down(sprite, now, stage);
	}

	pub fn pointer_move(&mut self, x: f64, y: f64, stage: &mut dyn Stage) {
		self.active.scene().pointer_move(x, y, stage);
	}

	fn switch_to(&mut self, key: SceneKey, stage: &mut dyn Stage) {
		if key == self.active.key() {
			return;
		}
		// the room is the last scene; nothing leads back to the loading screen
		let next = match key {
			SceneKey::Room => ActiveScene::Room(RoomScene::new(&self.config, &self.bundle)),
			SceneKey::Preload => {
				warn!("[game] ignoring switch back to the loading screen");
				return;
			},
		};
		info!("[game] {:?} -> {:?}", self.active.key(), key);
		stage.clear();
		self.active = next;
		self.active.scene().enter(stage);
	}
}
