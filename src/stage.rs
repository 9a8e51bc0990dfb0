//! The host boundary. Scenes never touch the DOM directly; they place sprites
//! and text through a [`Stage`], and receive input and time from whoever
//! drives the [`crate::scene::Game`].

use std::collections::HashMap;

use log::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpriteHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextHandle(pub u32);

/// Where a texture comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
	/// Fetched by URL.
	Url(String),
	/// Taken from an `<img>` element already present in the page.
	Element(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
	pub font_family: String,
	pub font_size: f64,
	pub fill: String,
	pub stroke: Option<String>,
	pub stroke_thickness: f64,
	/// 0.0 anchors the text at its top left corner, 0.5 at its centre.
	pub origin: f64,
}

pub trait Stage {
	fn load_image(&mut self, key: &str, source: &ImageSource);
	/// Natural width of a loaded texture, if the host knows it yet.
	fn texture_width(&self, key: &str) -> Option<f64>;
	/// Sprites are anchored at their centre.
	fn place_sprite(&mut self, key: &str, x: f64, y: f64) -> SpriteHandle;
	/// Scale and display size are exclusive: setting one resets the other.
	fn set_scale(&mut self, sprite: SpriteHandle, factor: f64);
	fn set_display_size(&mut self, sprite: SpriteHandle, width: f64, height: f64);
	/// Pointer-down events on this sprite are delivered to the game.
	fn set_interactive(&mut self, sprite: SpriteHandle);
	fn add_text(&mut self, x: f64, y: f64, style: &TextStyle) -> TextHandle;
	fn set_text(&mut self, text: TextHandle, value: &str);
	/// Drop every sprite and text, keeping loaded textures.
	fn clear(&mut self);
}

// ---------------------------------------------------------------------------
// Headless stage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SpriteRecord {
	pub key: String,
	pub x: f64,
	pub y: f64,
	pub scale: f64,
	pub display_size: Option<(f64, f64)>,
	pub interactive: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextRecord {
	pub x: f64,
	pub y: f64,
	pub style: TextStyle,
	pub value: String,
}

/// Keeps everything in memory. Used by the terminal runner and the tests.
#[derive(Debug, Default)]
pub struct HeadlessStage {
	textures: HashMap<String, ImageSource>,
	widths: HashMap<String, f64>,
	sprites: Vec<SpriteRecord>,
	texts: Vec<TextRecord>,
	// handles stay unique across clears
	sprite_base: u32,
	text_base: u32,
}

impl HeadlessStage {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_texture_width(mut self, key: &str, width: f64) -> Self {
		self.widths.insert(key.to_owned(), width);
		self
	}

	pub fn is_loaded(&self, key: &str) -> bool {
		self.textures.contains_key(key)
	}

	pub fn sprites(&self) -> &[SpriteRecord] {
		&self.sprites
	}

	pub fn sprite(&self, handle: SpriteHandle) -> Option<&SpriteRecord> {
		handle.0.checked_sub(self.sprite_base).and_then(|i| self.sprites.get(i as usize))
	}

	pub fn sprites_with_key<'s>(&'s self, key: &'s str) -> impl Iterator<Item = &'s SpriteRecord> + 's {
		self.sprites.iter().filter(move |s| s.key == key)
	}

	pub fn texts(&self) -> &[TextRecord] {
		&self.texts
	}

	pub fn text(&self, handle: TextHandle) -> Option<&TextRecord> {
		handle.0.checked_sub(self.text_base).and_then(|i| self.texts.get(i as usize))
	}

	fn sprite_mut(&mut self, handle: SpriteHandle) -> Option<&mut SpriteRecord> {
		let idx = handle.0.checked_sub(self.sprite_base)? as usize;
		let sprite = self.sprites.get_mut(idx);
		if sprite.is_none() {
			warn!("stale sprite handle {:?}", handle);
		}
		sprite
	}
}

impl Stage for HeadlessStage {
	fn load_image(&mut self, key: &str, source: &ImageSource) {
		debug!("[stage] load {key} from {source:?}");
		self.textures.insert(key.to_owned(), source.clone());
	}

	fn texture_width(&self, key: &str) -> Option<f64> {
		self.widths.get(key).copied()
	}

	fn place_sprite(&mut self, key: &str, x: f64, y: f64) -> SpriteHandle {
		if !self.textures.contains_key(key) {
			warn!("[stage] sprite uses texture {key} which was never loaded");
		}
		let handle = SpriteHandle(self.sprite_base + self.sprites.len() as u32);
		self.sprites.push(SpriteRecord {
			key: key.to_owned(),
			x,
			y,
			scale: 1.0,
			display_size: None,
			interactive: false,
		});
		debug!("[stage] sprite {} ({key}) at {x},{y}", handle.0);
		handle
	}

	fn set_scale(&mut self, sprite: SpriteHandle, factor: f64) {
		if let Some(s) = self.sprite_mut(sprite) {
			s.scale = factor;
			s.display_size = None;
		}
	}

	fn set_display_size(&mut self, sprite: SpriteHandle, width: f64, height: f64) {
		if let Some(s) = self.sprite_mut(sprite) {
			s.display_size = Some((width, height));
			s.scale = 1.0;
		}
	}

	fn set_interactive(&mut self, sprite: SpriteHandle) {
		if let Some(s) = self.sprite_mut(sprite) {
			s.interactive = true;
		}
	}

	fn add_text(&mut self, x: f64, y: f64, style: &TextStyle) -> TextHandle {
		let handle = TextHandle(self.text_base + self.texts.len() as u32);
		self.texts.push(TextRecord {
			x,
			y,
			style: style.clone(),
			value: String::new(),
		});
		handle
	}

	fn set_text(&mut self, text: TextHandle, value: &str) {
		let Some(idx) = text.0.checked_sub(self.text_base) else { return };
		match self.texts.get_mut(idx as usize) {
			Some(t) => {
				if t.value != value {
					debug!("[stage] text {} = {value:?}", text.0);
				}
				t.value = value.to_owned();
			},
			None => warn!("stale text handle {:?}", text),
		}
	}

	fn clear(&mut self) {
		self.sprite_base += self.sprites.len() as u32;
		self.text_base += self.texts.len() as u32;
		self.sprites.clear();
		self.texts.clear();
	}
}


#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn handles_survive_clear_without_aliasing() {
		let mut stage = HeadlessStage::new();
		stage.load_image("a", &ImageSource::Url("a.png".into()));
		let first = stage.place_sprite("a", 1.0, 2.0);
		stage.clear();
		let second = stage.place_sprite("a", 3.0, 4.0);
		assert_ne!(first, second);
		assert!(stage.sprite(first).is_none());
		assert_eq!(stage.sprite(second).map(|s| (s.x, s.y)), Some((3.0, 4.0)));
	}

	#[test]
	fn display_size_and_scale_are_recorded() {
		let mut stage = HeadlessStage::new();
		let bg = stage.place_sprite("bg", 512.0, 384.0);
		stage.set_display_size(bg, 1024.0, 768.0);
		let obj = stage.place_sprite("obj", 10.0, 10.0);
		stage.set_scale(obj, 0.5);
		stage.set_interactive(obj);
		assert_eq!(stage.sprite(bg).unwrap().display_size, Some((1024.0, 768.0)));
		let obj = stage.sprite(obj).unwrap();
		assert_eq!(obj.scale, 0.5);
		assert!(obj.interactive);
	}

	#[test]
	fn scale_and_display_size_replace_each_other() {
		let mut stage = HeadlessStage::new();
		let sprite = stage.place_sprite("bg", 0.0, 0.0);
		stage.set_scale(sprite, 0.25);
		stage.set_display_size(sprite, 800.0, 600.0);
		let s = stage.sprite(sprite).unwrap();
		assert_eq!((s.scale, s.display_size), (1.0, Some((800.0, 600.0))));

		stage.set_scale(sprite, 2.0);
		let s = stage.sprite(sprite).unwrap();
		assert_eq!((s.scale, s.display_size), (2.0, None));
	}
}
