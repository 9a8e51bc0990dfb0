//! Browser host: a DOM-backed [`Stage`] and the `requestAnimationFrame` loop
//! that drives the [`Game`].
//!
//! Sprites are absolutely positioned `<img>` elements inside the game
//! container, text lines are `<div>`s. DOM events are queued and drained at
//! the start of each frame so input and ticks stay strictly ordered.

use std::{
	cell::RefCell,
	collections::{HashMap, VecDeque},
	rc::Rc,
};

use anyhow::{Result, anyhow};
use log::{debug, error, info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, Element, HtmlElement, HtmlImageElement, MouseEvent, Response};

use crate::{
	config::{GameConfig, fit_scale},
	preprocessor::SourceLoader,
	scene::Game,
	stage::{ImageSource, SpriteHandle, Stage, TextHandle, TextStyle},
	world::RoomBundle,
};

// ---------------------------------------------------------------------------
// Loading room files
// ---------------------------------------------------------------------------

/// Fetches room files relative to the page.
pub struct FetchLoader;

impl SourceLoader for FetchLoader {
	async fn load(&self, name: &str) -> Result<String> {
		let resp_value = JsFuture::from(window()?.fetch_with_str(name)).await.map_err(|e| js_error("fetch", e))?;
		let resp: Response = resp_value.dyn_into().map_err(|e| js_error("fetch response", e))?;
		if !resp.ok() {
			return Err(anyhow!("Failed to fetch {}: HTTP {}", name, resp.status()));
		}
		let text = JsFuture::from(resp.text().map_err(|e| js_error("response body", e))?)
			.await
			.map_err(|e| js_error("response body", e))?;
		text.as_string().ok_or_else(|| anyhow!("{} is not text", name))
	}
}

fn js_error(what: &str, err: JsValue) -> anyhow::Error {
	anyhow!("{} failed: {:?}", what, err)
}

fn window() -> Result<web_sys::Window> {
	web_sys::window().ok_or_else(|| anyhow!("no global `window` exists"))
}

// ---------------------------------------------------------------------------
// Input queue
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
enum InputEvent {
	PointerDown(SpriteHandle),
	PointerMove(f64, f64),
}

type InputQueue = Rc<RefCell<VecDeque<InputEvent>>>;

// ---------------------------------------------------------------------------
// DOM stage
// ---------------------------------------------------------------------------

struct SpriteNode {
	element: HtmlImageElement,
	x: f64,
	y: f64,
	scale: f64,
	display_size: Option<(f64, f64)>,
	interactive: bool,
}

impl SpriteNode {
	fn style(&self) -> String {
		let mut style = format!(
			"position:absolute;left:{}px;top:{}px;transform:translate(-50%,-50%) scale({});transform-origin:center;",
			self.x, self.y, self.scale
		);
		if let Some((w, h)) = self.display_size {
			style.push_str(&format!("width:{}px;height:{}px;", w, h));
		}
		style.push_str(if self.interactive { "cursor:pointer;" } else { "pointer-events:none;" });
		style
	}
}

pub struct WebStage {
	document: Document,
	container: Element,
	textures: HashMap<String, HtmlImageElement>,
	sprites: HashMap<SpriteHandle, SpriteNode>,
	texts: HashMap<TextHandle, Element>,
	next_handle: u32,
	input: InputQueue,
	listeners: Vec<Closure<dyn FnMut(MouseEvent)>>,
}

impl WebStage {
	fn new(config: &GameConfig, input: InputQueue) -> Result<Self> {
		let document = window()?.document().ok_or_else(|| anyhow!("no document"))?;
		let container = document
			.get_element_by_id(&config.parent)
			.ok_or_else(|| anyhow!("no element with id '{}'", config.parent))?;
		container
			.set_attribute(
				"style",
				&format!(
					"position:relative;overflow:hidden;width:{}px;height:{}px;background:{};",
					config.width, config.height, config.background_color
				),
			)
			.map_err(|e| js_error("container style", e))?;

		Ok(Self {
			document,
			container,
			textures: HashMap::new(),
			sprites: HashMap::new(),
			texts: HashMap::new(),
			next_handle: 0,
			input,
			listeners: Vec::new(),
		})
	}

	fn next_handle(&mut self) -> u32 {
		let id = self.next_handle;
		self.next_handle += 1;
		id
	}

	fn restyle(&self, sprite: SpriteHandle) {
		if let Some(node) = self.sprites.get(&sprite) {
			if let Err(e) = node.element.set_attribute("style", &node.style()) {
				error!("[web] failed to style sprite {}: {:?}", sprite.0, e);
			}
		}
	}

	fn new_image(&self) -> Option<HtmlImageElement> {
		match self.document.create_element("img").map(|e| e.dyn_into::<HtmlImageElement>()) {
			Ok(Ok(img)) => Some(img),
			_ => {
				error!("[web] could not create <img>");
				None
			},
		}
	}

	/// Pointer coordinates in canvas space; the container may be scaled by
	/// CSS.
	fn listen_pointer_move(&mut self, width: f64) {
		let input = self.input.clone();
		let container = self.container.clone();
		let closure = Closure::<dyn FnMut(MouseEvent)>::new(move |event: MouseEvent| {
			let rect = container.get_bounding_client_rect();
			let scale = if rect.width() > 0.0 { rect.width() / width } else { 1.0 };
			let x = (event.client_x() as f64 - rect.left()) / scale;
			let y = (event.client_y() as f64 - rect.top()) / scale;
			input.borrow_mut().push_back(InputEvent::PointerMove(x, y));
		});
		if let Err(e) = self.container.add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref()) {
			error!("[web] failed to listen for mousemove: {:?}", e);
		}
		closure.forget();
	}
}

impl Stage for WebStage {
	fn load_image(&mut self, key: &str, source: &ImageSource) {
		let img = match source {
			ImageSource::Element(id) => match self.document.get_element_by_id(id).map(|e| e.dyn_into::<HtmlImageElement>()) {
				Some(Ok(img)) => img,
				_ => {
					error!("[web] no <img id=\"{}\"> for texture {}", id, key);
					return;
				},
			},
			ImageSource::Url(url) => {
				let Some(img) = self.new_image() else { return };
				img.set_src(url);
				img
			},
		};
		debug!("[web] texture {} -> {}", key, img.src());
		self.textures.insert(key.to_owned(), img);
	}

	fn texture_width(&self, key: &str) -> Option<f64> {
		self.textures.get(key).map(|img| img.natural_width() as f64).filter(|w| *w > 0.0)
	}

	fn place_sprite(&mut self, key: &str, x: f64, y: f64) -> SpriteHandle {
		let handle = SpriteHandle(self.next_handle());
		let Some(element) = self.new_image() else { return handle };
		match self.textures.get(key) {
			Some(texture) => element.set_src(&texture.src()),
			None => warn!("[web] sprite uses texture {} which was never loaded", key),
		}
		element.set_draggable(false);
		if let Err(e) = self.container.append_child(&element) {
			error!("[web] failed to add sprite: {:?}", e);
			return handle;
		}
		self.sprites.insert(handle, SpriteNode {
			element,
			x,
			y,
			scale: 1.0,
			display_size: None,
			interactive: false,
		});
		self.restyle(handle);
		handle
	}

	fn set_scale(&mut self, sprite: SpriteHandle, factor: f64) {
		if let Some(node) = self.sprites.get_mut(&sprite) {
			node.scale = factor;
			node.display_size = None;
		}
		self.restyle(sprite);
	}

	fn set_display_size(&mut self, sprite: SpriteHandle, width: f64, height: f64) {
		if let Some(node) = self.sprites.get_mut(&sprite) {
			node.display_size = Some((width, height));
			node.scale = 1.0;
		}
		self.restyle(sprite);
	}

	fn set_interactive(&mut self, sprite: SpriteHandle) {
		let Some(node) = self.sprites.get_mut(&sprite) else { return };
		node.interactive = true;

		let input = self.input.clone();
		let closure = Closure::<dyn FnMut(MouseEvent)>::new(move |event: MouseEvent| {
			event.prevent_default();
			input.borrow_mut().push_back(InputEvent::PointerDown(sprite));
		});
		if let Err(e) = node.element.add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref()) {
			error!("[web] failed to listen on sprite {}: {:?}", sprite.0, e);
		}
		self.listeners.push(closure);
		self.restyle(sprite);
	}

	fn add_text(&mut self, x: f64, y: f64, style: &TextStyle) -> TextHandle {
		let handle = TextHandle(self.next_handle());
		let element = match self.document.create_element("div") {
			Ok(el) => el,
			Err(e) => {
				error!("[web] could not create text: {:?}", e);
				return handle;
			},
		};
		let offset = style.origin * 100.0;
		let mut css = format!(
			"position:absolute;left:{}px;top:{}px;transform:translate(-{}%,-{}%);white-space:nowrap;pointer-events:none;font-family:{};font-size:{}px;color:{};",
			x, y, offset, offset, style.font_family, style.font_size, style.fill
		);
		if let Some(stroke) = &style.stroke {
			css.push_str(&format!("-webkit-text-stroke:{}px {};paint-order:stroke fill;", style.stroke_thickness, stroke));
		}
		let added = element.set_attribute("style", &css).and_then(|_| self.container.append_child(&element).map(|_| ()));
		if let Err(e) = added {
			error!("[web] failed to add text: {:?}", e);
			return handle;
		}
		self.texts.insert(handle, element);
		handle
	}

	fn set_text(&mut self, text: TextHandle, value: &str) {
		if let Some(element) = self.texts.get(&text) {
			element.set_text_content(Some(value));
		}
	}

	fn clear(&mut self) {
		for node in self.sprites.values() {
			node.element.remove();
		}
		for element in self.texts.values() {
			element.remove();
		}
		self.sprites.clear();
		self.texts.clear();
		// the elements they were attached to are gone
		self.listeners.clear();
		self.input.borrow_mut().retain(|e| !matches!(e, InputEvent::PointerDown(_)));
	}
}

// ---------------------------------------------------------------------------
// Frame loop
// ---------------------------------------------------------------------------

/// One animation frame: queued input first, so clicks land before the tick
/// that follows them.
fn run_frame(input: &InputQueue, game: &mut Game, stage: &mut dyn Stage, now: f64) {
	// released before dispatch; clearing the stage borrows the queue again
	let pending: Vec<InputEvent> = input.borrow_mut().drain(..).collect();
	for event in pending {
		match event {
			InputEvent::PointerDown(sprite) => game.pointer_down(sprite, stage),
			InputEvent::PointerMove(x, y) => game.pointer_move(x, y, stage),
		}
	}
	game.tick(now, stage);
}

fn request_animation_frame(f: &Closure<dyn FnMut()>) {
	let requested = window().and_then(|w| w.request_animation_frame(f.as_ref().unchecked_ref()).map_err(|e| js_error("requestAnimationFrame", e)));
	if let Err(e) = requested {
		error!("[web] {:#}", e);
	}
}

/// Write the viewport fit as the `--scale` custom property on `<html>`,
/// leaving the rest of its inline style alone.
fn apply_viewport_scale(width: f64, height: f64) -> Result<f64> {
	let win = window()?;
	let vw = win.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(width);
	let vh = win.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(height);
	let scale = fit_scale(vw, vh, width, height);
	let root: HtmlElement = win
		.document()
		.and_then(|d| d.document_element())
		.ok_or_else(|| anyhow!("no document element"))?
		.dyn_into()
		.map_err(|_| anyhow!("document element is not HTML"))?;
	root.style()
		.set_property("--scale", &scale.to_string())
		.map_err(|e| js_error("--scale", e))?;
	Ok(scale)
}

fn install_resize_handler(config: &GameConfig) -> Result<()> {
	let (width, height) = (config.width, config.height);
	let resize = move || {
		if let Err(e) = apply_viewport_scale(width, height) {
			error!("[web] failed to set --scale: {:#}", e);
		}
	};
	resize();

	let closure = Closure::<dyn FnMut()>::new(resize);
	window()?
		.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())
		.map_err(|e| js_error("resize listener", e))?;
	closure.forget();
	Ok(())
}

/// Mount the game in the page and start ticking it every animation frame.
pub fn run(config: GameConfig, bundle: RoomBundle) -> Result<()> {
	install_resize_handler(&config)?;

	let input: InputQueue = Rc::new(RefCell::new(VecDeque::new()));
	let mut stage = WebStage::new(&config, input.clone())?;
	if config.debug_coordinates {
		stage.listen_pointer_move(config.width);
	}
	let performance = window()?.performance().ok_or_else(|| anyhow!("performance clock unavailable"))?;

	let mut game = Game::new(config, bundle)?;
	game.start(&mut stage);
	info!("[web] game mounted");

	let f: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let g = f.clone();

	*g.borrow_mut() = Some(Closure::new(move || {
		run_frame(&input, &mut game, &mut stage, performance.now());

		if let Some(next) = f.borrow().as_ref() {
			request_animation_frame(next);
		}
	}));

	if let Some(first) = g.borrow().as_ref() {
		request_animation_frame(first);
	}
	Ok(())
}
