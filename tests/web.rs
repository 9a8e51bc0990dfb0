//! Browser-only checks. Run with `wasm-pack test --headless --firefox`.
#![cfg(target_arch = "wasm32")]

use bedroom_scene::{config::fit_scale, parse_str, world::build_room};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn shipped_assets_parse_in_the_browser() {
	let ast = parse_str(include_str!("../rooms/assets.sc")).expect("assets should parse");
	assert_eq!(ast.len(), 4);
	// assets alone are not a room
	assert!(build_room(&ast).is_err());
}

#[wasm_bindgen_test]
fn viewport_scale() {
	assert_eq!(fit_scale(800.0, 600.0, 1024.0, 768.0), 800.0 / 1024.0);
}
