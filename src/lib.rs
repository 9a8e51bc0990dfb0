pub mod ast;
pub mod config;
pub mod interaction;
pub mod inventory;
pub mod message;
pub mod preprocessor;
pub mod progress;
pub mod scene;
pub mod stage;
pub mod timer;
pub mod web;
pub mod world;

use anyhow::{Context, Result, anyhow};
use ast::{AssetDeclaration, Object, PropertyAssignment, PropertyValue, Room, RoomItem, TopLevel};
use log::{debug, error, info};
use pest::Parser;
use preprocessor::{SourceLoader, preprocess};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use world::RoomBundle;


/// Room file fetched by the browser build, relative to the page.
pub const ROOM_FILE: &str = "rooms/girl_room.sc";

#[derive(pest_derive::Parser)]
#[grammar = "grammar.pest"]
struct RoomParser;

use pest::iterators::Pair;

fn unquote(raw: &str) -> String {
	let inner = &raw[1..raw.len() - 1];
	let mut out = String::with_capacity(inner.len());
	let mut chars = inner.chars();
	while let Some(c) = chars.next() {
		if c == '\\' {
			match chars.next() {
				Some('n') => out.push('\n'),
				Some(other) => out.push(other),
				None => {},
			}
		} else {
			out.push(c);
		}
	}
	out
}

fn parse_number(pair: Pair<Rule>) -> Result<f64> {
	pair.as_str().parse().with_context(|| format!("bad number '{}'", pair.as_str()))
}

fn parse_value(pair: Pair<Rule>) -> Result<PropertyValue> {
	Ok(match pair.as_rule() {
		Rule::number => PropertyValue::Number(parse_number(pair)?),
		Rule::string => PropertyValue::String(unquote(pair.as_str())),
		Rule::identifier => PropertyValue::Identifier(pair.as_str().to_string()),
		Rule::pair => {
			let mut inner = pair.into_inner();
			let x = parse_number(inner.next().ok_or_else(|| anyhow!("pair missing x"))?)?;
			let y = parse_number(inner.next().ok_or_else(|| anyhow!("pair missing y"))?)?;
			PropertyValue::Pair(x, y)
		},
		other => return Err(anyhow!("unexpected value {:?}", other)),
	})
}

fn parse_prop_assign(pair: Pair<Rule>) -> Result<PropertyAssignment> {
	let mut inner = pair.into_inner();
	let name = inner.next().ok_or_else(|| anyhow!("property missing name"))?.as_str().to_string();
	let value = parse_value(inner.next().ok_or_else(|| anyhow!("property '{}' missing value", name))?)?;
	Ok(PropertyAssignment { name, value })
}

fn parse_object(pair: Pair<Rule>) -> Result<Object> {
	let mut inner = pair.into_inner();
	let id = inner.next().ok_or_else(|| anyhow!("object missing id"))?.as_str().to_string();
	let mut properties = Vec::new();
	if let Some(block) = inner.next() {
		for prop in block.into_inner() {
			properties.push(parse_prop_assign(prop)?);
		}
	}
	Ok(Object { id, properties })
}

fn parse_room(pair: Pair<Rule>) -> Result<Room> {
	let mut inner = pair.into_inner();
	let id = inner.next().ok_or_else(|| anyhow!("room missing id"))?.as_str().to_string();
	let mut body = Vec::new();
	if let Some(block) = inner.next() {
		for item in block.into_inner() {
			match item.as_rule() {
				Rule::object_def => body.push(RoomItem::Object(parse_object(item)?)),
				Rule::prop_assign => body.push(RoomItem::Property(parse_prop_assign(item)?)),
				other => return Err(anyhow!("Unexpected '{:?}' in room {}", other, id)),
			}
		}
	}
	Ok(Room { id, body })
}

fn parse_asset(pair: Pair<Rule>) -> Result<AssetDeclaration> {
	let mut inner = pair.into_inner();
	let key = unquote(inner.next().ok_or_else(|| anyhow!("asset missing key"))?.as_str());
	let path = unquote(inner.next().ok_or_else(|| anyhow!("asset '{}' missing path", key))?.as_str());
	Ok(AssetDeclaration { key, path })
}


pub fn parse_str(input: &str) -> Result<Vec<TopLevel>> {
	let pairs = RoomParser::parse(Rule::file, input)?;
	let mut ast_nodes = Vec::new();

	for pair in pairs {
		if pair.as_rule() == Rule::file {
			for inner_pair in pair.into_inner() {
				match inner_pair.as_rule() {
					Rule::item => {
						for item_pair in inner_pair.into_inner() {
							match item_pair.as_rule() {
								Rule::asset_def => ast_nodes.push(TopLevel::Asset(parse_asset(item_pair)?)),
								Rule::room_def => ast_nodes.push(TopLevel::Room(parse_room(item_pair)?)),
								_ => {},
							}
						}
					},
					Rule::EOI => {},
					_ => {},
				}
			}
		}
	}

	Ok(ast_nodes)
}


/// Preprocess, parse and validate a room file.
pub async fn load_bundle<L: SourceLoader>(filename: &str, loader: &L) -> Result<RoomBundle> {
	let source = loader.load(filename).await?;

	// Phase 1: preprocess includes.
	let flattened = preprocess(filename, &source, loader).await?;
	debug!("Preprocessed content length: {} chars", flattened.len());

	// Phase 2: parse and build the room.
	let ast_nodes = match parse_str(&flattened) {
		Ok(ast) => ast,
		Err(e) => {
			error!("Parse error: {}", e);
			error!("Preprocessed content preview:");
			for (i, line) in flattened.lines().enumerate().take(50) {
				error!("{:3}: {}", i + 1, line);
			}
			return Err(e);
		},
	};
	debug!("Parsed successfully! AST nodes: {:?}", ast_nodes);

	let bundle = world::build_room(&ast_nodes).with_context(|| format!("Invalid room file {}", filename))?;
	info!("Room '{}' with {} objects and {} assets", bundle.room.id, bundle.room.objects.len(), bundle.assets.len());
	Ok(bundle)
}


#[wasm_bindgen]
pub fn start() {
	set_panic_hook();
	init_logging();
	info!("Starting bedroom scene...");
	spawn_local(async {
		let bundle = match load_bundle(ROOM_FILE, &web::FetchLoader).await {
			Ok(bundle) => bundle,
			Err(err) => {
				error!("Failed to load room: {:#}", err);
				return;
			},
		};
		if let Err(err) = web::run(config::GameConfig::default(), bundle) {
			error!("Failed to start game: {:#}", err);
		}
	});
}


pub fn set_panic_hook() {
	// When the `console_error_panic_hook` feature is enabled, we can call the
	// `set_panic_hook` function at least once during initialization, and then
	// we will get better error messages if our code ever panics.
	//
	// For more details see
	// https://github.com/rustwasm/console_error_panic_hook#readme
	#[cfg(feature = "console_error_panic_hook")]
	console_error_panic_hook::set_once();
}

pub fn init_logging() {
	#[cfg(target_arch = "wasm32")]
	{
		if console_log::init_with_level(log::Level::Debug).is_err() {
			web_sys::console::warn_1(&"console_log already initialised".into());
		}
	}

	#[cfg(not(target_arch = "wasm32"))]
	{
		if let Err(e) = env_logger::Builder::new().filter_level(log::LevelFilter::Info).parse_default_env().try_init() {
			// a logger is already installed, so this still reaches it
			log::warn!("env_logger not installed: {}", e);
		}
	}
}


#[cfg(test)]
mod tests {
	use super::*;
	use futures::executor::block_on;

	fn parse_ok(src: &str) -> Vec<TopLevel> {
		parse_str(src).expect("parse failed")
	}

	fn parse_err(src: &str) {
		assert!(parse_str(src).is_err());
	}

	#[test]
	fn asset_declaration() {
		let ast = parse_ok(r#"asset "girl-bedroom" = "assets/img/scenes/girls-bedroom.png";"#);
		assert_eq!(
			ast,
			vec![TopLevel::Asset(AssetDeclaration {
				key: "girl-bedroom".to_string(),
				path: "assets/img/scenes/girls-bedroom.png".to_string(),
			})]
		);
	}

	#[test]
	fn room_with_property_and_object() {
		let src = r#"room Kitchen {
    background = "kitchen";
    object fridge {
        position = { 10, -2.5 };
        scale = 0.12;
        requires = key;
    }
}"#;
		let ast = parse_ok(src);
		let [TopLevel::Room(room)] = ast.as_slice() else { panic!("expected one room") };
		assert_eq!(room.id, "Kitchen");
		assert_eq!(room.body.len(), 2);

		let RoomItem::Property(bg) = &room.body[0] else { panic!("expected property") };
		assert_eq!(bg.name, "background");
		assert_eq!(bg.value, PropertyValue::String("kitchen".into()));

		let RoomItem::Object(fridge) = &room.body[1] else { panic!("expected object") };
		assert_eq!(fridge.id, "fridge");
		let values: Vec<_> = fridge.properties.iter().map(|p| (p.name.as_str(), p.value.clone())).collect();
		assert_eq!(
			values,
			vec![
				("position", PropertyValue::Pair(10.0, -2.5)),
				("scale", PropertyValue::Number(0.12)),
				("requires", PropertyValue::Identifier("key".into())),
			]
		);
	}

	#[test]
	fn empty_object_block() {
		let ast = parse_ok("room R { object thing {} }");
		let [TopLevel::Room(room)] = ast.as_slice() else { panic!() };
		let [RoomItem::Object(obj)] = room.body.as_slice() else { panic!() };
		assert!(obj.properties.is_empty());
	}

	#[test]
	fn string_escapes_and_apostrophes() {
		let ast = parse_ok(r#"room R { object o { message = "It's \"dirty\"\\"; } }"#);
		let [TopLevel::Room(room)] = ast.as_slice() else { panic!() };
		let [RoomItem::Object(obj)] = room.body.as_slice() else { panic!() };
		assert_eq!(obj.properties[0].value, PropertyValue::String("It's \"dirty\"\\".into()));
	}

	#[test]
	fn comments_are_ignored() {
		let src = r#"// single line comment
room R {
    /* multi-line
       comment */
    background = "bg"; // trailing
}
"#;
		let ast = parse_ok(src);
		let [TopLevel::Room(room)] = ast.as_slice() else { panic!() };
		assert_eq!(room.body.len(), 1);
	}

	#[test]
	fn invalid_missing_semicolon() {
		parse_err(r#"room R { background = "bg" }"#);
	}

	#[test]
	fn invalid_unclosed_block() {
		parse_err("room R {");
	}

	#[test]
	fn invalid_nested_room() {
		parse_err("room R { room S { } }");
	}

	#[test]
	fn invalid_include_left_in_source() {
		parse_err("#include \"assets.sc\"\nroom R {}");
	}

	#[test]
	fn parse_shipped_assets() {
		let ast = parse_ok(include_str!("../rooms/assets.sc"));
		assert_eq!(ast.len(), 4);
		assert!(ast.iter().all(|tl| matches!(tl, TopLevel::Asset(_))));
	}

	#[test]
	fn init_logging_can_run_twice() {
		// the second call finds a logger in place and warns instead of panicking
		init_logging();
		init_logging();
	}

	#[test]
	fn load_shipped_bundle() {
		let path = format!("{}/{}", env!("CARGO_MANIFEST_DIR"), ROOM_FILE);
		let bundle = block_on(load_bundle(&path, &preprocessor::FsLoader)).expect("shipped room should load");
		let ids: Vec<_> = bundle.room.objects.keys().map(String::as_str).collect();
		assert_eq!(ids, ["blanket", "slinky", "pen"]);
		assert_eq!(bundle.room.objects["blanket"].required_item.as_deref(), Some("pen"));
		assert_eq!(bundle.room.objects["pen"].grants_item.as_deref(), Some("pen"));
		assert!(bundle.assets.iter().any(|a| a.key == "girl-bedroom"));
	}
}
