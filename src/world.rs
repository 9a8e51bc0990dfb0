//! Room configuration built from the parsed room file once at start-up.

use indexmap::{IndexMap, IndexSet};
use log::warn;
use thiserror::Error;

use crate::ast::{AssetDeclaration, PropertyAssignment, PropertyValue, RoomItem, TopLevel};

// ---------------------------------------------------------------------------
// Runtime definitions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct InteractiveObject {
	pub id: String,
	pub texture: String,
	pub x: f64,
	pub y: f64,
	pub scale: f64,
	pub message: String,
	/// Item that must be held before the object reacts.
	pub required_item: Option<String>,
	/// Item picked up when the object is used.
	pub grants_item: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoomDef {
	pub id: String,
	pub background: String,
	pub objects: IndexMap<String, InteractiveObject>,
}

/// Everything the two scenes need: what to preload and how the room looks.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomBundle {
	pub assets: Vec<AssetDeclaration>,
	pub room: RoomDef,
}

#[derive(Debug, Error, PartialEq)]
pub enum RoomError {
	#[error("no room defined")]
	NoRoom,
	#[error("only one room is supported, found '{0}' and '{1}'")]
	MultipleRooms(String, String),
	#[error("asset '{0}' declared twice")]
	DuplicateAsset(String),
	#[error("object '{0}' declared twice")]
	DuplicateObject(String),
	#[error("{owner} is missing property '{property}'")]
	MissingProperty { owner: String, property: &'static str },
	#[error("{owner}: property '{property}' expects {expected}, got {found}")]
	InvalidValue {
		owner: String,
		property: String,
		expected: &'static str,
		found: &'static str,
	},
	#[error("{owner} uses texture '{texture}' which is not a declared asset")]
	UnknownTexture { owner: String, texture: String },
}

// ---------------------------------------------------------------------------
// Building
// ---------------------------------------------------------------------------

pub fn build_room(ast: &[TopLevel]) -> Result<RoomBundle, RoomError> {
	let mut assets = Vec::new();
	let mut asset_keys = IndexSet::new();
	let mut room_ast = None;

	for tl in ast {
		match tl {
			TopLevel::Asset(decl) => {
				if !asset_keys.insert(decl.key.clone()) {
					return Err(RoomError::DuplicateAsset(decl.key.clone()));
				}
				assets.push(decl.clone());
			},
			TopLevel::Room(room) => match room_ast {
				None => room_ast = Some(room),
				Some(first) => return Err(RoomError::MultipleRooms(first.id.clone(), room.id.clone())),
			},
		}
	}

	let room_ast = room_ast.ok_or(RoomError::NoRoom)?;
	let room_owner = format!("room '{}'", room_ast.id);

	let mut background = None;
	let mut objects = IndexMap::new();
	for item in &room_ast.body {
		match item {
			RoomItem::Property(p) if p.name == "background" => background = Some(texture_key(&room_owner, p)?),
			RoomItem::Property(p) => warn!("[room] {} ignores unknown property '{}'", room_owner, p.name),
			RoomItem::Object(o) => {
				if objects.contains_key(&o.id) {
					return Err(RoomError::DuplicateObject(o.id.clone()));
				}
				let def = build_object(&o.id, &o.properties)?;
				objects.insert(o.id.clone(), def);
			},
		}
	}

	let background = background.ok_or_else(|| RoomError::MissingProperty {
		owner: room_owner.clone(),
		property: "background",
	})?;
	check_texture(&asset_keys, &room_owner, &background)?;
	for obj in objects.values() {
		check_texture(&asset_keys, &format!("object '{}'", obj.id), &obj.texture)?;
	}

	Ok(RoomBundle {
		assets,
		room: RoomDef {
			id: room_ast.id.clone(),
			background,
			objects,
		},
	})
}

fn build_object(id: &str, properties: &[PropertyAssignment]) -> Result<InteractiveObject, RoomError> {
	let owner = format!("object '{}'", id);
	let mut texture = None;
	let mut position = None;
	let mut scale = 1.0;
	let mut message = None;
	let mut required_item = None;
	let mut grants_item = None;

	for p in properties {
		match p.name.as_str() {
			"image" => texture = Some(texture_key(&owner, p)?),
			"position" => match p.value {
				PropertyValue::Pair(x, y) => position = Some((x, y)),
				ref other => return Err(invalid(&owner, p, "a { x, y } pair", other)),
			},
			"scale" => match p.value {
				PropertyValue::Number(n) => scale = n,
				ref other => return Err(invalid(&owner, p, "a number", other)),
			},
			"message" => match &p.value {
				PropertyValue::String(s) => message = Some(s.clone()),
				other => return Err(invalid(&owner, p, "a string", other)),
			},
			"requires" => required_item = Some(item_name(&owner, p)?),
			"grants" => grants_item = Some(item_name(&owner, p)?),
			other => warn!("[room] {} ignores unknown property '{}'", owner, other),
		}
	}

	let missing = |property| RoomError::MissingProperty {
		owner: owner.clone(),
		property,
	};
	let texture = texture.ok_or_else(|| missing("image"))?;
	let (x, y) = position.ok_or_else(|| missing("position"))?;
	let message = message.ok_or_else(|| missing("message"))?;

	Ok(InteractiveObject {
		id: id.to_owned(),
		texture,
		x,
		y,
		scale,
		message,
		required_item,
		grants_item,
	})
}

fn texture_key(owner: &str, p: &PropertyAssignment) -> Result<String, RoomError> {
	match &p.value {
		PropertyValue::String(s) => Ok(s.clone()),
		other => Err(invalid(owner, p, "a texture key string", other)),
	}
}

// Item names may be written bare (`requires = pen;`) or quoted.
fn item_name(owner: &str, p: &PropertyAssignment) -> Result<String, RoomError> {
	match &p.value {
		PropertyValue::Identifier(s) | PropertyValue::String(s) => Ok(s.clone()),
		other => Err(invalid(owner, p, "an item name", other)),
	}
}

fn check_texture(assets: &IndexSet<String>, owner: &str, texture: &str) -> Result<(), RoomError> {
	if assets.contains(texture) {
		Ok(())
	} else {
		Err(RoomError::UnknownTexture {
			owner: owner.to_owned(),
			texture: texture.to_owned(),
		})
	}
}

fn invalid(owner: &str, p: &PropertyAssignment, expected: &'static str, found: &PropertyValue) -> RoomError {
	RoomError::InvalidValue {
		owner: owner.to_owned(),
		property: p.name.clone(),
		expected,
		found: found.kind(),
	}
}


#[cfg(test)]
mod tests {
	use super::*;
	use crate::parse_str;

	fn build(src: &str) -> Result<RoomBundle, RoomError> {
		build_room(&parse_str(src).expect("parse failed"))
	}

	const ASSETS: &str = r#"
asset "bg" = "bg.png";
asset "pen" = "pen.png";
"#;

	#[test]
	fn builds_objects_in_declaration_order() {
		let src = format!(
			r#"{ASSETS}
room R {{
    background = "bg";
    object b {{ image = "pen"; position = {{ 1, 2 }}; message = "B"; }}
    object a {{ image = "pen"; position = {{ 3, 4 }}; scale = 0.5; message = "A"; requires = key; grants = "pen"; }}
}}"#
		);
		let bundle = build(&src).unwrap();
		assert_eq!(bundle.assets.len(), 2);
		assert_eq!(bundle.room.background, "bg");
		let ids: Vec<_> = bundle.room.objects.keys().map(String::as_str).collect();
		assert_eq!(ids, ["b", "a"]);

		let b = &bundle.room.objects["b"];
		assert_eq!(b.scale, 1.0);
		assert_eq!(b.required_item, None);

		let a = &bundle.room.objects["a"];
		assert_eq!((a.x, a.y, a.scale), (3.0, 4.0, 0.5));
		assert_eq!(a.required_item.as_deref(), Some("key"));
		assert_eq!(a.grants_item.as_deref(), Some("pen"));
	}

	#[test]
	fn missing_room() {
		assert_eq!(build(ASSETS), Err(RoomError::NoRoom));
	}

	#[test]
	fn second_room_rejected() {
		let src = format!("{ASSETS} room A {{ background = \"bg\"; }} room B {{ background = \"bg\"; }}");
		assert_eq!(build(&src), Err(RoomError::MultipleRooms("A".into(), "B".into())));
	}

	#[test]
	fn duplicate_object_rejected() {
		let src = format!(
			r#"{ASSETS} room R {{ background = "bg";
    object a {{ image = "pen"; position = {{ 1, 2 }}; message = "A"; }}
    object a {{ image = "pen"; position = {{ 1, 2 }}; message = "A"; }}
}}"#
		);
		assert_eq!(build(&src), Err(RoomError::DuplicateObject("a".into())));
	}

	#[test]
	fn duplicate_asset_rejected() {
		let src = "asset \"x\" = \"1.png\"; asset \"x\" = \"2.png\";";
		assert_eq!(build(src), Err(RoomError::DuplicateAsset("x".into())));
	}

	#[test]
	fn missing_message_rejected() {
		let src = format!(r#"{ASSETS} room R {{ background = "bg"; object a {{ image = "pen"; position = {{ 1, 2 }}; }} }}"#);
		assert_eq!(
			build(&src),
			Err(RoomError::MissingProperty {
				owner: "object 'a'".into(),
				property: "message",
			})
		);
	}

	#[test]
	fn wrong_value_kind_rejected() {
		let src = format!(r#"{ASSETS} room R {{ background = "bg"; object a {{ image = "pen"; position = 4; message = "A"; }} }}"#);
		let Err(RoomError::InvalidValue { property, found, .. }) = build(&src) else {
			panic!("expected invalid value");
		};
		assert_eq!(property, "position");
		assert_eq!(found, "number");
	}

	#[test]
	fn undeclared_texture_rejected() {
		let src = format!(r#"{ASSETS} room R {{ background = "nope"; }}"#);
		assert_eq!(
			build(&src),
			Err(RoomError::UnknownTexture {
				owner: "room 'R'".into(),
				texture: "nope".into(),
			})
		);
	}

	#[test]
	fn unknown_properties_are_ignored() {
		let src = format!(r#"{ASSETS} room R {{ background = "bg"; music = "none"; object a {{ image = "pen"; position = {{ 1, 2 }}; message = "A"; hue = 3; }} }}"#);
		assert!(build(&src).is_ok());
	}
}
