#[derive(Debug, Clone, PartialEq)]
pub enum TopLevel {
	Asset(AssetDeclaration),
	Room(Room),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssetDeclaration {
	pub key: String,
	pub path: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Room {
	pub id: String,
	pub body: Vec<RoomItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RoomItem {
	Property(PropertyAssignment),
	Object(Object),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Object {
	pub id: String,
	pub properties: Vec<PropertyAssignment>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyAssignment {
	pub name: String,
	pub value: PropertyValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
	Number(f64),
	String(String),
	Identifier(String),
	Pair(f64, f64),
}

impl PropertyValue {
	pub fn kind(&self) -> &'static str {
		match self {
			PropertyValue::Number(_) => "number",
			PropertyValue::String(_) => "string",
			PropertyValue::Identifier(_) => "identifier",
			PropertyValue::Pair(..) => "pair",
		}
	}
}
