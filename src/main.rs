//! Terminal runner: plays the loading screen against a simulated clock, then
//! lets you click around the room by typing commands.

use std::{
	env,
	io::{self, Write},
};

use anyhow::{Result, anyhow};
use bedroom_scene::{
	ROOM_FILE,
	config::GameConfig,
	init_logging, load_bundle,
	preprocessor::FsLoader,
	scene::{Game, SceneKey},
	stage::HeadlessStage,
};
use futures::executor::block_on;
use log::info;

const FRAME_MS: f64 = 16.0;

fn main() -> Result<()> {
	init_logging();

	let path = env::args().nth(1).unwrap_or_else(|| ROOM_FILE.to_string());
	let bundle = block_on(load_bundle(&path, &FsLoader))?;

	let mut stage = HeadlessStage::new();
	let mut game = Game::new(GameConfig::default(), bundle)?;
	game.start(&mut stage);

	let mut now = 0.0;
	while game.scene() == SceneKey::Preload {
		game.tick(now, &mut stage);
		now += FRAME_MS;
	}
	info!("Loaded after {}ms", now);

	describe_room(&game)?;
	loop {
		let Some(line) = read_player_command() else { break };
		let words: Vec<&str> = line.split_whitespace().collect();
		match words.as_slice() {
			[] => continue,
			["quit"] => {
				println!("Bye!");
				break;
			},
			["look"] => describe_room(&game)?,
			["inventory"] => show_inventory(&game)?,
			["wait", ms] => {
				let Ok(ms) = ms.parse::<f64>() else {
					println!("Wait how long?");
					continue;
				};
				let before = current_message(&game)?.to_owned();
				let until = now + ms.max(0.0);
				while now < until {
					now = (now + FRAME_MS).min(until);
					game.tick(now, &mut stage);
				}
				if !before.is_empty() && current_message(&game)?.is_empty() {
					println!("(the message fades)");
				}
			},
			["click" | "use" | "take", name @ ..] if !name.is_empty() => {
				let name = name.join(" ");
				let Some(sprite) = game.room().and_then(|room| room.sprite_of(&name)) else {
					println!("There is no '{}' here.", name);
					continue;
				};
				game.pointer_down(sprite, &mut stage);
				let message = current_message(&game)?;
				if !message.is_empty() {
					println!("\"{}\"", message);
				}
			},
			[verb, ..] => println!("I don't understand '{}'. Try look, click <object>, inventory, wait <ms> or quit.", verb),
		}
	}

	Ok(())
}

fn current_message(game: &Game) -> Result<&str> {
	game.room().map(|room| room.session().message()).ok_or_else(|| anyhow!("room is not active"))
}

fn describe_room(game: &Game) -> Result<()> {
	let room = game.room().ok_or_else(|| anyhow!("room is not active"))?;
	let names: Vec<&str> = room.session().objects().map(|o| o.id.as_str()).collect();
	println!();
	if names.is_empty() {
		println!("Nothing of interest here.");
	} else {
		println!("You see: {}.", names.join(", "));
	}
	Ok(())
}

fn show_inventory(game: &Game) -> Result<()> {
	let inventory = game.room().ok_or_else(|| anyhow!("room is not active"))?.session().inventory();
	if inventory.is_empty() {
		println!("Your pockets are empty.");
	} else {
		println!("You are carrying:");
		for item in inventory.iter() {
			println!(" – {}", item);
		}
	}
	Ok(())
}

fn read_player_command() -> Option<String> {
	print!(">> ");
	io::stdout().flush().ok()?;
	let mut buf = String::new();
	match io::stdin().read_line(&mut buf) {
		Ok(0) | Err(_) => None,
		Ok(_) => Some(buf.trim().to_lowercase()),
	}
}
