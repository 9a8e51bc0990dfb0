use std::{collections::HashSet, future::Future};

use anyhow::{Context, Result, anyhow};
use async_recursion::async_recursion;

/// Source of included files. The browser build fetches over HTTP, the
/// terminal runner reads from disk.
pub trait SourceLoader {
	fn load(&self, name: &str) -> impl Future<Output = Result<String>>;
}

/// Reads includes from the local filesystem.
pub struct FsLoader;

impl SourceLoader for FsLoader {
	async fn load(&self, name: &str) -> Result<String> {
		std::fs::read_to_string(name).with_context(|| format!("Failed to read {}", name))
	}
}

/// Flatten an entry source file by inlining all `#include` directives.
pub async fn preprocess<L: SourceLoader>(filename: &str, src: &str, loader: &L) -> Result<String> {
	let mut visited = HashSet::<String>::new();
	inline_file(filename, src, loader, &mut visited).await
}

#[async_recursion(?Send)]
async fn inline_file<L: SourceLoader>(filename: &str, src: &str, loader: &L, visited: &mut HashSet<String>) -> Result<String> {
	if !visited.insert(filename.to_owned()) {
		// Already processed – prevents cyclic includes.
		return Ok(String::new());
	}

	let mut out = String::new();
	for (lineno, line) in src.lines().enumerate() {
		let trimmed = line.trim_start();
		if let Some(rest) = trimmed.strip_prefix("#include") {
			// Extract quoted path even when a trailing comment is present.
			let rest = rest.trim();
			let first_q = rest.find('"').ok_or_else(|| malformed(filename, lineno, line))?;
			let after = &rest[first_q + 1..];
			let second_q = after.find('"').ok_or_else(|| malformed(filename, lineno, line))?;
			let include_name = resolve_include(filename, &after[..second_q]);
			if visited.contains(&include_name) {
				continue;
			}

			let included = loader.load(&include_name).await?;
			let flattened = inline_file(&include_name, &included, loader, visited)
				.await
				.with_context(|| format!("Error processing include: {}", include_name))?;
			out.push_str(&flattened);
		} else {
			out.push_str(line);
			out.push('\n');
		}
	}

	Ok(out)
}

/// Includes are relative to the directory of the including file unless they
/// start with `/`.
pub fn resolve_include(current: &str, include: &str) -> String {
	if include.starts_with('/') {
		return include.to_owned();
	}
	match current.rfind('/') {
		Some(idx) => format!("{}/{}", &current[..idx], include),
		None => include.to_owned(),
	}
}

fn malformed(filename: &str, lineno: usize, line: &str) -> anyhow::Error {
	anyhow!("Malformed #include in {} on line {}: {}", filename, lineno + 1, line)
}
