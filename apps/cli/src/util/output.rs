use crate::context::{Context, OutputFormat};

use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) {
	match serde_json::to_string_pretty(value) {
		Ok(json) => println!("{json}"),
		Err(e) => eprintln!("Failed to render output as JSON: {e}"),
	}
}

/// Print `value` as JSON, or through `human` for the human-readable format
pub fn print_output<T: Serialize>(ctx: &Context, value: &T, human: impl FnOnce(&T)) {
	match ctx.format {
		OutputFormat::Human => human(value),
		OutputFormat::Json => print_json(value),
	}
}
