// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Parsing of `KEY=value` files for bulk import.

use tracing::debug;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Quote {
	None,
	Single,
	Double,
}

/// Escape every `$` that dotenvy would treat as a substitution.
///
/// Imported values must keep `${...}` references verbatim and must never
/// pick up variables from the importing process's environment.
fn escape_substitutions(text: &str) -> String {
	let mut escaped = String::with_capacity(text.len());
	let mut quote = Quote::None;
	let mut chars = text.chars().peekable();
	let mut line_start = true;
	let mut after_space = false;

	while let Some(c) = chars.next() {
		match (quote, c) {
			(Quote::Single, '\'') | (Quote::Double, '"') => {
				quote = Quote::None;
				escaped.push(c);
			}
			(Quote::Single, _) => escaped.push(c),
			(Quote::None, '\'') => {
				quote = Quote::Single;
				escaped.push(c);
			}
			(Quote::None, '"') => {
				quote = Quote::Double;
				escaped.push(c);
			}
			(Quote::None, '#') if line_start || after_space => {
				escaped.push(c);
				while let Some(&next) = chars.peek() {
					if next == '\n' {
						break;
					}
					escaped.push(next);
					chars.next();
				}
			}
			(_, '\\') => {
				escaped.push(c);
				if let Some(next) = chars.next() {
					escaped.push(next);
				}
			}
			(_, '$') => escaped.push_str("\\$"),
			_ => escaped.push(c),
		}
		line_start = c == '\n';
		after_space = c.is_whitespace();
	}
	escaped
}

/// Parse dotenv-style text into `(KEY, value)` pairs in file order.
///
/// Syntax follows dotenvy (`export` prefixes, quoting, inline comments)
/// except that `$` is never substituted. Keys are uppercased. Lines that
/// fail to parse are skipped.
pub fn parse_env_pairs(text: &str) -> Vec<(String, String)> {
	let escaped = escape_substitutions(text);
	dotenvy::from_read_iter(escaped.as_bytes())
		.filter_map(|item| match item {
			Ok((key, value)) => Some((key.to_uppercase(), value)),
			Err(e) => {
				debug!(error = %e, "skipping unparsable env line");
				None
			}
		})
		.collect()
}
