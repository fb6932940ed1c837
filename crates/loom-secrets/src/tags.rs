// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

/// Lowercase a tag and treat underscores as spaces.
pub fn normalize_tag(tag: &str) -> String {
	tag.replace('_', " ").to_lowercase()
}

/// Whether any of `tags` contains `filter` after normalizing both.
pub fn tag_matches(tags: &[String], filter: &str) -> bool {
	let wanted = normalize_tag(filter);
	tags.iter().any(|tag| normalize_tag(tag).contains(&wanted))
}
