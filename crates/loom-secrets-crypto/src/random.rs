// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Random secret value generation.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine;
use rand::distributions::{Alphanumeric, DistString};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::CryptoError;

/// Length used when the caller does not specify one.
pub const DEFAULT_RANDOM_LENGTH: usize = 32;

/// Shape of a generated secret value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RandomKind {
	Hex,
	Alphanumeric,
	Base64,
	Base64Url,
	/// 128-bit key, hex encoded. Ignores the requested length.
	Key128,
	/// 256-bit key, hex encoded. Ignores the requested length.
	Key256,
}

impl RandomKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			RandomKind::Hex => "hex",
			RandomKind::Alphanumeric => "alphanumeric",
			RandomKind::Base64 => "base64",
			RandomKind::Base64Url => "base64url",
			RandomKind::Key128 => "key128",
			RandomKind::Key256 => "key256",
		}
	}
}

impl fmt::Display for RandomKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for RandomKind {
	type Err = CryptoError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"hex" => Ok(RandomKind::Hex),
			"alphanumeric" => Ok(RandomKind::Alphanumeric),
			"base64" => Ok(RandomKind::Base64),
			"base64url" => Ok(RandomKind::Base64Url),
			"key128" => Ok(RandomKind::Key128),
			"key256" => Ok(RandomKind::Key256),
			other => Err(CryptoError::UnsupportedRandomKind(other.to_string())),
		}
	}
}

fn random_bytes(len: usize) -> Vec<u8> {
	let mut bytes = vec![0u8; len];
	OsRng.fill_bytes(&mut bytes);
	bytes
}

/// Generate a random secret value. A zero `length` means [`DEFAULT_RANDOM_LENGTH`].
pub fn generate_random_secret(kind: RandomKind, length: usize) -> String {
	let length = if length == 0 {
		DEFAULT_RANDOM_LENGTH
	} else {
		length
	};

	match kind {
		RandomKind::Hex => {
			let mut encoded = hex::encode(random_bytes(length / 2 + 1));
			encoded.truncate(length);
			encoded
		}
		RandomKind::Alphanumeric => Alphanumeric.sample_string(&mut OsRng, length),
		RandomKind::Base64 => {
			let mut encoded = STANDARD.encode(random_bytes(length));
			encoded.truncate(length);
			encoded
		}
		RandomKind::Base64Url => {
			let mut encoded = URL_SAFE.encode(random_bytes(length));
			encoded.truncate(length);
			encoded
		}
		RandomKind::Key128 => hex::encode(random_bytes(16)),
		RandomKind::Key256 => hex::encode(random_bytes(32)),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn fixed_size_keys_ignore_length() {
		assert_eq!(generate_random_secret(RandomKind::Key128, 5).len(), 32);
		assert_eq!(generate_random_secret(RandomKind::Key256, 5).len(), 64);
	}

	#[test]
	fn zero_length_uses_default() {
		assert_eq!(
			generate_random_secret(RandomKind::Alphanumeric, 0).len(),
			DEFAULT_RANDOM_LENGTH
		);
	}

	#[test]
	fn parses_kind_names() {
		assert_eq!("HEX".parse::<RandomKind>().unwrap(), RandomKind::Hex);
		assert_eq!(
			"base64url".parse::<RandomKind>().unwrap(),
			RandomKind::Base64Url
		);
		assert!("uuid".parse::<RandomKind>().is_err());
	}

	proptest! {
		#[test]
		fn variable_kinds_respect_length(length in 1usize..128) {
			for kind in [
				RandomKind::Hex,
				RandomKind::Alphanumeric,
				RandomKind::Base64,
				RandomKind::Base64Url,
			] {
				prop_assert_eq!(generate_random_secret(kind, length).len(), length);
			}
		}

		#[test]
		fn alphanumeric_output_is_alphanumeric(length in 1usize..64) {
			let value = generate_random_secret(RandomKind::Alphanumeric, length);
			prop_assert!(value.chars().all(|c| c.is_ascii_alphanumeric()));
		}
	}
}
