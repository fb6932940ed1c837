// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! X25519 session key exchange.
//!
//! Both sides hash `X25519(sk, peer_pk) || client_pk || server_pk` with
//! BLAKE2b-512 and split the 64-byte output in half. The client transmits with
//! the upper half and the server receives with it, matching libsodium's
//! `crypto_kx_*_session_keys`.

use blake2::{Blake2b512, Digest};
use zeroize::Zeroizing;

use crate::error::{CryptoError, CryptoResult};
use crate::keys::{KeyPair, PublicKey, KEY_SIZE};

/// Directional symmetric keys for one exchange.
pub(crate) struct SessionKeys {
	pub rx: Zeroizing<[u8; KEY_SIZE]>,
	pub tx: Zeroizing<[u8; KEY_SIZE]>,
}

fn session_hash(
	local: &KeyPair,
	peer: &PublicKey,
	client_pk: &PublicKey,
	server_pk: &PublicKey,
) -> CryptoResult<Zeroizing<[u8; 2 * KEY_SIZE]>> {
	let shared = local.private.static_secret().diffie_hellman(&peer.dalek());
	if !shared.was_contributory() {
		return Err(CryptoError::NonContributory);
	}

	let mut hasher = Blake2b512::new();
	hasher.update(shared.as_bytes());
	hasher.update(client_pk.as_bytes());
	hasher.update(server_pk.as_bytes());

	let mut out = Zeroizing::new([0u8; 2 * KEY_SIZE]);
	out.copy_from_slice(&hasher.finalize());
	Ok(out)
}

fn split(hash: &[u8; 2 * KEY_SIZE]) -> (Zeroizing<[u8; KEY_SIZE]>, Zeroizing<[u8; KEY_SIZE]>) {
	let mut lower = Zeroizing::new([0u8; KEY_SIZE]);
	let mut upper = Zeroizing::new([0u8; KEY_SIZE]);
	lower.copy_from_slice(&hash[..KEY_SIZE]);
	upper.copy_from_slice(&hash[KEY_SIZE..]);
	(lower, upper)
}

pub(crate) fn client_session_keys(
	client: &KeyPair,
	server_pk: &PublicKey,
) -> CryptoResult<SessionKeys> {
	let hash = session_hash(client, server_pk, &client.public, server_pk)?;
	let (rx, tx) = split(&hash);
	Ok(SessionKeys { rx, tx })
}

pub(crate) fn server_session_keys(
	server: &KeyPair,
	client_pk: &PublicKey,
) -> CryptoResult<SessionKeys> {
	let hash = session_hash(server, client_pk, client_pk, &server.public)?;
	let (tx, rx) = split(&hash);
	Ok(SessionKeys { rx, tx })
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn client_tx_matches_server_rx() {
		let client = KeyPair::generate();
		let server = KeyPair::generate();

		let c = client_session_keys(&client, &server.public).unwrap();
		let s = server_session_keys(&server, &client.public).unwrap();

		assert_eq!(*c.tx, *s.rx);
		assert_eq!(*c.rx, *s.tx);
		assert_ne!(*c.tx, *c.rx);
	}

	#[test]
	fn low_order_peer_is_rejected() {
		let client = KeyPair::generate();
		let zero = PublicKey::from_bytes([0u8; KEY_SIZE]);
		assert!(matches!(
			client_session_keys(&client, &zero),
			Err(CryptoError::NonContributory)
		));
	}
}
