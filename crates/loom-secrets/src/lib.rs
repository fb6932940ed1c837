// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Client-side secrets engine for Loom.
//!
//! The engine works out which application and environment a request
//! targets, opens that environment's envelope-encrypted keys, and performs
//! get/create/update/delete against a [`SecretsBackend`](loom_secrets_client::SecretsBackend).
//! Decrypted values can then be run through the [`ReferenceResolver`],
//! which expands `${...}` references to other secrets, possibly in other
//! paths, environments or applications.
//!
//! # Example
//!
//! ```no_run
//! use loom_secrets::{AppSelector, GetRequest, ResolutionCache, SecretsEngine};
//! use loom_secrets_client::Credential;
//! use loom_secrets_config::ClientSettings;
//!
//! # async fn run() -> loom_secrets::SecretsResult<()> {
//! let credential = Credential::parse("pss_service:v2:token:pubkey:share0:unwrapkey")?;
//! let engine = SecretsEngine::connect(&ClientSettings::default(), credential)?;
//!
//! let request = GetRequest::new(AppSelector::by_name("backend", "production"));
//! let mut cache = ResolutionCache::new();
//! for secret in engine.get_expanded(&request, &mut cache).await? {
//!     println!("{}={}", secret.key, secret.value);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod context;
pub mod dotenv;
pub mod dynamic;
pub mod engine;
pub mod envelope;
pub mod error;
pub mod reference;
pub mod resolve;
pub mod tags;
pub mod types;

pub use cache::{CacheKey, ResolutionCache};
pub use context::{select_application, select_environment, ContextResolver, ResolvedContext};
pub use dotenv::parse_env_pairs;
pub use dynamic::DynamicMaterializer;
pub use engine::{select_credential, SecretsEngine};
pub use envelope::{EnvelopeCodec, EnvironmentKeys};
pub use error::{SecretsError, SecretsResult};
pub use reference::{Reference, ReferenceError};
pub use resolve::{ReferenceResolver, SecretSource};
pub use tags::{normalize_tag, tag_matches};
pub use types::{
	normalize_path, AppSelector, CreateRequest, DeleteOutcome, DeleteRequest, GetRequest, NewSecret,
	NewValue, ResolvedSecret, UpdateOutcome, UpdateRequest, DEFAULT_ENVIRONMENT, ROOT_PATH,
};
