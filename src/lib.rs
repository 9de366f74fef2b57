//! Credential engine for administrator-approved signed licenses and OAuth 2.0
//! authorization-code grants with rotating refresh tokens.
//!
//! [`license::LicenseManager`] drives license requests from creation to an Ed25519-signed
//! license, [`tokens::TokenEngine`] issues and validates authorization codes and token pairs,
//! and both share one [`store::CredentialStore`]. [`poll::LicensePoller`] waits on a
//! decision from the client side, and [`wire`] adapts the engines to an HTTP binding.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod license;
pub mod obs;
pub mod poll;
pub mod store;
pub mod tokens;
pub mod wire;

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use oauth2;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
