//! Session-scoped HTTP client gateway: tags every request with a bearer credential and a
//! session identifier, and funnels concurrent `401 Unauthorized` responses into a single
//! credential-refresh cycle whose outcome every waiting caller shares.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod error;
pub mod ext;
pub mod gateway;
pub mod http;
pub mod obs;
pub mod store;
#[doc(hidden)]
pub mod _preludet {
	//! Convenience re-exports and helpers shared by integration tests.

	pub use crate::_prelude::*;

	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use crate::ext::{LogoutHandler, LogoutReason};
	#[cfg(feature = "reqwest")]
	use crate::{
		config::GatewayConfig,
		gateway::AuthGateway,
		http::ReqwestTransport,
		store::{MemoryStore, SessionStore},
	};

	/// Gateway type alias used by reqwest-backed integration tests.
	#[cfg(feature = "reqwest")]
	pub type ReqwestTestGateway = AuthGateway<ReqwestTransport>;

	/// Logout collaborator that counts invocations and remembers the last reason.
	#[derive(Debug, Default)]
	pub struct CountingLogout {
		calls: AtomicUsize,
		last: Mutex<Option<LogoutReason>>,
	}
	impl CountingLogout {
		/// Number of times the gateway invoked the collaborator.
		pub fn calls(&self) -> usize {
			self.calls.load(Ordering::SeqCst)
		}

		/// Reason passed on the most recent invocation.
		pub fn last_reason(&self) -> Option<LogoutReason> {
			*self.last.lock()
		}
	}
	impl LogoutHandler for CountingLogout {
		fn on_logout(&self, reason: LogoutReason) {
			self.calls.fetch_add(1, Ordering::SeqCst);
			*self.last.lock() = Some(reason);
		}
	}

	/// Builds a gateway pointed at `base_url` with an in-memory store and a counting logout
	/// collaborator.
	#[cfg(feature = "reqwest")]
	pub fn build_reqwest_test_gateway(
		base_url: &str,
	) -> (ReqwestTestGateway, Arc<MemoryStore>, Arc<CountingLogout>) {
		let config = GatewayConfig::builder(
			Url::parse(base_url).expect("Test base URL should parse successfully."),
		)
		.build()
		.expect("Test gateway configuration should be valid.");
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn SessionStore> = store_backend.clone();
		let logout = Arc::new(CountingLogout::default());
		let transport =
			ReqwestTransport::new().expect("Failed to build Reqwest transport for tests.");
		let gateway = AuthGateway::with_transport(config, transport)
			.with_store(store)
			.with_logout_handler(logout.clone());

		(gateway, store_backend, logout)
	}
}

mod _prelude {
	pub use std::{
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

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
