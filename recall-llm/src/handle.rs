//! Lazily built, resettable handle to the shared [`LlmClient`].
//!
//! One handle is created at the composition root and passed (as an `Arc`)
//! to every memory engine and agent. The client is built on first use and
//! reused afterwards; [`LlmHandle::reset`] drops it so the next call builds
//! a fresh one, e.g. after rotating credentials or between tests.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::client::LlmClient;
use crate::config::LlmConfig;
use crate::error::LlmError;

type ClientFactory = dyn Fn() -> Result<LlmClient, LlmError> + Send + Sync;

/// Shared access point for the process-wide LLM client.
pub struct LlmHandle {
    factory: Box<ClientFactory>,
    slot: RwLock<Option<Arc<LlmClient>>>,
}

impl LlmHandle {
    /// A handle that builds its client from `config`.
    #[must_use]
    pub fn from_config(config: LlmConfig) -> Self {
        Self::with_factory(move || LlmClient::from_config(&config))
    }

    /// A handle that builds its client with `factory`.
    #[must_use]
    pub fn with_factory<F>(factory: F) -> Self
    where
        F: Fn() -> Result<LlmClient, LlmError> + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            slot: RwLock::new(None),
        }
    }

    /// A handle that always hands out `client`, rebuilt by cloning after a reset.
    #[must_use]
    pub fn fixed(client: LlmClient) -> Self {
        Self::with_factory(move || Ok(client.clone()))
    }

    /// The shared client, building it on first use.
    ///
    /// # Errors
    /// Returns the factory's error if the client cannot be built. A failed
    /// build leaves the handle empty so the next call retries.
    pub fn get(&self) -> Result<Arc<LlmClient>, LlmError> {
        if let Some(client) = self.slot.read().as_ref() {
            return Ok(Arc::clone(client));
        }

        let mut slot = self.slot.write();
        if let Some(client) = slot.as_ref() {
            return Ok(Arc::clone(client));
        }
        let client = Arc::new((self.factory)()?);
        info!(provider = client.provider_name(), "LLM client constructed");
        *slot = Some(Arc::clone(&client));
        Ok(client)
    }

    /// Drop the current client; the next [`get`](Self::get) rebuilds it.
    /// Callers still holding the old `Arc` keep using it until they drop it.
    pub fn reset(&self) {
        if self.slot.write().take().is_some() {
            info!("LLM client reset");
        }
    }

    /// Whether a client is currently built.
    #[must_use]
    pub fn is_built(&self) -> bool {
        self.slot.read().is_some()
    }
}

impl fmt::Debug for LlmHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmHandle")
            .field("built", &self.is_built())
            .finish_non_exhaustive()
    }
}
