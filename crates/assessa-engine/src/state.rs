//! Engine lifecycle management.
//!
//! Provides [`EngineHandle`], a cloneable, thread-safe holder for the
//! current [`Engine`] and its lifecycle state.
//!
//! # Design
//!
//! The engine itself is immutable. What changes over a process lifetime is
//! *which* engine is served: none while the corpus loads, one once it is
//! ready, and a new one after an explicit [`EngineHandle::reload`]. The
//! handle keeps that state behind a `tokio::sync::RwLock`; request handlers
//! call [`EngineHandle::current`], which clones the `Arc<Engine>` and
//! releases the lock before any query work starts.
//!
//! # Example
//!
//! ```rust,ignore
//! let handle = EngineHandle::new();
//! handle.reload(async { build_engine(&config).await }).await?;
//!
//! let engine = handle.current().await?;
//! let results = engine.retrieve("java developer", 10, RetrievalStrategy::Hybrid, true).await?;
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::RwLock;

use assessa_core::{Error, Result};

use crate::engine::Engine;

/// Lifecycle state of the served engine.
#[derive(Debug, Clone)]
pub enum EngineState {
    /// No engine has been built yet.
    Initializing,
    /// An engine is serving.
    Ready(Arc<Engine>),
    /// The initial build failed.
    Failed(String),
}

/// A summary of [`EngineState`] without the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineStatus {
    /// No engine has been built yet.
    Initializing,
    /// An engine is serving.
    Ready,
    /// The initial build failed, with its message.
    Failed(String),
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initializing => f.write_str("initializing"),
            Self::Ready => f.write_str("ready"),
            Self::Failed(msg) => write!(f, "failed: {msg}"),
        }
    }
}

/// Thread-safe handle to the served engine.
///
/// # Thread Safety
///
/// `EngineHandle` is `Clone`, `Send`, and `Sync`. Cloning is cheap (Arc
/// clone) and all clones observe the same state.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    state: Arc<RwLock<EngineState>>,
}

impl Default for EngineHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineHandle {
    /// Create a handle in the `Initializing` state.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(EngineState::Initializing)),
        }
    }

    /// Create a handle already serving `engine`.
    pub fn ready(engine: Engine) -> Self {
        Self {
            state: Arc::new(RwLock::new(EngineState::Ready(Arc::new(engine)))),
        }
    }

    /// The engine to run a query against.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotReady`] while initializing or after a failed
    /// initial build.
    pub async fn current(&self) -> Result<Arc<Engine>> {
        match &*self.state.read().await {
            EngineState::Ready(engine) => Ok(Arc::clone(engine)),
            EngineState::Initializing => Err(Error::not_ready("engine is still initializing")),
            EngineState::Failed(msg) => Err(Error::not_ready(format!(
                "engine failed to initialize: {msg}"
            ))),
        }
    }

    /// The current lifecycle status.
    pub async fn status(&self) -> EngineStatus {
        match &*self.state.read().await {
            EngineState::Initializing => EngineStatus::Initializing,
            EngineState::Ready(_) => EngineStatus::Ready,
            EngineState::Failed(msg) => EngineStatus::Failed(msg.clone()),
        }
    }

    /// Serve `engine` from now on.
    pub async fn set_ready(&self, engine: Engine) {
        *self.state.write().await = EngineState::Ready(Arc::new(engine));
    }

    /// Record a failed build.
    pub async fn set_failed(&self, message: impl Into<String>) {
        *self.state.write().await = EngineState::Failed(message.into());
    }

    /// Build a new engine and swap it in.
    ///
    /// `build` runs without holding the lock, so queries keep being served
    /// by the previous engine meanwhile. If the build fails and an engine is
    /// already serving, it stays in place; otherwise the state becomes
    /// `Failed`. Either way the build error is returned.
    pub async fn reload<F>(&self, build: F) -> Result<()>
    where
        F: Future<Output = Result<Engine>>,
    {
        match build.await {
            Ok(engine) => {
                self.set_ready(engine).await;
                log::info!("Engine reloaded");
                Ok(())
            }
            Err(e) => {
                let mut state = self.state.write().await;
                if matches!(*state, EngineState::Ready(_)) {
                    log::warn!("Engine reload failed, keeping the current engine: {e}");
                } else {
                    log::error!("Engine initialization failed: {e}");
                    *state = EngineState::Failed(e.to_string());
                }
                Err(e)
            }
        }
    }
}
