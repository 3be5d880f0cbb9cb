//! Lifecycle management for long-lived components
//!
//! Components that own external resources (broker sessions, pools) implement
//! [`ManagerLifecycle`] and are registered with a [`ManagerController`],
//! which starts them in registration order and stops them in reverse.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::{BoxError, CommonError, CommonResult, LifecyclePhase};

/// Boxed error returned by lifecycle hooks
pub type LifecycleError = BoxError;

/// Manager lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerStatus {
    /// Manager has been created but not initialized
    Created,
    /// Manager is initializing
    Initializing,
    /// Manager is running and operational
    Running,
    /// Manager is shutting down
    ShuttingDown,
    /// Manager has been shut down
    Shutdown,
    /// Manager encountered an error
    Error,
}

impl std::fmt::Display for ManagerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "Created"),
            Self::Initializing => write!(f, "Initializing"),
            Self::Running => write!(f, "Running"),
            Self::ShuttingDown => write!(f, "Shutting Down"),
            Self::Shutdown => write!(f, "Shutdown"),
            Self::Error => write!(f, "Error"),
        }
    }
}

/// Shared state container with async RwLock
#[derive(Debug)]
pub struct SharedState<T> {
    inner: Arc<RwLock<T>>,
    name: String,
}

impl<T> Clone for SharedState<T> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner), name: self.name.clone() }
    }
}

impl<T> SharedState<T> {
    /// Create a new shared state container
    pub fn new<S: Into<String>>(value: T, name: S) -> Self {
        Self { inner: Arc::new(RwLock::new(value)), name: name.into() }
    }

    /// Get a read lock on the state
    pub async fn read(&self) -> tokio::sync::RwLockReadGuard<'_, T> {
        self.inner.read().await
    }

    /// Get a write lock on the state
    pub async fn write(&self) -> tokio::sync::RwLockWriteGuard<'_, T> {
        self.inner.write().await
    }

    /// Read the state using a closure
    pub async fn read_with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        let guard = self.read().await;
        f(&*guard)
    }

    /// Replace the entire state
    pub async fn replace(&self, new_value: T) -> T {
        let mut guard = self.write().await;
        std::mem::replace(&mut *guard, new_value)
    }

    /// Get the state name for debugging
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<T: Clone> SharedState<T> {
    /// Get a clone of the current state
    pub async fn get(&self) -> T {
        self.read().await.clone()
    }
}

/// Lifecycle hooks driven by [`ManagerController`]
#[async_trait::async_trait]
pub trait ManagerLifecycle: Send + Sync {
    async fn initialize(&self) -> Result<(), LifecycleError>;
    async fn shutdown(&self) -> Result<(), LifecycleError>;
    fn name(&self) -> &str;
    async fn status(&self) -> ManagerStatus;
}

/// Manager lifecycle controller
///
/// Starts managers in registration order and shuts them down in reverse.
pub struct ManagerController {
    managers: Vec<Arc<dyn ManagerLifecycle>>,
    status: SharedState<ManagerStatus>,
}

impl ManagerController {
    /// Create a new manager controller
    pub fn new() -> Self {
        Self {
            managers: Vec::new(),
            status: SharedState::new(ManagerStatus::Created, "controller"),
        }
    }

    /// Add a manager to the controller
    pub fn add_manager(&mut self, manager: Arc<dyn ManagerLifecycle>) {
        self.managers.push(manager);
    }

    /// Number of registered managers
    pub fn len(&self) -> usize {
        self.managers.len()
    }

    /// Whether no manager is registered
    pub fn is_empty(&self) -> bool {
        self.managers.is_empty()
    }

    /// Initialize all managers in order, stopping at the first failure
    ///
    /// The failing manager's error is kept as the source of the returned
    /// [`CommonError::Lifecycle`].
    pub async fn initialize_all(&self) -> CommonResult<()> {
        self.status.replace(ManagerStatus::Initializing).await;

        for (i, manager) in self.managers.iter().enumerate() {
            tracing::info!("Initializing manager {}: {}", i, manager.name());

            if let Err(e) = manager.initialize().await {
                tracing::error!("Failed to initialize manager {}: {}", manager.name(), e);
                self.status.replace(ManagerStatus::Error).await;
                return Err(CommonError::lifecycle(manager.name(), LifecyclePhase::Initialize, e));
            }
        }

        self.status.replace(ManagerStatus::Running).await;
        Ok(())
    }

    /// Shutdown all managers in reverse order
    ///
    /// A failing manager is logged and the remaining ones are still shut
    /// down; the first failure is returned afterwards.
    pub async fn shutdown_all(&self) -> CommonResult<()> {
        self.status.replace(ManagerStatus::ShuttingDown).await;
        let mut first_error = None;

        for (i, manager) in self.managers.iter().enumerate().rev() {
            tracing::info!("Shutting down manager {}: {}", i, manager.name());

            if let Err(e) = manager.shutdown().await {
                tracing::error!("Failed to shutdown manager {}: {}", manager.name(), e);
                if first_error.is_none() {
                    first_error =
                        Some(CommonError::lifecycle(manager.name(), LifecyclePhase::Shutdown, e));
                }
            }
        }

        self.status.replace(ManagerStatus::Shutdown).await;
        first_error.map_or(Ok(()), Err)
    }

    /// Get controller status
    pub async fn status(&self) -> ManagerStatus {
        self.status.get().await
    }

    /// Get status of all managers
    pub async fn manager_statuses(&self) -> Vec<(String, ManagerStatus)> {
        let mut statuses = Vec::with_capacity(self.managers.len());
        for manager in &self.managers {
            statuses.push((manager.name().to_string(), manager.status().await));
        }
        statuses
    }
}

impl Default for ManagerController {
    fn default() -> Self {
        Self::new()
    }
}
