//! Bridge supervisor for managing the listener lifecycle.
//!
//! The BridgeSupervisor owns the bridge state internally, using
//! tokio::sync::Mutex for async-safe access. Hosts (the CLI, an editor
//! extension shell) call methods on the supervisor without storing
//! handles themselves.
//!
//! - **Discover-then-bind**: start refuses to listen when no upstream model
//!   is available
//! - **Bind-then-report**: TcpListener binds FIRST, then reports real address
//! - **Crash detection**: status() uses the cancellation token to tell a clean
//!   stop from a crash

use std::fmt;
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result as AnyResult;
use lmbridge_core::{BridgeLogSink, BridgeSettings, ChatModelProvider, SettingsError};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Grace period for in-flight requests on stop.
const STOP_GRACE: Duration = Duration::from_secs(5);

/// Handle to a running bridge listener.
struct BridgeHandle {
    /// Cancellation token for graceful shutdown.
    cancel_token: CancellationToken,
    /// Join handle for the server task.
    join_handle: JoinHandle<AnyResult<()>>,
    /// Address the bridge is bound to.
    bound_addr: SocketAddr,
}

/// Status of the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeStatus {
    /// Bridge is not running.
    Stopped,
    /// Bridge is running and listening.
    Running {
        /// Address the bridge is listening on.
        address: SocketAddr,
    },
    /// Server task ended without being asked to.
    Crashed,
}

impl BridgeStatus {
    pub const fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }
}

impl fmt::Display for BridgeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "stopped"),
            Self::Running { address } => write!(f, "running on port {}", address.port()),
            Self::Crashed => write!(f, "crashed"),
        }
    }
}

/// Error from supervisor operations.
#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    /// Bridge is already running.
    #[error("Bridge is already running on {0}")]
    AlreadyRunning(SocketAddr),

    /// Settings failed validation.
    #[error(transparent)]
    InvalidSettings(#[from] SettingsError),

    /// No upstream chat model could be discovered.
    #[error("No upstream chat models are available: {0}")]
    UpstreamUnavailable(String),

    /// Another process holds the port.
    #[error("Port {port} is already in use. Change the bridge port setting and start again.")]
    PortInUse { port: u16 },

    /// Failed to bind to address.
    #[error("Failed to bind to {address}: {reason}")]
    BindFailed { address: String, reason: String },

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Supervisor for the bridge listener.
///
/// # Example
///
/// ```ignore
/// let supervisor = BridgeSupervisor::new(log);
/// let addr = supervisor.start(settings, provider).await?;
/// println!("Bridge {}", supervisor.status().await);
/// supervisor.stop().await?;
/// ```
pub struct BridgeSupervisor {
    /// Internal state protected by async mutex.
    handle: Mutex<Option<BridgeHandle>>,
    /// Event trail shared with the server.
    log: Arc<dyn BridgeLogSink>,
}

impl BridgeSupervisor {
    /// Create a supervisor recording events to `log`.
    #[must_use]
    pub fn new(log: Arc<dyn BridgeLogSink>) -> Self {
        Self {
            handle: Mutex::new(None),
            log,
        }
    }

    /// Start the bridge.
    ///
    /// Validates settings, checks that at least one upstream model is
    /// discoverable, then binds `127.0.0.1:port` and spawns the server task.
    /// Every failure leaves the bridge stopped.
    ///
    /// # Errors
    ///
    /// Returns error if already running, if no model is available, or if
    /// bind fails.
    pub async fn start(
        &self,
        settings: BridgeSettings,
        provider: Arc<dyn ChatModelProvider>,
    ) -> Result<SocketAddr, SupervisorError> {
        let mut guard = self.handle.lock().await;

        if let Some(old) = guard.take() {
            if !old.join_handle.is_finished() {
                // Still running - put it back and error
                let addr = old.bound_addr;
                *guard = Some(old);
                return Err(SupervisorError::AlreadyRunning(addr));
            }
            match old.join_handle.await {
                Ok(Ok(())) => debug!("Previous bridge task completed normally"),
                Ok(Err(e)) => warn!("Previous bridge task ended with error: {e}"),
                Err(e) => warn!("Previous bridge task panicked: {e}"),
            }
        }

        settings.validate()?;

        let result = self.launch(settings, provider).await;
        match result {
            Ok(handle) => {
                let addr = handle.bound_addr;
                *guard = Some(handle);
                Ok(addr)
            }
            Err(e) => {
                self.log.record(&format!("Start failed: {e}"));
                Err(e)
            }
        }
    }

    async fn launch(
        &self,
        settings: BridgeSettings,
        provider: Arc<dyn ChatModelProvider>,
    ) -> Result<BridgeHandle, SupervisorError> {
        let models = provider
            .list_models()
            .await
            .map_err(|e| SupervisorError::UpstreamUnavailable(e.to_string()))?;
        if models.is_empty() {
            return Err(SupervisorError::UpstreamUnavailable(
                "the provider reported no chat models".to_string(),
            ));
        }
        debug!(count = models.len(), "Upstream models discovered");

        // Bind FIRST - get real address before spawning
        let port = settings.port;
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, port))
            .await
            .map_err(|e| bind_error(port, &e))?;

        let bound_addr = listener
            .local_addr()
            .map_err(|e| SupervisorError::Internal(format!("Failed to get local address: {e}")))?;

        info!("Bridge bound to {bound_addr}");
        self.log
            .record(&format!("Bridge started on port {}", bound_addr.port()));

        let cancel_token = CancellationToken::new();
        let cancel_clone = cancel_token.clone();
        let log = Arc::clone(&self.log);

        let join_handle: JoinHandle<AnyResult<()>> = tokio::spawn(async move {
            debug!(addr = %bound_addr, "Bridge task starting");
            lmbridge_proxy::serve(listener, settings, provider, log, cancel_clone).await
        });

        Ok(BridgeHandle {
            cancel_token,
            join_handle,
            bound_addr,
        })
    }

    /// Stop the bridge.
    ///
    /// No-op when not running. Otherwise signals shutdown and waits up to
    /// five seconds for in-flight requests before aborting the task.
    ///
    /// # Errors
    ///
    /// Returns error if the server task panicked or ended with an error.
    pub async fn stop(&self) -> Result<(), SupervisorError> {
        let mut guard = self.handle.lock().await;

        let Some(handle) = guard.take() else {
            debug!("Stop requested while bridge not running");
            return Ok(());
        };

        info!("Stopping bridge on {}", handle.bound_addr);
        handle.cancel_token.cancel();

        // Keep ownership of join_handle so we can abort on timeout
        let mut join = handle.join_handle;

        let result = match tokio::time::timeout(STOP_GRACE, &mut join).await {
            Ok(Ok(Ok(()))) => {
                info!("Bridge stopped cleanly");
                Ok(())
            }
            Ok(Ok(Err(e))) => {
                error!("Bridge task ended with error: {e}");
                Err(SupervisorError::Internal(format!("Bridge error: {e}")))
            }
            Ok(Err(join_err)) => {
                error!("Bridge task panicked: {join_err}");
                Err(SupervisorError::Internal(format!(
                    "Task panicked: {join_err}"
                )))
            }
            Err(_) => {
                warn!("Bridge stop timed out; aborting task");
                join.abort();
                Ok(())
            }
        };

        self.log.record("Bridge stopped");
        result
    }

    /// Get the current status of the bridge.
    ///
    /// A task that finished without its token being cancelled is reported
    /// as crashed once, and its handle is cleared.
    pub async fn status(&self) -> BridgeStatus {
        let mut guard = self.handle.lock().await;

        let Some(handle) = guard.as_ref() else {
            return BridgeStatus::Stopped;
        };

        if handle.join_handle.is_finished() {
            let was_cancelled = handle.cancel_token.is_cancelled();
            *guard = None;

            if was_cancelled {
                BridgeStatus::Stopped
            } else {
                warn!("Detected crashed bridge, cleaning up handle");
                self.log.record("Bridge crashed");
                BridgeStatus::Crashed
            }
        } else {
            BridgeStatus::Running {
                address: handle.bound_addr,
            }
        }
    }

    /// Get the bound address if running.
    pub async fn bound_address(&self) -> Option<SocketAddr> {
        let guard = self.handle.lock().await;
        guard
            .as_ref()
            .filter(|h| !h.join_handle.is_finished())
            .map(|h| h.bound_addr)
    }
}

fn bind_error(port: u16, e: &io::Error) -> SupervisorError {
    if e.kind() == io::ErrorKind::AddrInUse {
        SupervisorError::PortInUse { port }
    } else {
        SupervisorError::BindFailed {
            address: format!("{}:{port}", Ipv4Addr::LOCALHOST),
            reason: e.to_string(),
        }
    }
}

impl fmt::Debug for BridgeSupervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeSupervisor").finish_non_exhaustive()
    }
}
