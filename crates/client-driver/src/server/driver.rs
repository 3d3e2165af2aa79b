//! `ClientDriver`: the session object a test talks to.

use super::handler::{handle_request, HandlerContext};
use super::ServerState;
use crate::config::DriverConfig;
use crate::error::DriverError;
use crate::expectation::{ExpectedRequest, ExpectedResponse, Times};
use crate::matcher::RequestMatcher;
use crate::registry::{ExpectationId, ExpectationRegistry, UnexpectedRequest};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::StatusCode;
use hyper_util::rt::TokioIo;
use hyper_util::server::graceful::GracefulShutdown;
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Handles to a listener that is currently serving.
struct RunningServer {
    addr: SocketAddr,
    shutdown_tx: broadcast::Sender<()>,
    task: JoinHandle<()>,
}

/// An embedded HTTP test double.
///
/// Register expectations, point the client under test at [`base_url`](Self::base_url),
/// then [`verify`](Self::verify). Expectations may be added before or after
/// `start`; the registry is shared with the running listener.
pub struct ClientDriver {
    config: DriverConfig,
    registry: Arc<ExpectationRegistry>,
    state: AtomicU8,
    running: Mutex<Option<RunningServer>>,
}

impl ClientDriver {
    /// Create a stopped driver using the default matcher.
    pub fn new(config: DriverConfig) -> Self {
        Self::with_registry(config, ExpectationRegistry::new())
    }

    pub fn with_matcher(config: DriverConfig, matcher: Arc<dyn RequestMatcher>) -> Self {
        Self::with_registry(config, ExpectationRegistry::with_matcher(matcher))
    }

    fn with_registry(config: DriverConfig, registry: ExpectationRegistry) -> Self {
        Self {
            config,
            registry: Arc::new(registry),
            state: AtomicU8::new(ServerState::Stopped as u8),
            running: Mutex::new(None),
        }
    }

    /// Create and start a driver in one step.
    pub async fn launch(config: DriverConfig) -> Result<Self, DriverError> {
        let driver = Self::new(config);
        driver.start().await?;
        Ok(driver)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Bind the configured address and start serving.
    ///
    /// Returns the bound address, which carries the OS-assigned port when the
    /// configured port is 0.
    pub async fn start(&self) -> Result<SocketAddr, DriverError> {
        self.transition(ServerState::Stopped, ServerState::Starting)?;
        match self.bind_and_serve().await {
            Ok(addr) => {
                self.set_state(ServerState::Running);
                Ok(addr)
            }
            Err(e) => {
                self.set_state(ServerState::Stopped);
                Err(e)
            }
        }
    }

    async fn bind_and_serve(&self) -> Result<SocketAddr, DriverError> {
        self.config
            .validate()
            .map_err(|e| DriverError::InvalidConfig(e.to_string()))?;

        let bind_addr = self.config.bind_addr();
        let listener = TcpListener::bind(bind_addr.as_str())
            .await
            .map_err(|source| DriverError::Bind {
                addr: bind_addr.clone(),
                source,
            })?;
        let addr = listener
            .local_addr()
            .map_err(|source| DriverError::Bind {
                addr: bind_addr,
                source,
            })?;

        let ctx = Arc::new(HandlerContext {
            registry: Arc::clone(&self.registry),
            unexpected_status: StatusCode::from_u16(self.config.unexpected_status)
                .unwrap_or(StatusCode::NOT_FOUND),
            near_miss_limit: self.config.near_miss_limit,
        });

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let task = tokio::spawn(accept_loop(
            listener,
            ctx,
            shutdown_rx,
            self.config.shutdown_timeout(),
        ));

        *self.running.lock() = Some(RunningServer {
            addr,
            shutdown_tx,
            task,
        });
        info!("Client driver listening on {}", addr);
        Ok(addr)
    }

    /// Stop accepting, drain in-flight requests and release the socket.
    ///
    /// A no-op unless the driver is running.
    pub async fn shutdown(&self) {
        if let Err(e) = self.transition(ServerState::Running, ServerState::Stopping) {
            debug!("Ignoring shutdown: {}", e);
            return;
        }

        let running = self.running.lock().take();
        if let Some(running) = running {
            let _ = running.shutdown_tx.send(());
            if let Err(e) = running.task.await {
                warn!("Accept loop for {} ended abnormally: {}", running.addr, e);
            }
            info!("Client driver on {} stopped", running.addr);
        }
        self.set_state(ServerState::Stopped);
    }

    pub fn state(&self) -> ServerState {
        ServerState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: ServerState) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn transition(&self, from: ServerState, to: ServerState) -> Result<(), DriverError> {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|actual| DriverError::InvalidState {
                expected: from,
                actual: ServerState::from_u8(actual),
            })
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.lock().as_ref().map(|r| r.addr)
    }

    pub fn port(&self) -> Option<u16> {
        self.local_addr().map(|addr| addr.port())
    }

    /// `http://host:port` of the running listener, without a trailing slash.
    pub fn base_url(&self) -> Option<String> {
        self.local_addr().map(|addr| format!("http://{addr}"))
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    // =========================================================================
    // Expectations and verification
    // =========================================================================

    /// Expect one request like `request`, answered with `response`.
    pub fn add_expectation(
        &self,
        request: ExpectedRequest,
        response: ExpectedResponse,
    ) -> ExpectationId {
        self.registry.register(request, response)
    }

    pub fn add_expectation_times(
        &self,
        request: ExpectedRequest,
        response: ExpectedResponse,
        times: Times,
    ) -> ExpectationId {
        self.registry.register_with_times(request, response, times)
    }

    /// Fail if any expectation is unmet or any request went unmatched.
    pub fn verify(&self) -> Result<(), DriverError> {
        let report = self.registry.report();
        if report.is_clean() {
            Ok(())
        } else {
            Err(DriverError::Verification(report))
        }
    }

    /// Panicking form of [`verify`](Self::verify) for use at the end of a test.
    #[track_caller]
    pub fn assert_satisfied(&self) {
        if let Err(e) = self.verify() {
            panic!("{e}");
        }
    }

    /// Forget all expectations and recorded unexpected requests; the listener keeps running.
    pub fn reset(&self) {
        self.registry.reset();
    }

    pub fn unexpected_requests(&self) -> Vec<UnexpectedRequest> {
        self.registry.unexpected_requests()
    }

    pub fn registry(&self) -> &Arc<ExpectationRegistry> {
        &self.registry
    }
}

impl Drop for ClientDriver {
    fn drop(&mut self) {
        if let Some(running) = self.running.get_mut().take() {
            debug!("Client driver on {} dropped while running", running.addr);
            let _ = running.shutdown_tx.send(());
        }
    }
}

async fn accept_loop(
    listener: TcpListener,
    ctx: Arc<HandlerContext>,
    mut shutdown_rx: broadcast::Receiver<()>,
    drain_timeout: Duration,
) {
    let graceful = GracefulShutdown::new();

    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, remote)) => {
                        let ctx = Arc::clone(&ctx);
                        let io = TokioIo::new(stream);
                        let service = service_fn(move |req| {
                            let ctx = Arc::clone(&ctx);
                            async move { handle_request(req, ctx).await }
                        });
                        let conn = graceful.watch(http1::Builder::new().serve_connection(io, service));
                        tokio::spawn(async move {
                            if let Err(e) = conn.await {
                                debug!("Connection error from {}: {}", remote, e);
                            }
                        });
                    }
                    Err(e) => {
                        error!("Accept error: {}", e);
                    }
                }
            }
            // Closed channel (sender dropped) also ends the loop
            _ = shutdown_rx.recv() => {
                break;
            }
        }
    }

    drop(listener);
    match tokio::time::timeout(drain_timeout, graceful.shutdown()).await {
        Ok(()) => debug!("All connections drained"),
        Err(_) => warn!(
            "Connections still open after {:?}; abandoning them",
            drain_timeout
        ),
    }
}
