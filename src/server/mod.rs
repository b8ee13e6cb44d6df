/// Health reporter HTTP server
///
/// Runs as a supervised background task next to the bot. The task owns the
/// listener and stops through its `CancellationToken`; the foreground only
/// waits for a termination signal (or the bot child exiting) and then joins it.

#[cfg(feature = "server")]
pub mod routes;

#[cfg(feature = "server")]
pub mod handlers;

#[cfg(feature = "server")]
pub use routes::create_router;

#[cfg(feature = "server")]
pub use supervisor::{run, shutdown_signal, HealthServer};

#[cfg(feature = "server")]
mod supervisor {
    use anyhow::{bail, Context, Result};
    use std::net::SocketAddr;
    use std::process::Stdio;
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;
    use tokio_util::sync::CancellationToken;
    use tracing::{error, info, warn};

    use super::create_router;

    pub struct HealthServer {
        addr: SocketAddr,
        cancel: CancellationToken,
        handle: JoinHandle<std::io::Result<()>>,
    }

    impl HealthServer {
        /// Bind the listener and start serving in a background task
        pub async fn spawn(addr: SocketAddr, service: impl Into<String>) -> Result<Self> {
            let listener = TcpListener::bind(addr)
                .await
                .with_context(|| format!("Failed to bind health server to {}", addr))?;
            let addr = listener.local_addr()?;

            let cancel = CancellationToken::new();
            let token = cancel.clone();
            let app = create_router(service);

            let handle = tokio::spawn(async move {
                axum::serve(listener, app)
                    .with_graceful_shutdown(async move { token.cancelled().await })
                    .await
            });

            info!("Health check server started on {}", addr);

            Ok(Self { addr, cancel, handle })
        }

        pub fn local_addr(&self) -> SocketAddr {
            self.addr
        }

        pub fn cancellation_token(&self) -> CancellationToken {
            self.cancel.clone()
        }

        /// Cancel the listener and wait for the task to finish
        pub async fn shutdown(self) -> Result<()> {
            self.cancel.cancel();
            self.handle
                .await
                .context("Health server task panicked")?
                .context("Health server failed")?;
            info!("Health check server stopped");
            Ok(())
        }
    }

    /// Resolves on SIGINT or SIGTERM
    pub async fn shutdown_signal() {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sig) => {
                    sig.recv().await;
                }
                Err(e) => {
                    error!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = terminate => info!("Received SIGTERM, shutting down..."),
        }
    }

    /// Serve health checks until a termination signal arrives
    ///
    /// With a non-empty `bot_command` the bot runs as a child process and the
    /// reporter also stops when it exits. A failed child is an error so that
    /// systemd sees the unit fail and applies its restart policy.
    pub async fn run(addr: SocketAddr, service: String, bot_command: Vec<String>) -> Result<()> {
        let server = HealthServer::spawn(addr, service).await?;

        println!("🩺 Health reporter");
        println!("   📍 http://{}/health", server.local_addr());

        if bot_command.is_empty() {
            println!("   Press Ctrl+C to stop");
            shutdown_signal().await;
            return server.shutdown().await;
        }

        let (program, args) = (&bot_command[0], &bot_command[1..]);
        println!("   🤖 Bot: {}", bot_command.join(" "));

        let mut child = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to start bot process '{}'", program))?;

        let exit = tokio::select! {
            status = child.wait() => Some(status.context("Failed to wait for bot process")?),
            _ = shutdown_signal() => None,
        };

        match exit {
            None => {
                if let Err(e) = child.kill().await {
                    warn!("Failed to stop bot process: {}", e);
                }
                server.shutdown().await
            }
            Some(status) => {
                server.shutdown().await?;
                if status.success() {
                    info!("Bot process exited");
                    Ok(())
                } else {
                    bail!("Bot process exited with {}", status)
                }
            }
        }
    }

}
