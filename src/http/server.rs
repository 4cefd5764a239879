//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Wrap the route tree service in an Axum app
//! - Wire up middleware (body limit, compression, timeout, request ID, tracing)
//! - Bind server to listener and serve until shutdown

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    compression::CompressionLayer,
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::MuxConfig;
use crate::routing::{MuxService, Router};

/// HTTP server hosting a [`Router`].
pub struct HttpServer {
    app: axum::Router,
    service: MuxService,
    config: MuxConfig,
}

impl HttpServer {
    /// Create a new HTTP server serving `router` with the given configuration.
    pub fn new(config: MuxConfig, router: Router) -> Self {
        let service = router.into_service();
        let app = Self::build_app(&config, service.clone());
        Self {
            app,
            service,
            config,
        }
    }

    /// Build the Axum app with all middleware layers.
    #[allow(deprecated)]
    fn build_app(config: &MuxConfig, service: MuxService) -> axum::Router {
        let mut app = axum::Router::new()
            .fallback_service(service)
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_size));

        if config.limits.compression {
            app = app.layer(CompressionLayer::new());
        }

        app.layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Handle for replacing the route table while the server runs.
    pub fn service(&self) -> MuxService {
        self.service.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.app.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &MuxConfig {
        &self.config
    }
}
