use crate::config::{self, RuntimeConfig};
use crate::fraud_service::FraudServiceSVC;
use crate::metrics;

use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Response, StatusCode};
use prometheus::{Encoder, TextEncoder};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tokio::sync::{oneshot, Mutex};

static INSTANCE: OnceCell<Mutex<Server>> = OnceCell::new();
pub fn instance() -> &'static Mutex<Server> {
    INSTANCE.get_or_init(|| Mutex::new(Server::builder()))
}

pub struct Server {
    shutdown: Vec<oneshot::Sender<()>>, // one per listener
}

impl Server {
    fn builder() -> Self {
        Server {
            shutdown: Vec::new(),
        }
    }

    pub async fn start(&mut self) -> anyhow::Result<()> {
        let config = config::current();
        self.start_http_server(&config).await?;
        self.start_metrics_server(&config).await?;
        Ok(())
    }

    pub fn stop(&mut self) {
        for tx in self.shutdown.drain(..) {
            let _ = tx.send(());
        }
        log::info!("server stop");
    }

    async fn start_http_server(&mut self, config: &RuntimeConfig) -> anyhow::Result<()> {
        let addr: SocketAddr = config.addr.parse()?;
        let fraud_service = Arc::new(FraudServiceSVC::from_config(config));
        let make_svc = make_service_fn(move |_| {
            let fraud_service = fraud_service.clone();
            async move {
                Ok::<_, Infallible>(service_fn(move |request: Request<Body>| {
                    let fraud_service = fraud_service.clone();
                    async move { fraud_service.call(request).await }
                }))
            }
        });
        let (tx, rx) = oneshot::channel::<()>();
        let server = hyper::Server::try_bind(&addr)?
            .serve(make_svc)
            .with_graceful_shutdown(async move {
                let _ = rx.await;
            });
        tokio::spawn(async move {
            if let Err(e) = server.await {
                log::error!("http server error: {}", e);
            }
        });
        self.shutdown.push(tx);
        log::info!("http server started on {}", addr);
        Ok(())
    }

    async fn start_metrics_server(&mut self, config: &RuntimeConfig) -> anyhow::Result<()> {
        let addr: SocketAddr = config.metrics_addr.parse()?;
        let make_svc = make_service_fn(move |_| {
            let registry = metrics::REGISTRY_INSTANCE.clone();
            async move {
                Ok::<_, Infallible>(service_fn(move |_: Request<Body>| {
                    let registry = registry.clone();
                    async move { Ok::<_, Infallible>(encode_metrics(&registry)) }
                }))
            }
        });
        metrics::init_registry();
        let (tx, rx) = oneshot::channel::<()>();
        let server = hyper::Server::try_bind(&addr)?
            .serve(make_svc)
            .with_graceful_shutdown(async move {
                let _ = rx.await;
            });
        tokio::spawn(async move {
            if let Err(e) = server.await {
                log::error!("metrics server error: {}", e);
            }
        });
        self.shutdown.push(tx);
        log::info!("metrics server started on {}", addr);
        Ok(())
    }
}

fn encode_metrics(registry: &prometheus::Registry) -> Response<Body> {
    let encoder = TextEncoder::new();
    let metric_families = registry.gather();
    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => Response::new(Body::from(buffer)),
        Err(e) => {
            log::error!("failed to encode metrics: {}", e);
            let mut response = Response::new(Body::empty());
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
        }
    }
}
