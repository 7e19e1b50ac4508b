use std::net::SocketAddr;

use anyhow::{Context, Result};
use design_assistant::codec::{MsgPackCodec, PayloadCodec};
use design_assistant::config::Config;
use design_assistant::ops;
use design_assistant::preferences::{PreferenceDescriptor, RawFields};
use design_assistant::rpc::designassistant::design_assistant_server::{
    DesignAssistant, DesignAssistantServer,
};
use design_assistant::rpc::designassistant::{RunRequest, RunResponse};
use design_assistant::session::DesignSession;
use tokio::sync::Mutex;
use tonic::{transport::Server, Request, Response, Status};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

struct DesignAssistantService<C> {
    codec: C,
    // One logical session; the mutex only satisfies the transport's Sync
    // bound, access stays sequential.
    session: Mutex<DesignSession>,
}

#[tonic::async_trait]
impl<C> DesignAssistant for DesignAssistantService<C>
where
    C: PayloadCodec + Send + Sync + 'static,
{
    async fn run(&self, request: Request<RunRequest>) -> Result<Response<RunResponse>, Status> {
        let inner = request.into_inner();

        let output = match inner.op.as_str() {
            ops::AGGREGATE_PREFERENCES => {
                let raw: RawFields = self
                    .codec
                    .decode(&inner.input)
                    .map_err(|e| Status::invalid_argument(format!("decode input failed: {e}")))?;

                let mut session = self.session.lock().await;
                let descriptor = session
                    .aggregate(&raw)
                    .map_err(|e| Status::invalid_argument(e.to_string()))?;
                self.codec.encode(&descriptor)
            }

            ops::GENERATE_DESIGN => {
                let descriptor: PreferenceDescriptor = self
                    .codec
                    .decode(&inner.input)
                    .map_err(|e| Status::invalid_argument(format!("decode input failed: {e}")))?;

                let mut session = self.session.lock().await;
                let result = session.generate(&descriptor).await;
                self.codec.encode(&result)
            }

            ops::FETCH_IMAGES => {
                let descriptor: PreferenceDescriptor = self
                    .codec
                    .decode(&inner.input)
                    .map_err(|e| Status::invalid_argument(format!("decode input failed: {e}")))?;

                let session = self.session.lock().await;
                let images = session.fetch_images(&descriptor).await;
                self.codec.encode(&images)
            }

            _ => return Err(Status::not_found("unknown op")),
        }
        .map_err(|e| Status::internal(format!("encode output failed: {e}")))?;

        let resp = RunResponse {
            output,
            ok: true,
            error: String::new(),
        };

        Ok(Response::new(resp))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Missing GENAI_API_KEY halts here, before any interaction.
    let config = Config::from_env().context("configuration is incomplete")?;

    let addr: SocketAddr = std::env::var("DESIGN_ASSISTANT_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:50051".to_string())
        .parse()
        .context("invalid DESIGN_ASSISTANT_ADDR")?;

    info!(%addr, "design assistant listening");
    info!(
        base_url = %config.genai_base_url,
        model = %config.genai_model,
        "using generative upstream"
    );
    if config.image_api_key.is_none() {
        warn!("IMAGE_API_KEY not set, image fetcher degrades to the curated table");
    }

    let service = DesignAssistantService {
        codec: MsgPackCodec,
        session: Mutex::new(DesignSession::new(&config)),
    };

    Server::builder()
        .add_service(DesignAssistantServer::new(service))
        .serve(addr)
        .await?;

    Ok(())
}
