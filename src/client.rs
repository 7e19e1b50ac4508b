use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::{de::DeserializeOwned, Serialize};
use tonic::transport::Channel;

use crate::codec::{MsgPackCodec, PayloadCodec};
use crate::ops;
use crate::preferences::{DesignResult, ImageSet, PreferenceDescriptor, RawFields};
use crate::rpc::designassistant::design_assistant_client::DesignAssistantClient;
use crate::rpc::designassistant::{RunRequest, RunResponse};

/// Host-side wrapper around the gRPC surface: encodes payloads, dispatches
/// the operation id, decodes the reply.
pub struct AssistantClient {
    client: DesignAssistantClient<Channel>,
    codec: MsgPackCodec,
}

impl AssistantClient {
    pub async fn connect(addr: String) -> Result<Self> {
        let client = DesignAssistantClient::connect(addr)
            .await
            .map_err(|e| anyhow!("Failed to connect to design assistant server: {e}"))?;

        Ok(Self {
            client,
            codec: MsgPackCodec,
        })
    }

    pub async fn run_op<I, O>(&mut self, op: &str, input: &I) -> Result<O>
    where
        I: Serialize,
        O: DeserializeOwned,
    {
        let input_bytes = self
            .codec
            .encode(input)
            .map_err(|e| anyhow!("Failed to encode input: {e}"))?;

        let request = tonic::Request::new(RunRequest {
            op: op.to_string(),
            input: input_bytes,
        });

        let response = self
            .client
            .run(request)
            .await
            .map_err(|e| anyhow!("gRPC call failed: {e}"))?;

        self.decode_response(response.into_inner())
    }

    pub async fn run_op_with_timeout<I, O>(
        &mut self,
        op: &str,
        input: &I,
        timeout: Duration,
    ) -> Result<O>
    where
        I: Serialize,
        O: DeserializeOwned,
    {
        let input_bytes = self
            .codec
            .encode(input)
            .map_err(|e| anyhow!("Failed to encode input: {e}"))?;

        let request = tonic::Request::new(RunRequest {
            op: op.to_string(),
            input: input_bytes,
        });

        let response = tokio::time::timeout(timeout, self.client.run(request))
            .await
            .map_err(|_| anyhow!("Request timed out after {:?}", timeout))?
            .map_err(|e| anyhow!("gRPC call failed: {e}"))?;

        self.decode_response(response.into_inner())
    }

    fn decode_response<O: DeserializeOwned>(&self, response: RunResponse) -> Result<O> {
        let RunResponse { output, ok, error } = response;

        if !ok {
            return Err(anyhow!("Operation failed: {}", error));
        }

        self.codec
            .decode(&output)
            .map_err(|e| anyhow!("Failed to decode output: {e}"))
    }

    /// Validate the raw fields server-side and get the descriptor back.
    pub async fn aggregate(&mut self, raw: &RawFields) -> Result<PreferenceDescriptor> {
        self.run_op(ops::AGGREGATE_PREFERENCES, raw).await
    }

    pub async fn generate(
        &mut self,
        descriptor: &PreferenceDescriptor,
        timeout: Duration,
    ) -> Result<DesignResult> {
        self.run_op_with_timeout(ops::GENERATE_DESIGN, descriptor, timeout)
            .await
    }

    pub async fn fetch_images(&mut self, descriptor: &PreferenceDescriptor) -> Result<ImageSet> {
        self.run_op(ops::FETCH_IMAGES, descriptor).await
    }
}
