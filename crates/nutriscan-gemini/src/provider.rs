//! [`GenerativeModel`] implementation over the Gemini event stream.

use futures::StreamExt;
use nutriscan_core::request::AnalysisRequest;
use nutriscan_core::stream::{FragmentStream, GenerativeModel};
use nutriscan_core::{Error as CoreError, Result};

use crate::client::GeminiClient;
use crate::sse::{SseDecoder, interpret_event};
use crate::wire::GenerateContentRequest;
use crate::{Error, TRACING_TARGET_STREAM};

/// Gemini-backed generative model.
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    client: GeminiClient,
}

impl GeminiProvider {
    /// Creates a provider from a client.
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }

    /// Returns the underlying client.
    pub fn client(&self) -> &GeminiClient {
        &self.client
    }
}

#[async_trait::async_trait]
impl GenerativeModel for GeminiProvider {
    async fn open_stream(&self, request: &AnalysisRequest) -> Result<FragmentStream> {
        let body = GenerateContentRequest::from_request(request);
        let response = self.client.stream_generate_content(&body).await?;
        let request_id = request.request_id();

        let stream = async_stream::stream! {
            let mut decoder = SseDecoder::new();
            let mut body = response.bytes_stream();

            while let Some(read) = body.next().await {
                let bytes = match read {
                    Ok(bytes) => bytes,
                    Err(error) => {
                        tracing::error!(
                            target: TRACING_TARGET_STREAM,
                            request_id = %request_id,
                            error = %error,
                            "Event stream read failed"
                        );
                        yield Err(CoreError::from(Error::Http(error)));
                        return;
                    }
                };

                for event in decoder.push(&bytes) {
                    if let Some(item) = interpret_event(&event) {
                        let terminal = matches!(&item, Err(error) if error.is_terminal());
                        yield item;
                        if terminal {
                            return;
                        }
                    }
                }
            }

            if let Some(item) = decoder.finish().as_deref().and_then(interpret_event) {
                yield item;
            }
        };

        Ok(stream.boxed())
    }

    fn model_name(&self) -> &str {
        self.client.model()
    }
}
