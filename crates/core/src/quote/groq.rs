use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::quote::{GenerateError, Quote, QuoteGenerator, QuoteRequest};
use crate::util::{is_retryable_status, retry, Backoff};

const SYSTEM_PROMPT: &str = "You give short quotes tailored to the age and emotion \
of the person in front of the mirror. Reply with the quote only, without quotation \
marks, and do not mention the age or emotion explicitly.";

/// Quote generation against the Groq OpenAI-compatible chat-completions API.
#[derive(Clone)]
pub struct GroqQuoteGenerator {
    client: Client,
    api_key: String,
    model: String,
    api_base: Url,
    backoff: Backoff,
}

impl GroqQuoteGenerator {
    pub fn new(api_key: String, model: String, api_base: Url) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model,
            api_base,
            backoff: Backoff::default(),
        }
    }

    fn chat_request(&self, request: QuoteRequest) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_owned(),
                    content: SYSTEM_PROMPT.to_owned(),
                },
                ChatMessage {
                    role: "user".to_owned(),
                    content: format!(
                        "My age is {} and my emotion is {}. Give me a quote.",
                        request.age, request.emotion
                    ),
                },
            ],
        }
    }
}

#[derive(Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

fn is_retryable(error: &GenerateError) -> bool {
    match error {
        GenerateError::Http(_) => true,
        GenerateError::Api(status, _) => is_retryable_status(*status),
        _ => false,
    }
}

impl QuoteGenerator for GroqQuoteGenerator {
    fn generate(&self, request: QuoteRequest) -> BoxFuture<'_, Result<Quote, GenerateError>> {
        let this = self.clone();
        async move {
            let url = this.api_base.join("chat/completions")?;
            let body = this.chat_request(request);

            let response = retry(
                &this.backoff,
                || {
                    let client = this.client.clone();
                    let url = url.clone();
                    let api_key = this.api_key.clone();
                    let body = body.clone();
                    async move {
                        let response = client
                            .post(url)
                            .header("Authorization", format!("Bearer {api_key}"))
                            .json(&body)
                            .send()
                            .await
                            .map_err(GenerateError::Http)?;

                        if !response.status().is_success() {
                            let status = response.status().as_u16();
                            let error_text = response
                                .text()
                                .await
                                .unwrap_or_else(|_| "Unknown error".to_owned());
                            return Err(GenerateError::Api(status, error_text));
                        }
                        Ok(response)
                    }
                },
                is_retryable,
            )
            .await?;

            let chat: ChatResponse = response.json().await.map_err(|e| {
                GenerateError::InvalidResponse(format!("failed to parse response: {e}"))
            })?;

            let choice = chat.choices.into_iter().next().ok_or_else(|| {
                GenerateError::InvalidResponse("no choices in response".to_owned())
            })?;

            Ok(Quote {
                text: choice.message.content,
            })
        }
        .boxed()
    }
}
