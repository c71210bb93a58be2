//! Bridges a rig `CompletionModel` to our `LlmProvider` trait.

use std::time::Duration;

use async_trait::async_trait;
use rig::completion::{CompletionModel, Message};
use rig::message::AssistantContent;
use tracing::debug;

use super::provider::{ChatMessage, CompletionRequest, CompletionResponse, LlmProvider, Role};
use crate::error::LlmError;

/// Wraps any rig completion model, bounding each call by `timeout`.
pub struct RigAdapter<M> {
    model: M,
    model_name: String,
    provider: &'static str,
    timeout: Duration,
}

impl<M> RigAdapter<M> {
    pub fn new(model: M, model_name: &str, provider: &'static str, timeout: Duration) -> Self {
        Self {
            model,
            model_name: model_name.to_string(),
            provider,
            timeout,
        }
    }
}

/// A chat transcript split the way rig's request builder takes it.
#[derive(Debug, PartialEq, Eq)]
struct RigPrompt {
    preamble: Option<String>,
    history: Vec<ChatMessage>,
    prompt: String,
}

/// System messages become the preamble; the last user message is the prompt.
fn split_messages(messages: Vec<ChatMessage>) -> Option<RigPrompt> {
    let (system, mut rest): (Vec<_>, Vec<_>) = messages
        .into_iter()
        .partition(|m| m.role == Role::System);
    let last_user = rest.iter().rposition(|m| m.role == Role::User)?;
    let prompt = rest.remove(last_user).content;

    let preamble = (!system.is_empty()).then(|| {
        system
            .into_iter()
            .map(|m| m.content)
            .collect::<Vec<_>>()
            .join("\n\n")
    });
    Some(RigPrompt {
        preamble,
        history: rest,
        prompt,
    })
}

/// Map a rig error message onto our error kinds.
fn classify_error(provider: &str, message: String) -> LlmError {
    let lower = message.to_lowercase();
    if lower.contains("401") || lower.contains("403") || lower.contains("invalid api key") {
        LlmError::AuthFailed {
            provider: provider.to_string(),
        }
    } else if lower.contains("429") || lower.contains("rate limit") {
        LlmError::RateLimited {
            provider: provider.to_string(),
        }
    } else {
        LlmError::RequestFailed {
            provider: provider.to_string(),
            reason: message,
        }
    }
}

#[async_trait]
impl<M> LlmProvider for RigAdapter<M>
where
    M: CompletionModel + Send + Sync + 'static,
{
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let RigPrompt {
            preamble,
            history,
            prompt,
        } = split_messages(request.messages).ok_or_else(|| LlmError::RequestFailed {
            provider: self.provider.to_string(),
            reason: "request has no user message".to_string(),
        })?;

        let history: Vec<Message> = history
            .into_iter()
            .map(|m| match m.role {
                Role::Assistant => Message::assistant(m.content),
                _ => Message::user(m.content),
            })
            .collect();

        let mut builder = self
            .model
            .completion_request(Message::user(prompt))
            .messages(history);
        if let Some(preamble) = preamble {
            builder = builder.preamble(preamble);
        }
        if let Some(temperature) = request.temperature {
            builder = builder.temperature(f64::from(temperature));
        }
        if let Some(max_tokens) = request.max_tokens {
            builder = builder.max_tokens(u64::from(max_tokens));
        }

        let response = tokio::time::timeout(self.timeout, builder.send())
            .await
            .map_err(|_| LlmError::RequestFailed {
                provider: self.provider.to_string(),
                reason: format!("timed out after {}s", self.timeout.as_secs()),
            })?
            .map_err(|e| classify_error(self.provider, e.to_string()))?;

        let content: String = response
            .choice
            .iter()
            .filter_map(|c| match c {
                AssistantContent::Text(text) => Some(text.text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("");
        if content.trim().is_empty() {
            return Err(LlmError::InvalidResponse {
                provider: self.provider.to_string(),
                reason: "response contained no text".to_string(),
            });
        }

        let input_tokens = u32::try_from(response.usage.input_tokens).unwrap_or(u32::MAX);
        let output_tokens = u32::try_from(response.usage.output_tokens).unwrap_or(u32::MAX);
        debug!(
            provider = self.provider,
            model = %self.model_name,
            input_tokens,
            output_tokens,
            "LLM completion"
        );

        Ok(CompletionResponse {
            content,
            input_tokens,
            output_tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_prompt_has_no_history() {
        let split = split_messages(vec![ChatMessage::user("hello")]).unwrap();
        assert_eq!(
            split,
            RigPrompt {
                preamble: None,
                history: vec![],
                prompt: "hello".to_string(),
            }
        );
    }

    #[test]
    fn system_messages_become_preamble() {
        let split = split_messages(vec![
            ChatMessage::system("be terse"),
            ChatMessage::user("first"),
            ChatMessage::assistant("reply"),
            ChatMessage::system("no emoji"),
            ChatMessage::user("second"),
        ])
        .unwrap();
        assert_eq!(split.preamble.as_deref(), Some("be terse\n\nno emoji"));
        assert_eq!(
            split.history,
            vec![ChatMessage::user("first"), ChatMessage::assistant("reply")]
        );
        assert_eq!(split.prompt, "second");
    }

    #[test]
    fn request_without_user_message_is_refused() {
        assert!(split_messages(vec![ChatMessage::system("only rules")]).is_none());
        assert!(split_messages(vec![]).is_none());
    }

    #[test]
    fn errors_are_classified() {
        assert!(matches!(
            classify_error("groq", "HttpError: status 401 Unauthorized".into()),
            LlmError::AuthFailed { .. }
        ));
        assert!(matches!(
            classify_error("groq", "ProviderError: Rate limit reached (429)".into()),
            LlmError::RateLimited { .. }
        ));
        match classify_error("openai", "connection reset".into()) {
            LlmError::RequestFailed { provider, reason } => {
                assert_eq!(provider, "openai");
                assert_eq!(reason, "connection reset");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
