//! Chat-completion client.
//!
//! Speaks one of two JSON-over-HTTP protocols, selected by the backend kind
//! the availability manager detected. Transport failures are retried on a
//! fixed delay; a well-formed reply with no content is returned as `None`
//! and never retried.

use std::fmt::Display;
use std::time::Duration;

use serde_json::json;
use tracing::debug;

use crate::availability::BackendKind;
use crate::error::Error;

/// Model identifier sent to an Ollama backend, which serves whatever model
/// its daemon has loaded as the default.
pub const OLLAMA_DEFAULT_MODEL: &str = "llama3";

/// One request to the model. Immutable once built; the edit/append retry
/// path builds a fresh exchange with a lowered temperature.
#[derive(Debug, Clone)]
pub struct ChatExchange {
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: f64,
    pub timeout: Duration,
    pub retries: u32,
    pub retry_delay: Duration,
}

fn messages(exchange: &ChatExchange) -> serde_json::Value {
    json!([
        { "role": "system", "content": exchange.system_prompt },
        { "role": "user", "content": exchange.user_prompt },
    ])
}

fn build_payload(kind: BackendKind, model: &str, exchange: &ChatExchange) -> serde_json::Value {
    match kind {
        BackendKind::OpenAiCompatible => json!({
            "model": model,
            "messages": messages(exchange),
            "temperature": exchange.temperature,
        }),
        BackendKind::Ollama => json!({
            "model": OLLAMA_DEFAULT_MODEL,
            "messages": messages(exchange),
            "options": { "temperature": exchange.temperature },
            "stream": false,
        }),
    }
}

fn chat_url(kind: BackendKind, host: &str) -> String {
    match kind {
        BackendKind::OpenAiCompatible => format!("{host}/v1/chat/completions"),
        BackendKind::Ollama => format!("{host}/api/chat"),
    }
}

/// Pulls the assistant content out of a reply body, at the path the wire
/// protocol defines. Missing or null content yields `None`.
fn extract_content(kind: BackendKind, body: &serde_json::Value) -> Option<String> {
    let node = match kind {
        BackendKind::OpenAiCompatible => body
            .get("choices")?
            .get(0)?
            .get("message")?
            .get("content")?,
        BackendKind::Ollama => body.get("message")?.get("content")?,
    };
    node.as_str().map(str::to_owned)
}

/// Fixed-delay retry loop around one attempt. Exhaustion is reported as
/// `NoResponse`, never swallowed.
fn with_retries<F, E>(retries: u32, retry_delay: Duration, mut attempt_fn: F) -> Result<Option<String>, Error>
where
    F: FnMut() -> Result<Option<String>, E>,
    E: Display,
{
    for attempt in 1..=retries {
        match attempt_fn() {
            Ok(content) => return Ok(content),
            Err(err) => {
                debug!("[attempt {attempt}/{retries}] {err}");
                if attempt < retries {
                    std::thread::sleep(retry_delay);
                }
            }
        }
    }
    Err(Error::NoResponse)
}

/// Sends a chat-completion request and returns the assistant content, or
/// `Ok(None)` when the reply carried no content (fatal for the caller, but
/// not a transport failure).
pub fn query(
    host: &str,
    kind: BackendKind,
    model: &str,
    exchange: &ChatExchange,
) -> Result<Option<String>, Error> {
    let client = reqwest::blocking::Client::builder()
        .timeout(exchange.timeout)
        .build()?;
    let url = chat_url(kind, host);
    let payload = build_payload(kind, model, exchange);

    with_retries(exchange.retries, exchange.retry_delay, || {
        let body: serde_json::Value = client
            .post(&url)
            .json(&payload)
            .send()?
            .error_for_status()?
            .json()?;
        debug!("[llm] raw response: {body}");
        Ok::<_, reqwest::Error>(extract_content(kind, &body))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn exchange() -> ChatExchange {
        ChatExchange {
            system_prompt: "be terse".to_string(),
            user_prompt: "list files".to_string(),
            temperature: 0.3,
            timeout: Duration::from_secs(1),
            retries: 3,
            retry_delay: Duration::ZERO,
        }
    }

    #[test]
    fn test_completions_payload_shape() {
        let payload = build_payload(BackendKind::OpenAiCompatible, "mistral", &exchange());
        assert_eq!(payload["model"], "mistral");
        assert_eq!(payload["messages"][0]["role"], "system");
        assert_eq!(payload["messages"][0]["content"], "be terse");
        assert_eq!(payload["messages"][1]["role"], "user");
        assert_eq!(payload["temperature"], 0.3);
        assert!(payload.get("stream").is_none());
    }

    #[test]
    fn test_ollama_payload_shape() {
        let payload = build_payload(BackendKind::Ollama, "ignored", &exchange());
        assert_eq!(payload["model"], OLLAMA_DEFAULT_MODEL);
        assert_eq!(payload["options"]["temperature"], 0.3);
        assert_eq!(payload["stream"], false);
        assert_eq!(payload["messages"][1]["content"], "list files");
    }

    #[test]
    fn test_chat_urls() {
        assert_eq!(
            chat_url(BackendKind::OpenAiCompatible, "http://localhost:8280"),
            "http://localhost:8280/v1/chat/completions"
        );
        assert_eq!(
            chat_url(BackendKind::Ollama, "http://localhost:11434"),
            "http://localhost:11434/api/chat"
        );
    }

    #[test]
    fn test_extract_content_completions() {
        let body = json!({"choices": [{"message": {"content": "ls -la"}}]});
        assert_eq!(
            extract_content(BackendKind::OpenAiCompatible, &body),
            Some("ls -la".to_string())
        );
    }

    #[test]
    fn test_extract_content_ollama() {
        let body = json!({"message": {"role": "assistant", "content": "du -sh *"}});
        assert_eq!(
            extract_content(BackendKind::Ollama, &body),
            Some("du -sh *".to_string())
        );
    }

    #[test]
    fn test_extract_content_missing_field() {
        let body = json!({"choices": []});
        assert_eq!(extract_content(BackendKind::OpenAiCompatible, &body), None);
        let body = json!({"message": {"content": null}});
        assert_eq!(extract_content(BackendKind::Ollama, &body), None);
    }

    #[test]
    fn test_retry_exhaustion_attempts_exactly_retries_times() {
        let mut attempts = 0u32;
        let result = with_retries(3, Duration::ZERO, || {
            attempts += 1;
            Err::<Option<String>, _>("connection refused")
        });
        assert!(matches!(result, Err(Error::NoResponse)));
        assert_eq!(attempts, 3);
    }

    #[test]
    fn test_retry_stops_on_first_success() {
        let mut attempts = 0u32;
        let result = with_retries(5, Duration::ZERO, || {
            attempts += 1;
            if attempts < 3 {
                Err("transient")
            } else {
                Ok(Some("echo ok".to_string()))
            }
        })
        .unwrap();
        assert_eq!(result, Some("echo ok".to_string()));
        assert_eq!(attempts, 3);
    }

    #[test]
    fn test_missing_content_is_not_retried() {
        let mut attempts = 0u32;
        let result = with_retries(5, Duration::ZERO, || {
            attempts += 1;
            Ok::<_, &str>(None)
        })
        .unwrap();
        assert_eq!(result, None);
        assert_eq!(attempts, 1);
    }

    #[test]
    fn test_zero_retries_reports_no_response() {
        let result = with_retries(0, Duration::ZERO, || Ok::<_, &str>(Some(String::new())));
        assert!(matches!(result, Err(Error::NoResponse)));
    }
}
