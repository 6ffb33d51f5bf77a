//! Summarization: prompt template, chat-completion client, summary file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::config::SummaryConfig;
use crate::error::{DigestError, Result};

/// Placeholder replaced by the day's records.
pub const CONTENT_PLACEHOLDER: &str = "{email_content}";

const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that analyzes, categorizes, and summarizes emails.";

/// A user prompt with a `{email_content}` slot.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Read the template file.
    pub fn load(path: &Path) -> Result<Self> {
        std::fs::read_to_string(path)
            .map(Self::new)
            .map_err(|e| DigestError::io(path, e))
    }

    /// Substitute every placeholder with `email_content`.
    pub fn render(&self, email_content: &str) -> String {
        self.template.replace(CONTENT_PLACEHOLDER, email_content)
    }
}

/// Something that turns a prompt into a summary.
pub trait Summarizer {
    fn summarize(&self, prompt: &str) -> Result<String>;
}

/// OpenAI-compatible `/chat/completions` client.
pub struct ChatCompletionSummarizer {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl ChatCompletionSummarizer {
    pub fn new(config: &SummaryConfig, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: api_key.into(),
        }
    }
}

impl Summarizer for ChatCompletionSummarizer {
    fn summarize(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .map_err(|e| DigestError::Summary(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(DigestError::Summary(format!("endpoint returned {status}: {body}")));
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| DigestError::Summary(format!("unreadable response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| DigestError::Summary("response had no content".into()))
    }
}

/// Summarize the day's records and append `signature`.
///
/// Failures are logged and yield `None`; they never abort the run.
pub fn summarize_digest(
    summarizer: &dyn Summarizer,
    template: &PromptTemplate,
    email_content: &str,
    signature: &str,
) -> Option<String> {
    let prompt = template.render(email_content);
    match summarizer.summarize(&prompt) {
        Ok(mut summary) => {
            summary.push_str(signature);
            info!(chars = summary.len(), "Summary generated");
            Some(summary)
        }
        Err(e) => {
            error!(error = %e, "Summarization failed");
            None
        }
    }
}

/// Write `{dir}/{date_key}.txt`, creating `dir` if needed.
pub fn write_summary(dir: &Path, date_key: &str, summary: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| DigestError::io(dir, e))?;
    let path = dir.join(format!("{date_key}.txt"));
    std::fs::write(&path, summary).map_err(|e| DigestError::io(&path, e))?;
    info!(path = %path.display(), "Saved summary");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    struct Recording {
        prompts: RefCell<Vec<String>>,
        answer: Option<String>,
    }

    impl Summarizer for Recording {
        fn summarize(&self, prompt: &str) -> Result<String> {
            self.prompts.borrow_mut().push(prompt.to_string());
            self.answer
                .clone()
                .ok_or_else(|| DigestError::Summary("offline".into()))
        }
    }

    #[test]
    fn test_render_replaces_every_placeholder() {
        let template = PromptTemplate::new("A {email_content} B {email_content}");
        assert_eq!(template.render("x"), "A x B x");
    }

    #[test]
    fn test_summarize_appends_signature() {
        let summarizer = Recording {
            prompts: RefCell::new(Vec::new()),
            answer: Some("Two meetings moved.".into()),
        };
        let template = PromptTemplate::new("Summarize:\n{email_content}");
        let summary = summarize_digest(&summarizer, &template, "records", "\n-- sig");
        assert_eq!(summary.as_deref(), Some("Two meetings moved.\n-- sig"));
        assert_eq!(summarizer.prompts.borrow()[0], "Summarize:\nrecords");
    }

    #[test]
    fn test_summarize_failure_is_none() {
        let summarizer = Recording {
            prompts: RefCell::new(Vec::new()),
            answer: None,
        };
        let template = PromptTemplate::new("{email_content}");
        assert_eq!(summarize_digest(&summarizer, &template, "x", ""), None);
    }

    #[test]
    fn test_response_parsing_tolerates_null_content() {
        let parsed: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#)
                .expect("valid json");
        assert!(parsed.choices[0].message.content.is_none());
    }

    #[test]
    fn test_load_missing_template_is_io_error() {
        let err = PromptTemplate::load(Path::new("/nonexistent/prompt.txt")).unwrap_err();
        assert!(matches!(err, DigestError::Io { .. }));
    }
}
