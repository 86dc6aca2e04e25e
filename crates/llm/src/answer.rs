use std::path::Path;

use tracing::{debug, info};

use crate::provider::{LlmError, LlmProvider, Message, Role};

/// Path to the externalized answer system prompt template, relative to the
/// workspace root the server runs from.
const ANSWER_TEMPLATE_PATH: &str = "data/prompts/answer-system.md";

/// Placeholder replaced with the retrieved paper excerpts.
const CONTEXT_PLACEHOLDER: &str = "<<<context>>>";
/// Placeholder replaced with the rendered conversation history.
const HISTORY_PLACEHOLDER: &str = "<<<history>>>";

/// Turns a question plus retrieved excerpts into a grounded answer via an LLM.
pub struct AnswerSynthesizer {
    provider: Box<dyn LlmProvider>,
    temperature: f32,
    max_tokens: u32,
    /// The system prompt template loaded from disk at construction time.
    template: String,
}

impl AnswerSynthesizer {
    pub fn new(provider: Box<dyn LlmProvider>, temperature: f32, max_tokens: u32) -> Self {
        let template = load_template(ANSWER_TEMPLATE_PATH)
            .expect("answer system prompt template must exist at startup");
        Self {
            provider,
            temperature,
            max_tokens,
            template,
        }
    }

    /// Build from config, creating the appropriate provider.
    pub fn from_config(
        llm_config: &paperchat_core::config::LlmConfig,
        ollama_config: &paperchat_core::config::OllamaConfig,
    ) -> Result<Self, LlmError> {
        let provider = crate::providers::create_provider(llm_config, ollama_config)?;
        Ok(Self::new(
            provider,
            llm_config.temperature,
            llm_config.max_tokens,
        ))
    }

    /// Constructor that takes the template directly instead of reading disk.
    pub fn with_template(
        provider: Box<dyn LlmProvider>,
        temperature: f32,
        max_tokens: u32,
        template: String,
    ) -> Self {
        Self {
            provider,
            temperature,
            max_tokens,
            template,
        }
    }

    /// Answer `question` from retrieved excerpts and prior conversation.
    pub async fn synthesize(
        &self,
        question: &str,
        contexts: &[String],
        history: &[Message],
    ) -> Result<String, LlmError> {
        let system_prompt = self
            .template
            .replace(CONTEXT_PLACEHOLDER, &render_contexts(contexts))
            .replace(HISTORY_PLACEHOLDER, &render_history(history));

        info!("synthesizing answer from {} excerpts", contexts.len());

        let messages = vec![Message::system(system_prompt), Message::user(question)];

        let answer = self
            .provider
            .complete(messages, self.temperature, self.max_tokens)
            .await?;

        debug!("LLM answer: {answer}");
        Ok(answer)
    }
}

/// Number the excerpts so the model can refer back to them.
fn render_contexts(contexts: &[String]) -> String {
    if contexts.is_empty() {
        return "(no excerpts retrieved)".to_string();
    }
    contexts
        .iter()
        .enumerate()
        .map(|(i, text)| format!("[{}] {}", i + 1, text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Render prior turns as labeled lines, oldest first.
fn render_history(history: &[Message]) -> String {
    if history.is_empty() {
        return "(no previous conversation)".to_string();
    }
    history
        .iter()
        .map(|m| match m.role {
            Role::User => format!("User: {}", m.content),
            Role::Assistant => format!("Assistant: {}", m.content),
            Role::System => format!("System: {}", m.content),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Load a prompt template from disk, failing eagerly with a clear message.
fn load_template(path: &str) -> Result<String, String> {
    let path = Path::new(path);
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read prompt template at {}: {e}", path.display()))?;

    for placeholder in [CONTEXT_PLACEHOLDER, HISTORY_PLACEHOLDER] {
        let count = content.matches(placeholder).count();
        if count != 1 {
            return Err(format!(
                "prompt template at {} must contain exactly one '{placeholder}' placeholder, found {count}",
                path.display()
            ));
        }
    }

    Ok(content)
}
