pub mod answer;
pub mod provider;
pub mod providers;

pub use answer::AnswerSynthesizer;
pub use provider::{LlmError, LlmProvider, Message, Role};
