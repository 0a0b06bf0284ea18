pub mod openai;

pub use openai::{OpenAiConfig, OpenAiProvider, DEEPSEEK_BASE_URL, DEEPSEEK_DEFAULT_MODEL};
