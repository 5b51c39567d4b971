pub mod types;
pub mod ai_client;
pub mod extractor;

pub use ai_client::{AzureOpenAiClient, CompletionClient};
