//! Command handlers for the DocQA CLI.
//!
//! Each command is a thin shell over `docqa_knowledge`; none of them holds
//! question-answering logic of its own.

pub mod ask;
pub mod chat;
pub mod documents;
pub mod models;
pub mod prompts;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use documents::DocumentsCommand;
pub use models::ModelsCommand;
pub use prompts::PromptsCommand;
