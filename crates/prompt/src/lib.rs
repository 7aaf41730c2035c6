//! Prompt system for DocQA.
//!
//! This crate provides structured prompt management with:
//! - YAML-based prompt definitions
//! - Built-in definitions for the router and reasoner stages
//! - Workspace overrides in `.docqa/prompts/`
//! - Handlebars template rendering

pub mod builder;
pub mod builtin;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use builtin::{REASONER_ANSWER, ROUTER_SELECT};
pub use loader::{list_prompts, load_prompt};
pub use types::{BuiltPrompt, PromptDefinition, PromptOutputSpec};
