//! Prompt system for Concierge.
//!
//! This crate provides:
//! - Handlebars rendering of the per-stage input messages
//! - YAML instruction overrides for the router's agents

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::{render_template, StageTemplate};
pub use loader::{list_prompts, load_instruction_overrides, load_prompt};
pub use types::PromptDefinition;
