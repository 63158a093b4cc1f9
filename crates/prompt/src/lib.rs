//! Prompt composition for Bharat Sanchar.
//!
//! Turns a question and the schemes retrieved for it into a grounded
//! system instruction and user prompt. Composition is pure and total:
//! the same inputs always produce the same prompt.
//!
//! Workspaces may override the built-in wording with Handlebars templates
//! in `.sanchar/prompts/<id>.yml`.

pub mod composer;
pub mod loader;
pub mod types;

// Re-export main types
pub use composer::{
    render_scheme_block, PromptComposer, NO_SCHEME_MARKER, RELATED_SCHEMES_HEADING,
};
pub use loader::{find_templates, DEFAULT_TEMPLATE_ID};
pub use types::{ComposedPrompt, ComposedPromptMetadata, PromptTemplates};
