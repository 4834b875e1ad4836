//! Prompt domain
//!
//! Three-part prompt structure and the templates used at each phase of a
//! deliberation round.

pub mod parts;
pub mod template;

pub use parts::PromptParts;
pub use template::DeliberationPrompts;
