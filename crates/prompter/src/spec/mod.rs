pub mod prompt;
pub mod resource;

pub use prompt::{PromptSpec, PromptType, REQUIRED_FIELDS, StoreTarget};
pub use resource::ResourceConfig;
