//! Generation adapters.
//!
//! Implementations of the Generator port.
//!
//! ## Available Adapters
//!
//! - `MockGenerator` - Configurable mock for testing
//! - `AnthropicGenerator` - Anthropic Claude models

mod anthropic;
mod mock;
mod parse;

pub use anthropic::{AnthropicGenerator, AnthropicGeneratorConfig};
pub use mock::{GeneratorCall, MockGenerator};
pub use parse::{extract_json_object, truncate_chars};
