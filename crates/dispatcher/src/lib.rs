pub mod client;
pub mod parse;
pub mod prompt;
pub mod service;

pub use client::EndpointClient;
pub use parse::{parse_model_response, ParsedTranslation};
pub use prompt::{build_prompt, truncate_input, MAX_INPUT_CHARS};
pub use service::{Dispatcher, DispatcherConfig, CREDENTIAL_MISSING, FORMAT_UNEXPECTED};
