//! Remote service implementations.

pub mod openai;

pub use openai::{OpenAiClient, OpenAiSettings};
