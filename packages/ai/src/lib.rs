// ABOUTME: LLM provider integration for PromptForge
// ABOUTME: All pipeline non-determinism sits behind the Generator trait

pub mod generator;
pub mod provider;

pub use generator::{GenerateError, GenerateResult, Generator};
pub use provider::{AnthropicProvider, ProviderConfig, Usage};
