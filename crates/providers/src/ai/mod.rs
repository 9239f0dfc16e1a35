//! AI model and search providers

pub mod anthropic;
pub mod bedrock;
pub mod deepseek;
pub mod exa;
pub mod gemini;
pub mod groq;
pub mod mistral;
pub mod openai;
pub mod openrouter;
pub mod perplexity;
mod sigv4;
pub mod xai;
