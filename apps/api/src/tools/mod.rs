// Stateless edge functions that forward to third-party HTTP APIs
// other than the LLM provider.

pub mod fetch_url;
pub mod handlers;
pub mod tts;

pub use fetch_url::{FetchError, PageFetcher};
pub use tts::{SpeechClient, SpeechError};
