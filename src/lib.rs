//! `deepl-translator` is an async client for the DeepL web translator.
//!
//! Requests go either to the JSON-RPC endpoint ([`JsonRpcTransport`]) or
//! through a headless browser driving the web UI ([`BrowserTransport`]).
//! [`Translator`] adds validation, retries with a caller-defined backoff,
//! and background dispatch:
//! - [`Translator::translate`]
//! - [`Translator::translate_blocking`]
//! - [`Translator::translate_async`]
//! - [`Translator::translate_with_callback`]
//! - [`Translator::shutdown`]

mod browser;
mod client;
mod decode;
mod error;
mod jsonrpc;
mod language;
mod options;
mod transport;
mod types;
mod wire;

pub use browser::{
    BrowserDriver, BrowserTransport, DriverFactory, DEFAULT_TRANSLATOR_URL, RESULT_ATTRIBUTE,
    RESULT_ELEMENT_CLASS,
};
pub use client::{TranslationHandle, Translator, DEFAULT_MAX_WORKERS};
pub use decode::RATE_LIMIT_ERROR_CODE;
pub use error::{FailureKind, TranslatorError};
pub use jsonrpc::{JsonRpcTransport, DEFAULT_JSONRPC_URL};
pub use language::{SourceLanguage, TargetLanguage};
pub use options::{default_repetitions_delay, ClientOptions, Repetitions, RepetitionsDelay};
pub use transport::Transport;
pub use types::{normalize_whitespace, Beam, Translation, TranslationRequest, MAX_TEXT_CHARS};

pub type Result<T> = std::result::Result<T, TranslatorError>;
