pub mod client;

pub use client::{ClassifyOptions, Completion, HttpGateway, LanguageModelGateway, Provider, Usage};
