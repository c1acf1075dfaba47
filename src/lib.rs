//! Kai, a small personal site: a page of short thoughts and a question
//! endpoint answered by an external language model.

pub mod config;
pub mod error;
pub mod http;
pub mod llm;
pub mod logger;
pub mod store;
