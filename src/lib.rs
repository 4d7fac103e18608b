//! Retention Agent — staged customer-retention conversations over an LLM,
//! with TF-IDF retrieval from a policy document.

pub mod api;
pub mod cli;
pub mod config;
pub mod conversation;
pub mod customers;
pub mod documents;
pub mod error;
pub mod llm;
pub mod notify;
