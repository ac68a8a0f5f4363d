//! newsdigest - news digest API
//!
//! Serves scraped news articles by day, proxies chat prompts to an agent
//! runtime and builds LLM-written daily digests with Gemini on Vertex AI.
//!
//! # Architecture
//! - `api`: HTTP routes and middleware
//! - `services`: articles, agent runtime client, Vertex AI client, digests
//! - `storage`: SeaORM storage (SQLite, MySQL, PostgreSQL)
//! - `config`: static configuration (TOML + environment)
//! - `runtime`: startup, shutdown and execution modes
//! - `interfaces`: offline CLI commands
//! - `system`: logging

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod interfaces;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
