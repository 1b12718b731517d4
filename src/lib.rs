//! # Product Tracker
//!
//! A small inventory API with natural-language product search.
//!
//! Products are stored in SQLite and exposed over a CRUD HTTP API. Search
//! queries written in plain language are translated into a structured
//! filter by a chat-completion model, the model output is sanitized and
//! validated, and the resulting filter is compiled into a store predicate.
//!
//! ## Architecture
//!
//! ```text
//! "iphones under 500"
//!        │
//!        ▼
//! ┌──────────────┐   ┌──────────┐   ┌────────────────┐   ┌───────────┐   ┌─────────┐
//! │ build_prompt │──▶│   LLM    │──▶│    sanitize    │──▶│ from_json │──▶│ compile │
//! └──────────────┘   └──────────┘   └────────────────┘   └───────────┘   └────┬────┘
//!                                                                             │ Predicate
//!                                                                             ▼
//!                                                                      ┌──────────────┐
//!                                                                      │ ProductStore │
//!                                                                      └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! ptrack init                          # create database and seed samples
//! ptrack list
//! ptrack search "iphones under 500"
//! ptrack serve                         # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Product data types |
//! | [`filter`] | Structured filter schema |
//! | [`sanitize`] | JSON extraction from model output |
//! | [`translate`] | Query → filter translation |
//! | [`predicate`] | Filter → store predicate compilation |
//! | [`search`] | Search orchestration |
//! | [`llm`] | Language-model client |
//! | [`store`] | Product persistence |
//! | [`server`] | HTTP server |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema and seed data |

pub mod config;
pub mod db;
pub mod error;
pub mod filter;
pub mod llm;
pub mod migrate;
pub mod models;
pub mod predicate;
pub mod product_cmd;
pub mod sanitize;
pub mod search;
pub mod server;
pub mod store;
pub mod translate;
