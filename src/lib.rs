//! # AlloyDB Survey MCP Server
//!
//! A Model Context Protocol (MCP) server that exposes survey records stored in
//! Google Cloud AlloyDB for PostgreSQL to AI assistants.
//!
//! This crate provides:
//! - **Tools**: Fetch surveys by filter, summarize the table, search question
//!   and response text
//! - **Resources**: Read-only statistics, locations and respondent types
//!
//! ## Architecture
//!
//! The server follows MCP protocol semantics:
//! - Tools for parameterized queries
//! - Resources for passive, argument-free snapshots
//!
//! All data access is read-only and goes through a bounded `sqlx` pool with
//! bound parameters and a per-query timeout.

pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod handlers;
pub mod resources;
pub mod security;
pub mod server;
pub mod shutdown;
pub mod tools;

pub use config::Config;
pub use error::{McpError, ServerError};
pub use server::SurveyMcpServer;
