//! Tiny ERP MCP Gateway Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod config;
pub mod erp;
pub mod mcp;
pub mod server;
