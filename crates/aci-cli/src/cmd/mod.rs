pub mod call;
pub mod config;
pub mod edit;
pub mod lint;
pub mod mcp;
pub mod viewer;
