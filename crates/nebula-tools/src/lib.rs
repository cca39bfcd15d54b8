//! Nebula Tools - Collaborator Registry and Built-in Tools
//!
//! This crate provides the tool system for Nebula:
//! - Registry: tool registration and discovery (an explicit object, never
//!   ambient global state)
//! - Actions: structured automation steps for desktop control
//! - Builtins: built-in collaborators (app control, file operations,
//!   system commands, code execution, screen reading, web search)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod actions;
pub mod builtins;
pub mod error;
pub mod registry;
pub mod security;

pub use actions::{ActionStep, AutomationDriver, NoopDriver};
pub use builtins::{register_builtins, BuiltinsConfig};
pub use error::{Error, Result};
pub use registry::{Tool, ToolDefinition, ToolRegistry, ToolResult};
