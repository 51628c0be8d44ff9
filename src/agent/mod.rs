//! Agent invocation subsystem for tandem.
//!
//! - **Invoker**: one blocking LLM turn via the configured CLI, behind the
//!   [`AgentInvoker`] trait so the execution loop can be driven by scripted
//!   invokers in tests.
//! - **Prompt**: the three prompt variants fed to the executor and checker
//!   roles.
//!
//! Any CLI that accepts a prompt and prints a reply works; the JSON envelope
//! parsing and resume flag match the `claude` CLI by default and are
//! configurable through `tandem.yaml`.

pub mod invoker;
pub mod prompt;

pub use invoker::{AgentInvoker, AgentReply, CliInvoker, InvokeError};
