//! Tool surface: the registry of declared tools and the dispatcher.

pub mod dispatch;
pub mod registry;

pub use dispatch::Dispatcher;
pub use registry::{list_tools, ToolName};
