mod core;
mod http;

pub use core::{N8nMcpServer, render_envelope, serve_stdio};
pub use http::{DEFAULT_BIND_ADDRESS, McpHttpServer, RunningMcpHttpServer, resolve_bind_address};
