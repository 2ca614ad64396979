//! HTTP boundary: routing, admission middleware, and rejection responses.

mod middleware;
mod server;

pub use middleware::{admission_middleware, Message};
pub use server::HttpServer;
