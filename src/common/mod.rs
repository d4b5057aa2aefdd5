//! Common utilities shared by the CLI, the runners, and the mock simulator

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use error::{Error, Result};

/// Parse a "listening at:" address from a child process's output.
/// Handles IPv6 format [::]:PORT by converting to 127.0.0.1:PORT
pub fn parse_listen_address(line: &str) -> Option<String> {
    let addr_start = line.find("listening at:")?;
    let addr = line[addr_start + "listening at:".len()..].trim().to_string();
    if addr.starts_with("[::]:") {
        Some(addr.replace("[::]:", "127.0.0.1:"))
    } else {
        Some(addr)
    }
}
