//! chat-review library exports for testing

pub mod core;
pub mod task;
pub mod tui;

#[cfg(test)]
pub mod test_support;
