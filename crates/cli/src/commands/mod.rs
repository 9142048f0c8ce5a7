//! CLI command handlers.

mod ask;
mod chat;

pub use ask::AskCommand;
pub use chat::ChatCommand;
