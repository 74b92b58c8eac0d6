//! Notification sinks for scan results.

mod console;
mod telegram;

pub use console::{strip_html, ConsoleNotifier};
pub use telegram::{split_message, TelegramConfig, TelegramNotifier, MAX_MESSAGE_CHARS};
