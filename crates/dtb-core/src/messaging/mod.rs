//! Outbound messaging port (Telegram today).

pub mod port;
