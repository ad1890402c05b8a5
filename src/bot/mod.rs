//! Bot-facing surface: startup wiring and the command table

pub mod commands;
pub mod startup;

pub use commands::{CommandHandler, CommandLog, CommandResponse, CommandRouter, FaqCommand};
pub use startup::{prewarm, BotCore, PrewarmReport};
