//! Command handling - parsing and permission-gated routing

pub mod parser;
pub mod router;

pub use parser::{CommandParser, ParsedCommand};
pub use router::{CommandHandler, CommandInfo, CommandInvocation, CommandRouter, RouteOutcome};
