pub mod invoke;
pub mod parse;

pub use invoke::{Engine, EngineInfo};
pub use parse::{EngineRecord, parse_records};
