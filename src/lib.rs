pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod flatten;
pub mod lexer;
pub mod parser;
pub mod types;

pub use parser::{parse, parse_line, ParseError};
pub use types::{Body, Header, Record, Value};
