//! NORI Core Parser
//!
//! Self-contained JSON parsing library: turns a text buffer into an owned
//! tree of [`Value`]s and lets callers navigate it by index or key. No I/O,
//! no serialization contract, no streaming - one buffer in, one tree out.
//!
//! # Architecture
//!
//! - **table.rs** - open-addressing string-keyed table backing JSON objects
//! - **value.rs** - the `Value` sum type and accessor API
//! - **parser.rs** - recursive-descent parser with byte-offset tracking
//! - **error.rs** - `ParseError` / `ErrorKind`
//!
//! # Example
//!
//! ```
//! use nori_core::parse;
//!
//! let value = parse(r#"{"name": "miso", "tags": ["soup", "broth"]}"#).unwrap();
//! assert_eq!(value.get("name").and_then(|v| v.as_str()), Some("miso"));
//! assert_eq!(value.get("tags").and_then(|v| v.get_index(1)).and_then(|v| v.as_str()), Some("broth"));
//! ```
//!
//! Trailing bytes after the root value are left unconsumed; strict callers
//! check the consumed length from [`parse_prefix`]:
//!
//! ```
//! use nori_core::parse_prefix;
//!
//! let (value, consumed) = parse_prefix("{}   leftovers").unwrap();
//! assert!(value.is_object());
//! assert_eq!(consumed, 2);
//! ```

pub mod error;
pub mod parser;
pub mod table;
pub mod value;

pub use error::{ErrorKind, ParseError};
pub use parser::{
    parse, parse_prefix, parse_prefix_with_options, parse_with_options, ParseOptions, Parser,
    DEFAULT_MAX_DEPTH,
};
pub use table::Table;
pub use value::Value;
