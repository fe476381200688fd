use std::fmt::{self, Debug};

use indexmap::IndexMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// The key/value mapping that makes up a record body (or a nested
/// sub-record within one).
///
/// Insertion order is kept so that serialized output lists fields in
/// the order they appeared on the log line; re-inserting an existing
/// key overwrites its value in place (last write wins).
pub type Body = IndexMap<String, Value>;

/// A single body value.
///
/// Scalars carry the raw token text: a double-quoted value such as
/// `comm="cat"` keeps its quotes, while single-quoted sub-records and
/// brace-delimited structures have already been recursed into and
/// appear as nested mappings.
#[derive(Clone, PartialEq, Eq)]
pub enum Value {
    Str(String),
    Map(Body),
}

impl Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "Str:<{}>", s),
            Value::Map(m) => {
                write!(f, "Map:")?;
                f.debug_map().entries(m.iter()).finish()
            }
        }
    }
}

impl Serialize for Value {
    #[inline(always)]
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Str(v) => s.serialize_str(v),
            Value::Map(m) => {
                let mut map = s.serialize_map(Some(m.len()))?;
                for (k, v) in m {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<Body> for Value {
    fn from(m: Body) -> Self {
        Value::Map(m)
    }
}

/// The fixed-shape prefix of every audit log line: the record type tag
/// and the verbatim `audit(<timestamp>:<serial>)` event identifier.
///
/// The identifier is not decomposed further; translating it into a
/// timestamp and sequence number is left to consumers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Header {
    pub r#type: String,
    pub msg: String,
}

/// One parsed audit log line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Record {
    pub header: Header,
    pub body: Body,
}
