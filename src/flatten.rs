//! Post-processing transform that collapses nested body mappings into
//! path-joined keys at the root.
//!
//! Purely optional: parsing never depends on it and it cannot fail.
//! Paths are joined with `.`; if two distinct paths collapse to the
//! same key, the later one wins, consistent with the duplicate-key
//! rule for bodies.

use crate::types::{Body, Record, Value};

/// Separator between path segments of flattened keys.
pub const SEPARATOR: char = '.';

/// Flatten a body mapping. Idempotent on an already-flat mapping.
pub fn flatten(body: &Body) -> Body {
    let mut flat = Body::with_capacity(body.len());
    walk(body, None, &mut flat);
    flat
}

fn walk(map: &Body, prefix: Option<&str>, out: &mut Body) {
    for (key, value) in map {
        let path = match prefix {
            Some(prefix) => format!("{}{}{}", prefix, SEPARATOR, key),
            None => key.clone(),
        };
        match value {
            Value::Str(s) => {
                out.insert(path, Value::Str(s.clone()));
            }
            Value::Map(m) => walk(m, Some(&path), out),
        }
    }
}

impl Record {
    /// Returns the record with its body flattened; the header is left
    /// untouched.
    pub fn into_flat(mut self) -> Record {
        self.body = flatten(&self.body);
        self
    }
}
