use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-internal handle of a record. Allocated in insertion order, so iterating ids in
/// ascending order is collection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
