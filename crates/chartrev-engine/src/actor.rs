// actor.rs — The already-authenticated caller of an engine operation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity attached to every mutation. The engine records it on revisions
/// and in logs; deciding whether the actor may act is the caller's job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: String,
}

impl Actor {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.user_id)
    }
}
