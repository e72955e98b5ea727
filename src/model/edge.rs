//! Link between two spots of a track.

use serde::{Deserialize, Serialize};
use super::{EdgeId, SpotId};

/// A link from one spot to the next in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub source: SpotId,
    pub target: SpotId,
}

impl Edge {
    pub fn new(id: EdgeId, source: SpotId, target: SpotId) -> Self {
        Self { id, source, target }
    }
}
