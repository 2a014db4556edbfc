//! API root discovery document

use serde::{Deserialize, Serialize};

/// Collection URLs advertised by the API root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiRoot {
    pub sprints: String,
    pub tasks: String,
    pub users: String,
}
