use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Brand {
    pub name: String,
}

impl Brand {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
