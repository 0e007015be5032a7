use serde::{Deserialize, Serialize};

/// Families of enumeration data used to populate form dropdowns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupKind {
    Color,
    Fuel,
    Station,
    Status,
    Group,
    Tyre,
    Category,
    Segment,
}

impl LookupKind {
    pub const ALL: [LookupKind; 8] = [
        Self::Color,
        Self::Fuel,
        Self::Station,
        Self::Status,
        Self::Group,
        Self::Tyre,
        Self::Category,
        Self::Segment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Color => "color",
            Self::Fuel => "fuel",
            Self::Station => "station",
            Self::Status => "status",
            Self::Group => "group",
            Self::Tyre => "tyre",
            Self::Category => "category",
            Self::Segment => "segment",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupItem {
    pub code: String,
    pub label: String,
}
