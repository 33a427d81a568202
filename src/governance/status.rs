//! EIP lifecycle status

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of an improvement proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EipStatus {
    Draft,
    Review,
    #[serde(rename = "Last Call", alias = "LastCall")]
    LastCall,
    Final,
    Stagnant,
    Withdrawn,
    Living,
}

impl EipStatus {
    pub const ALL: [EipStatus; 7] = [
        EipStatus::Draft,
        EipStatus::Review,
        EipStatus::LastCall,
        EipStatus::Final,
        EipStatus::Stagnant,
        EipStatus::Withdrawn,
        EipStatus::Living,
    ];

    /// Final and Living have no outbound edges
    pub fn is_terminal(&self) -> bool {
        matches!(self, EipStatus::Final | EipStatus::Living)
    }

    /// Identifier form used in reason strings ("LastCall")
    pub fn name(&self) -> &'static str {
        match self {
            EipStatus::LastCall => "LastCall",
            other => other.as_str(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EipStatus::Draft => "Draft",
            EipStatus::Review => "Review",
            EipStatus::LastCall => "Last Call",
            EipStatus::Final => "Final",
            EipStatus::Stagnant => "Stagnant",
            EipStatus::Withdrawn => "Withdrawn",
            EipStatus::Living => "Living",
        }
    }
}

impl Default for EipStatus {
    fn default() -> Self {
        EipStatus::Draft
    }
}

impl fmt::Display for EipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EipStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = fold(s);
        EipStatus::ALL
            .into_iter()
            .find(|status| fold(status.as_str()) == key)
            .ok_or_else(|| format!("Unknown EIP status '{}'", s))
    }
}

/// Lowercase with separators removed, so "Last Call" and "last_call" compare equal
fn fold(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .collect::<String>()
        .to_ascii_lowercase()
}
