use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Condition — Normalized physical condition of a listed card
// ---------------------------------------------------------------------------

/// Maximum number of characters kept from condition text that matches no
/// known code or name.
pub const MAX_RAW_CONDITION_LEN: usize = 32;

/// Condition of a listed item, ordered from best (`Mint`) to worst (`Poor`).
///
/// Text that cannot be normalized is preserved in [`Condition::Other`]
/// (truncated to [`MAX_RAW_CONDITION_LEN`] characters) rather than dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Condition {
    Mint,
    NearMint,
    Excellent,
    Good,
    LightPlayed,
    Played,
    Poor,
    Other(String),
}

impl Condition {
    /// All known conditions, best first.
    pub const KNOWN: [Condition; 7] = [
        Condition::Mint,
        Condition::NearMint,
        Condition::Excellent,
        Condition::Good,
        Condition::LightPlayed,
        Condition::Played,
        Condition::Poor,
    ];

    /// The two-letter marketplace code (`MT`, `NM`, ...), or the raw text for
    /// [`Condition::Other`].
    pub fn code(&self) -> &str {
        match self {
            Condition::Mint => "MT",
            Condition::NearMint => "NM",
            Condition::Excellent => "EX",
            Condition::Good => "GD",
            Condition::LightPlayed => "LP",
            Condition::Played => "PL",
            Condition::Poor => "PO",
            Condition::Other(raw) => raw,
        }
    }

    /// Look up a condition by code or full name (case-insensitive).
    ///
    /// Accepts every entry of the rank table, e.g. `"nm"`, `"Near Mint"`,
    /// `"M"`, `"Lightly Played"`. Returns `None` for anything else.
    pub fn from_code(code: &str) -> Option<Condition> {
        let upper = code.trim().to_uppercase();
        let condition = match upper.as_str() {
            "MT" | "M" | "MINT" => Condition::Mint,
            "NM" | "NEAR MINT" => Condition::NearMint,
            "EX" | "EXCELLENT" => Condition::Excellent,
            "GD" | "GOOD" => Condition::Good,
            "LP" | "LIGHT PLAYED" | "LIGHTLY PLAYED" => Condition::LightPlayed,
            "PL" | "PLAYED" => Condition::Played,
            "PO" | "POOR" => Condition::Poor,
            _ => return None,
        };
        Some(condition)
    }

    /// Ordinal quality, 7 for `Mint` down to 1 for `Poor`.
    ///
    /// [`Condition::Other`] ranks by its text when that text is a known
    /// code or name, and 0 otherwise.
    pub fn rank(&self) -> u8 {
        match self {
            Condition::Mint => 7,
            Condition::NearMint => 6,
            Condition::Excellent => 5,
            Condition::Good => 4,
            Condition::LightPlayed => 3,
            Condition::Played => 2,
            Condition::Poor => 1,
            Condition::Other(raw) => Condition::from_code(raw).map_or(0, |c| c.rank()),
        }
    }

    /// Whether this condition is at least as good as `minimum`.
    pub fn meets(&self, minimum: &Condition) -> bool {
        self.rank() >= minimum.rank()
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl From<Condition> for String {
    fn from(condition: Condition) -> Self {
        match condition {
            Condition::Other(raw) => raw,
            known => known.code().to_string(),
        }
    }
}

impl From<String> for Condition {
    fn from(raw: String) -> Self {
        Condition::from_code(&raw).unwrap_or_else(|| {
            Condition::Other(raw.chars().take(MAX_RAW_CONDITION_LEN).collect())
        })
    }
}
