use serde::{Deserialize, Serialize};

/// Oracle judgment for an adjacent page pair `(a, a + 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Same,
    Different,
    /// The oracle's answer could not be read as either of the above.
    Unknown,
}

impl Verdict {
    /// Boundary this verdict opens before the second page, if any.
    ///
    /// `Unknown` splits too: merging unrelated topics silently is worse than an extra cut.
    pub fn boundary(self) -> Option<Boundary> {
        match self {
            Verdict::Same => None,
            Verdict::Different => Some(Boundary::Confident),
            Verdict::Unknown => Some(Boundary::Ambiguous),
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Same => write!(f, "same"),
            Verdict::Different => write!(f, "different"),
            Verdict::Unknown => write!(f, "unknown"),
        }
    }
}

/// How a segment's first page came to start a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Boundary {
    /// Page 0.
    DocumentStart,
    /// The oracle said `Different`.
    Confident,
    /// The oracle said `Unknown` (or failed) and the pair was split anyway.
    Ambiguous,
}

impl Boundary {
    pub fn is_ambiguous(self) -> bool {
        self == Boundary::Ambiguous
    }
}
