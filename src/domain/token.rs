// ============================================================
// Layer 3: Token
// ============================================================
// The canonical string form of one musical event.
//   single note → "C4", "F#3", "B-2"
//   chord       → "0.4.7" (normal-order pitch classes)
//
// Two tokens are equal iff their strings match exactly, and the
// derived Ord is plain lexicographic order on the string, which
// is what the vocabulary sorts by.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Token {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Build a token stream from string literals
#[cfg(test)]
pub fn tokens<'a>(items: impl IntoIterator<Item = &'a str>) -> Vec<Token> {
    items.into_iter().map(Token::from).collect()
}
