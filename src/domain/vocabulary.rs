// ============================================================
// Layer 3: Vocabulary
// ============================================================
// A bijection between the distinct tokens of a corpus and the
// dense ids 0..len().
//
// Ids are assigned in sorted token order, so the same set of
// distinct tokens always yields the same mapping, no matter the
// order or multiplicity they were observed in.
//
// Example:
//   stream  = [C4, D4, C4, 0.4.7]
//   sorted  = [0.4.7, C4, D4]
//   mapping = {0.4.7: 0, C4: 1, D4: 2}

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::domain::error::PipelineError;
use crate::domain::token::Token;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Token>", into = "Vec<Token>")]
pub struct Vocabulary {
    /// id → token, sorted ascending
    tokens: Vec<Token>,
    /// token → id
    index:  HashMap<Token, usize>,
}

impl Vocabulary {
    /// Build the vocabulary of a token stream.
    /// Fails with InvalidCorpus when the stream is empty.
    pub fn build(stream: &[Token]) -> Result<Self, PipelineError> {
        if stream.is_empty() {
            return Err(PipelineError::InvalidCorpus {
                dir:    Default::default(),
                reason: "no tokens were extracted from any file".to_string(),
            });
        }

        let distinct: BTreeSet<&Token> = stream.iter().collect();
        Ok(Self::from(distinct.into_iter().cloned().collect::<Vec<_>>()))
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn id_of(&self, token: &Token) -> Option<usize> {
        self.index.get(token).copied()
    }

    pub fn token_of(&self, id: usize) -> Option<&Token> {
        self.tokens.get(id)
    }

    /// All tokens in id order
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Map a whole stream to ids. Tokens outside the vocabulary yield None.
    pub fn encode_stream(&self, stream: &[Token]) -> Option<Vec<usize>> {
        stream.iter().map(|t| self.id_of(t)).collect()
    }
}

impl From<Vec<Token>> for Vocabulary {
    /// Rebuild from a token list. The list is sorted and de-duplicated
    /// first, so the bijection holds even for hand-made input.
    fn from(mut tokens: Vec<Token>) -> Self {
        tokens.sort();
        tokens.dedup();
        let index = tokens
            .iter()
            .enumerate()
            .map(|(id, t)| (t.clone(), id))
            .collect();
        Self { tokens, index }
    }
}

impl From<Vocabulary> for Vec<Token> {
    fn from(v: Vocabulary) -> Self {
        v.tokens
    }
}
