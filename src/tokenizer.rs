//! Longest-match tokenizer over a list of DFA rules.

use crate::dfa::Dfa;

/// A lexed token: the rule name that matched and the matched text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: String,
    pub lexeme: String,
}

impl Token {
    pub fn new(kind: impl Into<String>, lexeme: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            lexeme: lexeme.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenizeError {
    #[error("unexpected character at position {position}")]
    UnexpectedCharacter { position: usize },
}

/// A scanner built from `(token kind, DFA)` rules.
///
/// Rule order is priority order: when two rules match the same length, the
/// rule registered first wins.
#[derive(Debug, Default)]
pub struct Tokenizer {
    rules: Vec<(String, Dfa)>,
}

impl Tokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule. Returns `self` for chaining.
    pub fn rule(&mut self, kind: impl Into<String>, dfa: Dfa) -> &mut Self {
        self.rules.push((kind.into(), dfa));
        self
    }

    /// Scan `input` into tokens by maximal munch.
    ///
    /// Whitespace between tokens is skipped. Every rule's DFA is simulated
    /// from the current position; the greatest match length wins and empty
    /// matches never consume input. `position` in the error is a character
    /// index.
    pub fn tokenize(&self, input: &str) -> Result<Vec<Token>, TokenizeError> {
        let chars: Vec<char> = input.chars().collect();
        let mut tokens = Vec::new();
        let mut pos = 0;

        while pos < chars.len() {
            if chars[pos].is_whitespace() {
                pos += 1;
                continue;
            }

            let mut best: Option<(usize, usize)> = None; // (rule index, length)
            for (i, (_, dfa)) in self.rules.iter().enumerate() {
                if let Some(len) = dfa.longest_match(&chars[pos..]) {
                    if len > 0 && best.map_or(true, |(_, best_len)| len > best_len) {
                        best = Some((i, len));
                    }
                }
            }

            match best {
                Some((rule, len)) => {
                    tokens.push(Token {
                        kind: self.rules[rule].0.clone(),
                        lexeme: chars[pos..pos + len].iter().collect(),
                    });
                    pos += len;
                }
                None => return Err(TokenizeError::UnexpectedCharacter { position: pos }),
            }
        }

        Ok(tokens)
    }
}
