use serde::{Deserialize, Serialize};

/// How parse input is split into terminals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tokenizer {
  /// Pad every occurrence of each terminal (longest first) with spaces,
  /// then split on whitespace.
  #[default]
  Substitution,
  /// Take the longest terminal at each position; anything else runs up to
  /// the next whitespace or terminal and becomes a token of its own.
  MaximalMunch,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  pub tokenizer: Tokenizer,
  /// Reject grammars that use a non-terminal without a rule for it.
  pub strict_symbols: bool,
}
