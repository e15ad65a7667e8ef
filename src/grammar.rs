use std::fmt::{self, Display, Formatter};
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use thiserror::Error;

/// End-of-input marker, always a terminal.
pub const END: &str = "$";

/// Marker for the empty string in FIRST sets and in rendered productions.
pub const EPSILON: &str = "ε";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
  #[error("no valid grammar rules found")]
  EmptyGrammar,
  #[error("invalid rule format (missing '->') in: {0}")]
  MissingArrow(String),
  #[error("invalid rule format (more than one '->') in: {0}")]
  ExtraArrow(String),
  #[error("invalid rule with empty LHS or RHS in: {0}")]
  EmptySide(String),
  #[error("left-hand side is not a non-terminal in: {0}")]
  InvalidLhs(String),
  #[error("non-terminal {0} is used but has no rule")]
  UndefinedNonterminal(String),
}

/// A symbol is a non-terminal iff it consists of uppercase letters only.
pub fn is_nonterminal_name(sym: &str) -> bool {
  !sym.is_empty() && sym.chars().all(char::is_uppercase)
}

/// Normalized grammar text, before augmentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
  start: String,
  /// LHS -> alternatives, in input order. An empty alternative is ε.
  rules: IndexMap<String, Vec<Vec<String>>>,
}

impl Grammar {
  /// Parses `LHS -> A B | C ; LHS2 -> ...`.
  ///
  /// The start symbol is the LHS of the first rule. Repeated rules for
  /// one LHS merge their alternatives; duplicate alternatives are kept once.
  pub fn parse(text: &str) -> Result<Grammar, GrammarError> {
    let mut rules: IndexMap<String, Vec<Vec<String>>> = IndexMap::new();

    for rule in text.split(';') {
      let rule = rule.trim();
      if rule.is_empty() {
        continue;
      }

      let (lhs, rhs) = match rule.split_once("->") {
        Some(sides) => sides,
        None => return Err(GrammarError::MissingArrow(rule.to_owned())),
      };
      if rhs.contains("->") {
        return Err(GrammarError::ExtraArrow(rule.to_owned()));
      }

      let (lhs, rhs) = (lhs.trim(), rhs.trim());
      if lhs.is_empty() || rhs.is_empty() {
        return Err(GrammarError::EmptySide(rule.to_owned()));
      }
      if !is_nonterminal_name(lhs) {
        return Err(GrammarError::InvalidLhs(rule.to_owned()));
      }

      let alts = rules.entry(lhs.to_owned()).or_default();
      for alt in rhs.split('|') {
        let symbols = parse_alternative(alt);
        if !alts.contains(&symbols) {
          alts.push(symbols);
        }
      }
    }

    let start = match rules.keys().next() {
      Some(start) => start.clone(),
      None => return Err(GrammarError::EmptyGrammar),
    };

    Ok(Grammar {
      start,
      rules,
    })
  }

  pub fn start(&self) -> &str {
    &self.start
  }

  pub fn rules(&self) -> impl Iterator<Item = (&str, &[Vec<String>])> {
    self.rules.iter().map(|(lhs, alts)| (lhs.as_str(), alts.as_slice()))
  }

  fn mentions(&self, sym: &str) -> bool {
    self.rules.iter().any(|(lhs, alts)| {
      lhs == sym || alts.iter().flatten().any(|s| s == sym)
    })
  }

  /// Adds `S' -> S` and extracts the terminal and non-terminal alphabets.
  pub fn augment(self) -> Augmented {
    let mut start = format!("{}'", self.start);
    while self.mentions(&start) {
      start.push('\'');
    }

    let mut prods = vec![Production {
      lhs: start.clone(),
      rhs: vec![self.start.clone()],
      alt: 0,
    }];
    for (lhs, alts) in self.rules {
      for (alt, rhs) in alts.into_iter().enumerate() {
        prods.push(Production {
          lhs: lhs.clone(),
          rhs,
          alt,
        });
      }
    }

    let mut rules: IndexMap<String, Vec<usize>> = IndexMap::new();
    for (ix, prod) in prods.iter().enumerate() {
      rules.entry(prod.lhs.clone()).or_default().push(ix);
    }

    let mut grammar = Augmented {
      start,
      user_start: self.start,
      prods,
      rules,
      terminals: IndexSet::new(),
      nonterms: IndexSet::new(),
    };
    grammar.extract_symbols();
    grammar
  }
}

/// `ε` stands for nothing wherever it is written.
fn parse_alternative(alt: &str) -> Vec<String> {
  alt.split_whitespace()
    .filter(|sym| *sym != EPSILON)
    .map(str::to_owned)
    .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Production {
  pub lhs: String,
  /// empty for ε
  pub rhs: Vec<String>,
  /// index among the alternatives of `lhs`
  pub alt: usize,
}

impl Display for Production {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    write!(f, "{} →", self.lhs)?;
    if self.rhs.is_empty() {
      return write!(f, " {}", EPSILON);
    }
    for sym in &self.rhs {
      write!(f, " {}", sym)?;
    }
    Ok(())
  }
}

/// Grammar extended with `S' -> S`. Production 0 is the augmented one.
#[derive(Debug, Clone)]
pub struct Augmented {
  start: String,
  user_start: String,
  prods: Vec<Production>,
  /// LHS -> indices into `prods`
  rules: IndexMap<String, Vec<usize>>,
  terminals: IndexSet<String>,
  nonterms: IndexSet<String>,
}

impl Augmented {
  fn extract_symbols(&mut self) {
    for prod in &self.prods {
      self.nonterms.insert(prod.lhs.clone());
    }
    for prod in &self.prods {
      for sym in &prod.rhs {
        if is_nonterminal_name(sym) {
          self.nonterms.insert(sym.clone());
        } else {
          self.terminals.insert(sym.clone());
        }
      }
    }
    self.terminals.shift_remove(END);
    self.terminals.insert(END.to_owned());
  }

  /// The augmented start symbol `S'`.
  pub fn start(&self) -> &str {
    &self.start
  }

  /// The start symbol as written in the grammar text.
  pub fn user_start(&self) -> &str {
    &self.user_start
  }

  pub fn prods(&self) -> &[Production] {
    &self.prods
  }

  pub fn prod(&self, ix: usize) -> &Production {
    &self.prods[ix]
  }

  /// Productions of `nonterm`, empty if it has no rule.
  pub fn prods_of(&self, nonterm: &str) -> &[usize] {
    self.rules.get(nonterm).map_or(&[], |prods| prods.as_slice())
  }

  pub fn terminals(&self) -> &IndexSet<String> {
    &self.terminals
  }

  pub fn nonterms(&self) -> &IndexSet<String> {
    &self.nonterms
  }

  pub fn is_terminal(&self, sym: &str) -> bool {
    self.terminals.contains(sym)
  }

  pub fn is_nonterm(&self, sym: &str) -> bool {
    self.nonterms.contains(sym)
  }

  /// Terminals followed by non-terminals, the order goto is tried in.
  pub fn symbols(&self) -> impl Iterator<Item = &str> {
    self.terminals.iter().chain(&self.nonterms).map(String::as_str)
  }

  /// Non-terminals referenced on a right-hand side that have no rule.
  pub fn undefined_nonterms(&self) -> Vec<&str> {
    self.nonterms.iter()
      .filter(|nt| !self.rules.contains_key(*nt))
      .map(String::as_str)
      .collect()
  }
}
