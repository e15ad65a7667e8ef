use indexmap::IndexMap;
use crate::config::Config;
use crate::grammar::{Augmented, Grammar, GrammarError};

mod driver;
mod lexer;
mod sets;
mod state;
mod table;

pub use driver::{ParseError, ParseRun, StackEntry, TraceAction, TraceRecord};
pub use sets::{SetMap, SymbolSet};
pub use state::{Item, ItemDisplay, State};
pub use table::{Action, ActionDisplay, Conflict, Table};

/// An SLR(1) parser built from a grammar.
///
/// Construction runs every stage once: augmentation, FIRST/FOLLOW, the LR(0)
/// automaton, and the table. The result is immutable and can parse any
/// number of inputs.
pub struct Parser {
  config: Config,
  grammar: Augmented,
  first: SetMap,
  follow: SetMap,
  states: Vec<State>,
  table: Table,
}

impl Parser {
  pub fn new(grammar: Grammar, config: Config) -> Result<Self, GrammarError> {
    let grammar = grammar.augment();

    for nonterm in grammar.undefined_nonterms() {
      if config.strict_symbols {
        return Err(GrammarError::UndefinedNonterminal(nonterm.to_owned()));
      }
      log::warn!("non-terminal {} has no rule; it derives nothing", nonterm);
    }
    log::debug!(
      "grammar has {} productions, {} terminals, {} non-terminals",
      grammar.prods().len(),
      grammar.terminals().len(),
      grammar.nonterms().len());

    let nullable = sets::gen_nullable(&grammar);
    let first = sets::gen_first(&grammar, &nullable);
    let follow = sets::gen_follow(&grammar, &first);
    let automaton = state::gen_states(&grammar);
    let table = table::gen_table(&grammar, &automaton, &follow);

    Ok(Parser {
      config,
      grammar,
      first,
      follow,
      states: automaton.states,
      table,
    })
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  pub fn grammar(&self) -> &Augmented {
    &self.grammar
  }

  /// FIRST set of every non-terminal, `ε` marking nullable ones.
  pub fn first(&self) -> &SetMap {
    &self.first
  }

  pub fn follow(&self) -> &SetMap {
    &self.follow
  }

  /// States in discovery order; state 0 is the start state.
  pub fn states(&self) -> &[State] {
    &self.states
  }

  pub fn transitions(&self, state: usize) -> Option<&IndexMap<String, usize>> {
    self.states.get(state).map(|state| &state.transitions)
  }

  /// Items of `state` rendered as `A → α • β`.
  pub fn state_items(&self, state: usize) -> Vec<String> {
    self.states.get(state)
      .map(|state| state.items.iter()
        .map(|item| item.display(&self.grammar).to_string())
        .collect())
      .unwrap_or_default()
  }

  pub fn table(&self) -> &Table {
    &self.table
  }

  pub fn action(&self, state: usize, terminal: &str) -> Option<Action> {
    self.table.action(state, terminal)
  }

  pub fn goto(&self, state: usize, nonterm: &str) -> Option<usize> {
    self.table.goto(state, nonterm)
  }

  /// Cells where more than one action applied; see [`Conflict`].
  pub fn conflicts(&self) -> &[Conflict] {
    &self.table.conflicts
  }

  pub fn tokenize(&self, input: &str) -> Vec<String> {
    lexer::tokenize(input, self.grammar.terminals(), self.config.tokenizer)
  }

  pub fn parse(&self, input: &str) -> ParseRun {
    let tokens = self.tokenize(input);
    log::debug!("parsing {} tokens", tokens.len());
    driver::run(&self.grammar, &self.table, tokens)
  }
}
