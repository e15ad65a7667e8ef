use std::fmt::{self, Display, Formatter};
use indexmap::IndexMap;
use indexmap::map::Entry;
use serde::Serialize;
use crate::grammar::{Augmented, END};
use super::sets::SetMap;
use super::state::Automaton;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Action {
  Shift(usize),
  /// index of the production
  Reduce(usize),
  Accept,
}

impl Action {
  pub fn display<'g>(&self, grammar: &'g Augmented) -> ActionDisplay<'g> {
    ActionDisplay {
      action: *self,
      grammar,
    }
  }
}

pub struct ActionDisplay<'g> {
  action: Action,
  grammar: &'g Augmented,
}

impl Display for ActionDisplay<'_> {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    match self.action {
      Action::Shift(state) => write!(f, "s{}", state),
      Action::Reduce(prod) => write!(f, "r({})", self.grammar.prod(prod)),
      Action::Accept => write!(f, "acc"),
    }
  }
}

/// A table cell claimed by more than one action. The first writer keeps it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
  pub state: usize,
  pub terminal: String,
  pub kept: Action,
  pub dropped: Action,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
  /// state -> terminal -> action
  pub action: Vec<IndexMap<String, Action>>,
  /// state -> non-terminal -> state
  pub goto: Vec<IndexMap<String, usize>>,
  pub conflicts: Vec<Conflict>,
}

impl Table {
  pub fn action(&self, state: usize, terminal: &str) -> Option<Action> {
    self.action.get(state)?.get(terminal).copied()
  }

  pub fn goto(&self, state: usize, nonterm: &str) -> Option<usize> {
    self.goto.get(state)?.get(nonterm).copied()
  }
}

/// Shifts and gotos come straight from the transitions, then completed
/// items add reduces on FOLLOW of their LHS wherever the cell is still free.
/// The accept action always takes `$` in the state holding `S' -> S •`.
pub(super) fn gen_table(
  grammar: &Augmented,
  automaton: &Automaton,
  follow: &SetMap,
) -> Table {
  let mut table = Table {
    action: Vec::with_capacity(automaton.states.len()),
    goto: Vec::with_capacity(automaton.states.len()),
    conflicts: vec![],
  };

  for (ix, state) in automaton.states.iter().enumerate() {
    let mut action = IndexMap::new();
    let mut goto = IndexMap::new();

    for (symbol, &target) in &state.transitions {
      if grammar.is_terminal(symbol) {
        action.insert(symbol.clone(), Action::Shift(target));
      } else {
        goto.insert(symbol.clone(), target);
      }
    }

    for item in &state.items {
      if !item.is_complete(grammar) {
        continue;
      }

      let lhs = &grammar.prod(item.prod).lhs;
      if lhs == grammar.start() {
        if let Some(prev) = action.insert(END.to_owned(), Action::Accept) {
          table.conflicts.push(Conflict {
            state: ix,
            terminal: END.to_owned(),
            kept: Action::Accept,
            dropped: prev,
          });
        }
        continue;
      }

      let lookaheads = match follow.get(lhs) {
        Some(set) => set,
        None => continue,
      };
      for terminal in lookaheads {
        match action.entry(terminal.clone()) {
          Entry::Occupied(entry) => {
            table.conflicts.push(Conflict {
              state: ix,
              terminal: terminal.clone(),
              kept: *entry.get(),
              dropped: Action::Reduce(item.prod),
            });
          }
          Entry::Vacant(entry) => {
            entry.insert(Action::Reduce(item.prod));
          }
        }
      }
    }

    table.action.push(action);
    table.goto.push(goto);
  }

  for conflict in &table.conflicts {
    log::debug!(
      "conflict in state {} on {}: kept {}, dropped {}",
      conflict.state,
      conflict.terminal,
      conflict.kept.display(grammar),
      conflict.dropped.display(grammar));
  }

  table
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::grammar::Grammar;
  use crate::parser::{sets, state};
  use insta::assert_snapshot;
  use pretty_assertions::assert_eq;

  fn table(text: &str) -> (Augmented, Table) {
    let grammar = Grammar::parse(text).unwrap().augment();
    let first = sets::gen_first(&grammar, &sets::gen_nullable(&grammar));
    let follow = sets::gen_follow(&grammar, &first);
    let automaton = state::gen_states(&grammar);
    let table = gen_table(&grammar, &automaton, &follow);
    (grammar, table)
  }

  fn render(grammar: &Augmented, table: &Table) -> String {
    table.action.iter()
      .zip(&table.goto)
      .enumerate()
      .map(|(ix, (action, goto))| {
        let mut row = format!("I{}:", ix);
        for (terminal, action) in action {
          row.push_str(&format!(" {}={}", terminal, action.display(grammar)));
        }
        if !goto.is_empty() {
          row.push_str(" ;");
          for (nonterm, target) in goto {
            row.push_str(&format!(" {}={}", nonterm, target));
          }
        }
        row
      })
      .collect::<Vec<_>>()
      .join("\n")
  }

  #[test]
  fn epsilon_table() {
    let (grammar, table) = table("S -> A ; A -> a A | ");

    assert!(table.conflicts.is_empty());
    assert_snapshot!(render(&grammar, &table), @r###"
    I0: a=s1 $=r(A → ε) ; S=2 A=3
    I1: a=s1 $=r(A → ε) ; A=4
    I2: $=acc
    I3: $=r(S → A)
    I4: $=r(A → a A)
    "###);
  }

  #[test]
  fn expr_table() {
    let (grammar, table) = table("E -> E + T | T ; T -> T * F | F ; F -> ( E ) | id");

    assert!(table.conflicts.is_empty());
    assert_eq!(table.action(3, "$"), Some(Action::Accept));
    assert_eq!(table.action(3, "+"), Some(Action::Shift(7)));
    assert_eq!(table.action(4, "*"), Some(Action::Shift(8)));
    assert_eq!(table.action(4, "+"), Some(Action::Reduce(2)));
    assert_eq!(table.action(2, ")"), Some(Action::Reduce(6)));
    assert_eq!(table.action(0, "+"), None);
    assert_eq!(table.goto(0, "E"), Some(3));
    assert_eq!(table.goto(8, "F"), Some(11));
    assert_eq!(table.goto(2, "E"), None);
    assert_eq!(
      Action::Reduce(1).display(&grammar).to_string(),
      "r(E → E + T)");
  }

  #[test]
  fn accept_only_in_final_state() {
    let (grammar, table) = table("E -> E + T | T ; T -> T * F | F ; F -> ( E ) | id");
    let automaton = state::gen_states(&grammar);

    for (ix, row) in table.action.iter().enumerate() {
      let accepts = row.values().any(|action| *action == Action::Accept);
      let holds_final = automaton.states[ix].items.iter()
        .any(|item| item.prod == 0 && item.is_complete(&grammar));
      assert_eq!(accepts, holds_final);
    }
  }

  #[test]
  fn shift_reduce_keeps_shift() {
    let (_, table) = table("E -> E + E | id");

    assert_eq!(table.conflicts, vec![Conflict {
      state: 4,
      terminal: "+".to_owned(),
      kept: Action::Shift(3),
      dropped: Action::Reduce(1),
    }]);
    assert_eq!(table.action(4, "+"), Some(Action::Shift(3)));
    assert_eq!(table.action(4, "$"), Some(Action::Reduce(1)));
  }

  #[test]
  fn reduce_reduce_keeps_first_item() {
    let (_, table) = table("S -> A | B ; A -> x ; B -> x");

    assert_eq!(table.conflicts, vec![Conflict {
      state: 1,
      terminal: "$".to_owned(),
      kept: Action::Reduce(3),
      dropped: Action::Reduce(4),
    }]);
  }
}
