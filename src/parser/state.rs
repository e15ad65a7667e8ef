use std::fmt::{self, Display, Formatter};
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use crate::grammar::Augmented;

/// An LR(0) item: a production with a dot before `rhs[dot]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Item {
  pub prod: usize,
  pub dot: usize,
}

impl Item {
  pub fn next_symbol<'g>(&self, grammar: &'g Augmented) -> Option<&'g str> {
    grammar.prod(self.prod).rhs.get(self.dot).map(String::as_str)
  }

  pub fn is_complete(&self, grammar: &Augmented) -> bool {
    self.dot >= grammar.prod(self.prod).rhs.len()
  }

  /// Symbols before the dot.
  pub fn consumed<'g>(&self, grammar: &'g Augmented) -> &'g [String] {
    &grammar.prod(self.prod).rhs[..self.dot]
  }

  /// Symbols after the dot.
  pub fn remaining<'g>(&self, grammar: &'g Augmented) -> &'g [String] {
    &grammar.prod(self.prod).rhs[self.dot..]
  }

  pub fn display<'g>(&self, grammar: &'g Augmented) -> ItemDisplay<'g> {
    ItemDisplay {
      item: *self,
      grammar,
    }
  }
}

pub struct ItemDisplay<'g> {
  item: Item,
  grammar: &'g Augmented,
}

impl Display for ItemDisplay<'_> {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    write!(f, "{} →", self.grammar.prod(self.item.prod).lhs)?;
    for sym in self.item.consumed(self.grammar) {
      write!(f, " {}", sym)?;
    }
    write!(f, " •")?;
    for sym in self.item.remaining(self.grammar) {
      write!(f, " {}", sym)?;
    }
    Ok(())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct State {
  /// closure order: kernel items first
  pub items: Vec<Item>,
  /// symbol -> index of target state
  pub transitions: IndexMap<String, usize>,
}

/// Order-independent identity of a state.
type StateKey = Vec<Item>;

fn state_key(items: &IndexSet<Item>) -> StateKey {
  let mut key = items.iter().copied().collect::<Vec<_>>();
  key.sort();
  key
}

/// The canonical LR(0) collection. `states[0]` is the closure of `S' -> • S`.
pub(super) struct Automaton {
  pub(super) states: Vec<State>,
}

pub(super) fn closure(
  grammar: &Augmented,
  kernel: impl IntoIterator<Item = Item>,
) -> IndexSet<Item> {
  let mut items = kernel.into_iter().collect::<IndexSet<_>>();

  let mut changed = true;
  while changed {
    changed = false;
    for ix in 0..items.len() {
      let item = match items.get_index(ix) {
        Some(&item) => item,
        None => break,
      };
      let next = match item.next_symbol(grammar) {
        Some(sym) if grammar.is_nonterm(sym) => sym,
        _ => continue,
      };
      for &prod in grammar.prods_of(next) {
        changed |= items.insert(Item { prod, dot: 0 });
      }
    }
  }

  items
}

/// Empty when no item in `items` expects `symbol`, which means no transition.
pub(super) fn goto(
  grammar: &Augmented,
  items: &[Item],
  symbol: &str,
) -> IndexSet<Item> {
  let kernel = items.iter()
    .filter(|item| item.next_symbol(grammar) == Some(symbol))
    .map(|item| Item { prod: item.prod, dot: item.dot + 1 })
    .collect::<Vec<_>>();

  if kernel.is_empty() {
    IndexSet::new()
  } else {
    closure(grammar, kernel)
  }
}

/// Breadth-first discovery of states; indices follow discovery order.
pub(super) fn gen_states(
  grammar: &Augmented,
) -> Automaton {
  let start = closure(grammar, [Item { prod: 0, dot: 0 }]);

  let mut keys = IndexSet::new();
  keys.insert(state_key(&start));
  let mut states = vec![State {
    items: start.into_iter().collect(),
    transitions: IndexMap::new(),
  }];

  let mut ix = 0;
  while ix < states.len() {
    let mut transitions = IndexMap::new();
    for symbol in grammar.symbols() {
      let next = goto(grammar, &states[ix].items, symbol);
      if next.is_empty() {
        continue;
      }

      let (target, fresh) = keys.insert_full(state_key(&next));
      if fresh {
        states.push(State {
          items: next.into_iter().collect(),
          transitions: IndexMap::new(),
        });
      }
      transitions.insert(symbol.to_owned(), target);
    }
    states[ix].transitions = transitions;
    ix += 1;
  }

  log::debug!("LR(0) automaton has {} states", states.len());

  Automaton {
    states,
  }
}
