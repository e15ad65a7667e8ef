use std::collections::BTreeSet;
use indexmap::IndexMap;
use crate::grammar::{Augmented, END, EPSILON};

pub type SymbolSet = BTreeSet<String>;

/// Non-terminal -> set of symbols.
pub type SetMap = IndexMap<String, SymbolSet>;

pub(super) fn gen_nullable(
  grammar: &Augmented,
) -> IndexMap<String, bool> {
  let mut nullable = grammar.nonterms().iter()
    .map(|nt| (nt.clone(), false))
    .collect::<IndexMap<_, _>>();

  loop {
    let mut changed = false;
    for prod in grammar.prods() {
      if prod.rhs.iter().all(|sym| is_nullable(&nullable, sym)) {
        if let Some(flag) = nullable.get_mut(&prod.lhs) {
          changed |= !*flag;
          *flag = true;
        }
      }
    }
    if !changed {
      break;
    }
  }

  nullable
}

fn is_nullable(nullable: &IndexMap<String, bool>, sym: &str) -> bool {
  nullable.get(sym).copied().unwrap_or(false)
}

/// FIRST sets of every non-terminal; nullable ones contain `ε`.
///
/// Computed as a monotone fixpoint, so mutually recursive non-terminals
/// (`A -> B ; B -> A`) terminate like any other grammar.
pub(super) fn gen_first(
  grammar: &Augmented,
  nullable: &IndexMap<String, bool>,
) -> SetMap {
  let mut first = grammar.nonterms().iter()
    .map(|nt| {
      let mut set = SymbolSet::new();
      if is_nullable(nullable, nt) {
        set.insert(EPSILON.to_owned());
      }
      (nt.clone(), set)
    })
    .collect::<SetMap>();

  let mut passes = 0;
  loop {
    passes += 1;
    let mut changed = false;
    for prod in grammar.prods() {
      let mut buf = SymbolSet::new();
      compute_first_for_symbols(&mut buf, grammar, &first, &prod.rhs);
      buf.remove(EPSILON);
      if let Some(set) = first.get_mut(&prod.lhs) {
        for sym in buf {
          changed |= set.insert(sym);
        }
      }
    }
    if !changed {
      break;
    }
  }
  log::debug!("FIRST sets settled after {} passes", passes);

  first
}

/// Adds FIRST of `symbols` to `result`, including `ε` if every symbol is
/// nullable. Nullable non-terminals must already carry `ε` in `first`.
pub(super) fn compute_first_for_symbols(
  result: &mut SymbolSet,
  grammar: &Augmented,
  first: &SetMap,
  symbols: &[String],
) {
  for sym in symbols {
    if !grammar.is_nonterm(sym) {
      result.insert(sym.clone());
      return;
    }
    let set = match first.get(sym) {
      Some(set) => set,
      None => return,
    };
    result.extend(set.iter().filter(|s| *s != EPSILON).cloned());
    if !set.contains(EPSILON) {
      return;
    }
  }

  result.insert(EPSILON.to_owned());
}

pub(super) fn gen_follow(
  grammar: &Augmented,
  first: &SetMap,
) -> SetMap {
  let mut follow = grammar.nonterms().iter()
    .map(|nt| (nt.clone(), SymbolSet::new()))
    .collect::<SetMap>();
  if let Some(set) = follow.get_mut(grammar.start()) {
    set.insert(END.to_owned());
  }

  let empty = SymbolSet::new();
  let mut passes = 0;
  loop {
    passes += 1;
    let mut changed = false;
    for prod in grammar.prods() {
      let mut trailer = follow.get(&prod.lhs).cloned().unwrap_or_default();
      for sym in prod.rhs.iter().rev() {
        if grammar.is_nonterm(sym) {
          if let Some(set) = follow.get_mut(sym) {
            for t in &trailer {
              changed |= set.insert(t.clone());
            }
          }
          let sym_first = first.get(sym).unwrap_or(&empty);
          if sym_first.contains(EPSILON) {
            trailer.extend(sym_first.iter().filter(|s| *s != EPSILON).cloned());
          } else {
            trailer = sym_first.clone();
          }
        } else {
          trailer = SymbolSet::new();
          trailer.insert(sym.clone());
        }
      }
    }
    if !changed {
      break;
    }
  }
  log::debug!("FOLLOW sets settled after {} passes", passes);

  follow
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::grammar::Grammar;
  use pretty_assertions::assert_eq;

  fn augmented(text: &str) -> Augmented {
    Grammar::parse(text).unwrap().augment()
  }

  fn set(symbols: &[&str]) -> SymbolSet {
    symbols.iter().map(|&s| s.to_owned()).collect()
  }

  fn simple() -> Augmented {
    augmented("Z -> d | X Y Z ; Y -> | c ; X -> Y | a")
  }

  #[test]
  fn simple_nullable() {
    let nullable = gen_nullable(&simple());
    let flags = nullable.values().copied().collect::<Vec<_>>();
    // Z', Z, Y, X in order of appearance
    assert_eq!(flags, vec![false, false, true, true]);
  }

  #[test]
  fn simple_first() {
    let grammar = simple();
    let first = gen_first(&grammar, &gen_nullable(&grammar));

    assert_eq!(first["Z"], set(&["a", "c", "d"]));
    assert_eq!(first["Y"], set(&["c", "ε"]));
    assert_eq!(first["X"], set(&["a", "c", "ε"]));
  }

  #[test]
  fn expr_first_and_follow() {
    let grammar = augmented("E -> E + T | T ; T -> T * F | F ; F -> ( E ) | id");
    let first = gen_first(&grammar, &gen_nullable(&grammar));
    let follow = gen_follow(&grammar, &first);

    for nt in &["E'", "E", "T", "F"] {
      assert_eq!(first[*nt], set(&["(", "id"]));
    }
    assert_eq!(follow["E'"], set(&["$"]));
    assert_eq!(follow["E"], set(&["$", ")", "+"]));
    assert_eq!(follow["T"], set(&["$", ")", "*", "+"]));
    assert_eq!(follow["F"], set(&["$", ")", "*", "+"]));
  }

  #[test]
  fn left_recursive_nullable() {
    let grammar = augmented("S -> S a | ");
    let first = gen_first(&grammar, &gen_nullable(&grammar));
    let follow = gen_follow(&grammar, &first);

    assert_eq!(first["S"], set(&["a", "ε"]));
    assert_eq!(follow["S"], set(&["$", "a"]));
  }

  #[test]
  fn mutual_recursion_terminates() {
    let grammar = augmented("A -> B | a ; B -> A | b");
    let first = gen_first(&grammar, &gen_nullable(&grammar));

    assert_eq!(first["A"], set(&["a", "b"]));
    assert_eq!(first["B"], set(&["a", "b"]));
  }

  #[test]
  fn nullable_trailer() {
    let grammar = augmented("S -> A B c ; A -> a ; B -> b | ");
    let first = gen_first(&grammar, &gen_nullable(&grammar));
    let follow = gen_follow(&grammar, &first);

    assert_eq!(follow["A"], set(&["b", "c"]));
    assert_eq!(follow["B"], set(&["c"]));
    assert_eq!(follow["S"], set(&["$"]));
  }

  #[test]
  fn undefined_nonterm_has_empty_sets() {
    let grammar = augmented("S -> X a | b");
    let first = gen_first(&grammar, &gen_nullable(&grammar));
    let follow = gen_follow(&grammar, &first);

    assert_eq!(first["X"], set(&[]));
    assert_eq!(first["S"], set(&["b"]));
    assert_eq!(follow["X"], set(&["a"]));
  }
}
