use std::fmt::{self, Display, Formatter};
use serde::Serialize;
use thiserror::Error;
use crate::grammar::{Augmented, END};
use super::table::{Action, Table};

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum ParseError {
  #[error("no action defined for token '{token}' in state {state}")]
  NoAction {
    token: String,
    state: usize,
  },
  #[error("no goto defined for {nonterm} from state {state}")]
  NoGoto {
    nonterm: String,
    state: usize,
  },
  #[error("end-of-input marker '$' at token {position} with input remaining")]
  EarlyEnd {
    position: usize,
  },
}

/// The parse stack alternates states and symbols, with state 0 at the bottom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StackEntry {
  State(usize),
  Symbol(String),
}

impl Display for StackEntry {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    match self {
      StackEntry::State(state) => write!(f, "{}", state),
      StackEntry::Symbol(sym) => write!(f, "{}", sym),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TraceAction {
  Initialize,
  Shift(String),
  Reduce {
    lhs: String,
    rhs: Vec<String>,
  },
  Accept,
  Error,
}

impl Display for TraceAction {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    match self {
      TraceAction::Initialize => write!(f, "Initialize"),
      TraceAction::Shift(token) => write!(f, "Shift {}", token),
      TraceAction::Reduce { lhs, rhs } => {
        write!(f, "Reduce by {} →", lhs)?;
        if rhs.is_empty() {
          write!(f, " ε")
        } else {
          write!(f, " {}", rhs.join(" "))
        }
      }
      TraceAction::Accept => write!(f, "Accept"),
      TraceAction::Error => write!(f, "ERROR"),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceRecord {
  pub step: usize,
  pub action: TraceAction,
  /// stack after the step
  pub stack: Vec<StackEntry>,
  /// unread tokens, ending with `$`
  pub input: Vec<String>,
  pub detail: String,
}

impl TraceRecord {
  pub fn stack_string(&self) -> String {
    let entries = self.stack.iter()
      .map(ToString::to_string)
      .collect::<Vec<_>>();
    format!("[{}]", entries.join(", "))
  }

  pub fn input_string(&self) -> String {
    self.input.join(" ")
  }
}

/// Outcome of one run. The tables that produced it stay usable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseRun {
  pub tokens: Vec<String>,
  pub trace: Vec<TraceRecord>,
  pub verdict: Result<(), ParseError>,
}

impl ParseRun {
  pub fn is_accepted(&self) -> bool {
    self.verdict.is_ok()
  }

  pub fn message(&self) -> String {
    match &self.verdict {
      Ok(()) => "Input accepted".to_owned(),
      Err(err) => err.to_string(),
    }
  }
}

struct Driver<'a> {
  grammar: &'a Augmented,
  table: &'a Table,
  tokens: &'a [String],
  cursor: usize,
  stack: Vec<StackEntry>,
  trace: Vec<TraceRecord>,
}

pub(super) fn run(
  grammar: &Augmented,
  table: &Table,
  tokens: Vec<String>,
) -> ParseRun {
  let mut driver = Driver {
    grammar,
    table,
    tokens: &tokens,
    cursor: 0,
    stack: vec![StackEntry::State(0)],
    trace: vec![],
  };
  driver.record(TraceAction::Initialize, "Start parsing".to_owned());
  let verdict = driver.drive();
  let trace = driver.trace;

  ParseRun {
    tokens,
    trace,
    verdict,
  }
}

impl Driver<'_> {
  fn drive(&mut self) -> Result<(), ParseError> {
    let grammar = self.grammar;
    loop {
      let state = self.top_state();
      let token = self.tokens.get(self.cursor)
        .map_or(END, String::as_str)
        .to_owned();

      // `$` from the input text is only the end marker in last position
      if token == END && self.cursor + 1 < self.tokens.len() {
        return Err(self.fail(ParseError::EarlyEnd {
          position: self.cursor,
        }));
      }

      let action = match self.table.action(state, &token) {
        Some(action) => action,
        None => {
          return Err(self.fail(ParseError::NoAction {
            token,
            state,
          }));
        }
      };

      match action {
        Action::Shift(target) => {
          log::trace!("Shift {} -> {}", token, target);
          self.stack.push(StackEntry::Symbol(token.clone()));
          self.stack.push(StackEntry::State(target));
          self.cursor += 1;
          self.record(
            TraceAction::Shift(token),
            format!("Move to state {}", target));
        }

        Action::Reduce(prod_ix) => {
          let prod = grammar.prod(prod_ix);
          log::trace!("Reduce {}", prod);
          let len = prod.rhs.len();
          let height = self.stack.len().saturating_sub(2 * len).max(1);
          self.stack.truncate(height);

          let exposed = self.top_state();
          let target = match self.table.goto(exposed, &prod.lhs) {
            Some(target) => target,
            None => {
              return Err(self.fail(ParseError::NoGoto {
                nonterm: prod.lhs.clone(),
                state: exposed,
              }));
            }
          };
          self.stack.push(StackEntry::Symbol(prod.lhs.clone()));
          self.stack.push(StackEntry::State(target));
          self.record(
            TraceAction::Reduce {
              lhs: prod.lhs.clone(),
              rhs: prod.rhs.clone(),
            },
            format!("Pop {} symbols, push {}, goto state {}", len, prod.lhs, target));
        }

        Action::Accept => {
          log::trace!("Accept");
          self.record(
            TraceAction::Accept,
            "Input string is valid according to the grammar".to_owned());
          return Ok(());
        }
      }
    }
  }

  fn top_state(&self) -> usize {
    match self.stack.last() {
      Some(StackEntry::State(state)) => *state,
      _ => 0,
    }
  }

  fn fail(&mut self, err: ParseError) -> ParseError {
    log::trace!("Error: {}", err);
    self.record(TraceAction::Error, err.to_string());
    err
  }

  fn record(&mut self, action: TraceAction, detail: String) {
    let input = self.tokens.get(self.cursor..).unwrap_or_default().to_vec();
    self.trace.push(TraceRecord {
      step: self.trace.len(),
      action,
      stack: self.stack.clone(),
      input,
      detail,
    });
  }
}
