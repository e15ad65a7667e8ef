use std::cmp::Reverse;
use indexmap::IndexSet;
use crate::config::Tokenizer;
use crate::grammar::END;

/// Splits `input` into terminals and appends `$`.
///
/// Text that matches no terminal is passed through as-is, so the driver can
/// report it as an unexpected token.
pub(super) fn tokenize(
  input: &str,
  terminals: &IndexSet<String>,
  tokenizer: Tokenizer,
) -> Vec<String> {
  // longest first; ties keep grammar order
  let mut terminals = terminals.iter()
    .filter(|t| *t != END)
    .map(String::as_str)
    .collect::<Vec<_>>();
  terminals.sort_by_key(|t| Reverse(t.len()));

  let mut tokens = match tokenizer {
    Tokenizer::Substitution => substitute(input, &terminals),
    Tokenizer::MaximalMunch => maximal_munch(input, &terminals),
  };
  tokens.push(END.to_owned());
  tokens
}

fn substitute(input: &str, terminals: &[&str]) -> Vec<String> {
  let mut padded = input.to_owned();
  for terminal in terminals {
    padded = padded.replace(terminal, &format!(" {} ", terminal));
  }
  padded.split_whitespace().map(str::to_owned).collect()
}

fn maximal_munch(input: &str, terminals: &[&str]) -> Vec<String> {
  let mut tokens = vec![];
  let mut unknown: Option<usize> = None;
  let mut pos = 0;

  while let Some(ch) = input[pos..].chars().next() {
    let matched = if ch.is_whitespace() {
      None
    } else {
      terminals.iter().find(|t| input[pos..].starts_with(**t))
    };

    if ch.is_whitespace() || matched.is_some() {
      if let Some(start) = unknown.take() {
        tokens.push(input[start..pos].to_owned());
      }
    }

    match matched {
      Some(terminal) => {
        tokens.push((*terminal).to_owned());
        pos += terminal.len();
      }
      None => {
        if !ch.is_whitespace() && unknown.is_none() {
          unknown = Some(pos);
        }
        pos += ch.len_utf8();
      }
    }
  }

  if let Some(start) = unknown {
    tokens.push(input[start..].to_owned());
  }

  tokens
}
