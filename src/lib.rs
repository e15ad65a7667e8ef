pub mod config;
pub mod grammar;
pub mod parser;

pub use config::{Config, Tokenizer};
pub use grammar::{Grammar, GrammarError};
pub use parser::Parser;

pub fn build(text: &str) -> Result<Parser, GrammarError> {
  build_with_config(text, &Config::default())
}

pub fn build_with_config(text: &str, config: &Config) -> Result<Parser, GrammarError> {
  Parser::new(Grammar::parse(text)?, config.clone())
}
