//! A construction toolkit for compiler front ends: regular expressions are
//! compiled through Thompson's construction, subset construction and
//! table-filling minimization into DFAs driven by a longest-match tokenizer;
//! grammars are analyzed (FIRST/FOLLOW), expanded into the canonical LR(1)
//! collection, merged into an LALR(1) table and executed by a shift/reduce
//! driver.
//!
//! ```
//! use lexalr::dfa::Dfa;
//! use lexalr::grammar::{Grammar, SymbolID::*};
//! use lexalr::lalr::LalrTable;
//! use lexalr::parser::Parser;
//! use lexalr::tokenizer::Tokenizer;
//!
//! let grammar = Grammar::define(|g| {
//!     let a = g.terminal("a")?;
//!     let s = g.nonterminal("S")?;
//!     g.start_symbol(s);
//!     g.production(s, [T(a), N(s)])?;
//!     g.production(s, [T(a)])?;
//!     Ok(())
//! })
//! .unwrap();
//!
//! let mut tokenizer = Tokenizer::new();
//! tokenizer.rule("a", Dfa::compile("a").unwrap());
//! let tokens = tokenizer.tokenize("a a a").unwrap();
//!
//! let table = LalrTable::generate(grammar);
//! assert!(table.conflicts().is_empty());
//! assert!(Parser::new(table).parse(&tokens));
//! ```

pub mod dfa;
pub mod first_sets;
pub mod grammar;
pub mod lalr;
pub mod lr1;
pub mod minimize;
pub mod nfa;
pub mod parser;
pub mod regex;
pub mod tokenizer;

mod display;
mod types;
