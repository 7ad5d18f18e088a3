//! Table-driven shift/reduce parser.
//!
//! The driver never fails with an error: any missing ACTION or GOTO entry,
//! or a token that names no grammar terminal, rejects the input with
//! `false`. The end-of-input sentinel is supplied internally.

use crate::grammar::TerminalID;
use crate::lalr::{Action, LalrTable};
use crate::tokenizer::Token;

/// An LALR(1) parser driving a generated table.
#[derive(Debug)]
pub struct Parser {
    table: LalrTable,
}

impl Parser {
    pub fn new(table: LalrTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &LalrTable {
        &self.table
    }

    /// Parse a token stream; token kinds are resolved against the grammar's
    /// terminal names.
    pub fn parse(&self, tokens: &[Token]) -> bool {
        let grammar = self.table.grammar();
        let mut input = Vec::with_capacity(tokens.len());
        for token in tokens {
            match grammar.terminal_by_name(&token.kind) {
                Some(id) => input.push(id),
                None => return false,
            }
        }
        self.parse_terminals(&input)
    }

    /// Drive the machine over terminal ids directly.
    pub fn parse_terminals(&self, input: &[TerminalID]) -> bool {
        let mut stack = vec![self.table.start_state()];
        let mut ip = 0;

        loop {
            let state = *stack.last().expect("state stack is never empty");
            let lookahead = input.get(ip).copied().unwrap_or(TerminalID::EOI);

            match self.table.action(state, lookahead) {
                None => return false,
                Some(Action::Shift(next)) => {
                    stack.push(next);
                    ip += 1;
                }
                Some(Action::Reduce(production)) => {
                    let production = self.table.grammar().production(production);
                    // pops nothing for a nullable production
                    stack.truncate(stack.len() - production.right.len());
                    let top = *stack.last().expect("state stack is never empty");
                    match self.table.goto(top, production.left) {
                        Some(next) => stack.push(next),
                        None => return false,
                    }
                }
                Some(Action::Accept) => return true,
            }
        }
    }
}
