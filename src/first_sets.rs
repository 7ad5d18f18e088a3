//! FIRST and FOLLOW set computation.
//!
//! Both are monotone fixed points over finite terminal sets, so the
//! iterations terminate. FIRST sets contain terminals only; the nullable
//! information lives in `Grammar::is_nullable`, and "ε ∈ FIRST(β)" is
//! expressed as "every symbol of β is a nullable nonterminal".

use crate::grammar::{Grammar, NonterminalID, SymbolID, TerminalID, TerminalSet};
use crate::types::Map;

#[derive(Debug)]
pub struct FirstSets {
    nullables: Vec<NonterminalID>,
    map: Map<SymbolID, TerminalSet>,
}

impl FirstSets {
    pub fn new(grammar: &Grammar) -> Self {
        let mut map: Map<SymbolID, TerminalSet> = Map::default();

        // First(t) = {t} for terminals, First(A) starts empty
        for (id, _) in grammar.terminals() {
            map.insert(SymbolID::T(id), Some(id).into_iter().collect());
        }
        for (id, _) in grammar.nonterminals() {
            map.insert(SymbolID::N(id), TerminalSet::default());
        }

        // For every production X -> Y1 Y2 ... Yn, First(X) must contain
        // First(Yi) for each Yi in the nullable prefix Y1..Yk (Yk being the
        // first non-nullable symbol). Collect those constraints once, then
        // propagate until nothing changes.
        struct Constraint {
            sup: SymbolID,
            sub: SymbolID,
        }
        let mut constraints = Vec::new();
        for (_, p) in grammar.productions() {
            for symbol in &p.right {
                if *symbol != SymbolID::N(p.left) {
                    constraints.push(Constraint {
                        sup: SymbolID::N(p.left),
                        sub: *symbol,
                    });
                }
                if !matches!(symbol, SymbolID::N(n) if grammar.is_nullable(*n)) {
                    break;
                }
            }
        }

        let mut changed = true;
        while changed {
            changed = false;
            for Constraint { sup, sub } in &constraints {
                let subset = map[sub].clone();
                let superset = &mut map[sup];
                let before = superset.len();
                superset.union_with(&subset);
                changed |= superset.len() != before;
            }
        }

        Self {
            nullables: grammar.nullables().collect(),
            map,
        }
    }

    /// `First(x)` for a single symbol.
    pub fn first(&self, symbol: SymbolID) -> &TerminalSet {
        &self.map[&symbol]
    }

    /// `First(prefix a1 .. ak)`: the terminals that can begin a sentence
    /// derived from `prefix` followed by any of the `lookaheads`.
    pub fn first_of<L>(&self, prefix: &[SymbolID], lookaheads: L) -> TerminalSet
    where
        L: IntoIterator<Item = TerminalID>,
    {
        let mut result = TerminalSet::default();

        let mut nullable_prefix = true;
        for symbol in prefix {
            result.union_with(&self.map[symbol]);
            if !matches!(symbol, SymbolID::N(n) if self.nullables.contains(n)) {
                nullable_prefix = false;
                break;
            }
        }

        if nullable_prefix {
            for t in lookaheads {
                result.insert(t);
            }
        }

        result
    }
}

#[derive(Debug)]
pub struct FollowSets {
    map: Map<NonterminalID, TerminalSet>,
}

impl FollowSets {
    /// `Follow(A)` for every nonterminal, seeded with `$` on the start
    /// symbol.
    pub fn new(grammar: &Grammar, first: &FirstSets) -> Self {
        let mut map: Map<NonterminalID, TerminalSet> = Map::default();
        for (id, _) in grammar.nonterminals() {
            map.insert(id, TerminalSet::default());
        }
        map[&grammar.start_symbol()].insert(TerminalID::EOI);

        let mut changed = true;
        while changed {
            changed = false;
            for (_, p) in grammar.productions() {
                for (i, symbol) in p.right.iter().enumerate() {
                    let SymbolID::N(nt) = symbol else { continue };
                    let beta = &p.right[i + 1..];

                    let first_beta = first.first_of(beta, None);
                    let follow = &mut map[nt];
                    let before = follow.len();
                    follow.union_with(&first_beta);
                    changed |= follow.len() != before;

                    let beta_nullable = beta
                        .iter()
                        .all(|s| matches!(s, SymbolID::N(n) if grammar.is_nullable(*n)));
                    if beta_nullable {
                        let follow_left = map[&p.left].clone();
                        let follow = &mut map[nt];
                        let before = follow.len();
                        follow.union_with(&follow_left);
                        changed |= follow.len() != before;
                    }
                }
            }
        }

        Self { map }
    }

    pub fn follow(&self, id: NonterminalID) -> &TerminalSet {
        &self.map[&id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::SymbolID::*;

    /// E -> E + T | T ; T -> T * F | F ; F -> ( E ) | id
    fn expression_grammar() -> Grammar {
        Grammar::define(|g| {
            let plus = g.terminal("+")?;
            let star = g.terminal("*")?;
            let lparen = g.terminal("(")?;
            let rparen = g.terminal(")")?;
            let id = g.terminal("id")?;

            let e = g.nonterminal("E")?;
            let t = g.nonterminal("T")?;
            let f = g.nonterminal("F")?;

            g.start_symbol(e);

            g.production(e, [N(e), T(plus), N(t)])?;
            g.production(e, [N(t)])?;
            g.production(t, [N(t), T(star), N(f)])?;
            g.production(t, [N(f)])?;
            g.production(f, [T(lparen), N(e), T(rparen)])?;
            g.production(f, [T(id)])?;
            Ok(())
        })
        .unwrap()
    }

    fn names(grammar: &Grammar, set: &TerminalSet) -> Vec<String> {
        let mut names: Vec<String> = set
            .iter()
            .map(|t| grammar.terminal_name(t).to_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn first_sets_of_expression_grammar() {
        let grammar = expression_grammar();
        let first = FirstSets::new(&grammar);

        for nt in ["E", "T", "F"] {
            let id = grammar.nonterminal_by_name(nt).unwrap();
            assert_eq!(names(&grammar, first.first(N(id))), ["(", "id"], "FIRST({nt})");
        }
    }

    #[test]
    fn follow_sets_of_expression_grammar() {
        let grammar = expression_grammar();
        let first = FirstSets::new(&grammar);
        let follow = FollowSets::new(&grammar, &first);

        let e = grammar.nonterminal_by_name("E").unwrap();
        let t = grammar.nonterminal_by_name("T").unwrap();
        let f = grammar.nonterminal_by_name("F").unwrap();

        assert_eq!(names(&grammar, follow.follow(e)), ["$", ")", "+"]);
        assert_eq!(names(&grammar, follow.follow(t)), ["$", ")", "*", "+"]);
        assert_eq!(names(&grammar, follow.follow(f)), ["$", ")", "*", "+"]);
    }

    #[test]
    fn first_through_nullable_prefix() {
        // S -> X Y a ; X -> b | ε ; Y -> c | ε
        let grammar = Grammar::define(|g| {
            let a = g.terminal("a")?;
            let b = g.terminal("b")?;
            let c = g.terminal("c")?;
            let s = g.nonterminal("S")?;
            let x = g.nonterminal("X")?;
            let y = g.nonterminal("Y")?;
            g.start_symbol(s);
            g.production(s, [N(x), N(y), T(a)])?;
            g.production(x, [T(b)])?;
            g.production(x, [])?;
            g.production(y, [T(c)])?;
            g.production(y, [])?;
            Ok(())
        })
        .unwrap();

        let first = FirstSets::new(&grammar);
        let s = grammar.nonterminal_by_name("S").unwrap();
        assert_eq!(names(&grammar, first.first(N(s))), ["a", "b", "c"]);
    }

    #[test]
    fn first_of_sequence_with_lookahead() {
        let grammar = expression_grammar();
        let first = FirstSets::new(&grammar);

        let plus = grammar.terminal_by_name("+").unwrap();
        let t = grammar.nonterminal_by_name("T").unwrap();

        // First(T $) never reaches the lookahead because T is not nullable
        let set = first.first_of(&[N(t)], Some(TerminalID::EOI));
        assert_eq!(names(&grammar, &set), ["(", "id"]);

        // First(ε +) is just the lookahead
        let set = first.first_of(&[], Some(plus));
        assert_eq!(names(&grammar, &set), ["+"]);
    }

    #[test]
    fn adding_a_production_only_grows_first() {
        let before = {
            let grammar = Grammar::define(|g| {
                let a = g.terminal("a")?;
                let s = g.nonterminal("S")?;
                g.start_symbol(s);
                g.production(s, [T(a)])?;
                Ok(())
            })
            .unwrap();
            let first = FirstSets::new(&grammar);
            let s = grammar.nonterminal_by_name("S").unwrap();
            names(&grammar, first.first(N(s)))
        };

        let after = {
            let grammar = Grammar::define(|g| {
                let a = g.terminal("a")?;
                let b = g.terminal("b")?;
                let s = g.nonterminal("S")?;
                g.start_symbol(s);
                g.production(s, [T(a)])?;
                g.production(s, [T(b)])?;
                Ok(())
            })
            .unwrap();
            let first = FirstSets::new(&grammar);
            let s = grammar.nonterminal_by_name("S").unwrap();
            names(&grammar, first.first(N(s)))
        };

        for name in &before {
            assert!(after.contains(name));
        }
    }
}
