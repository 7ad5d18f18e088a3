use anyhow::Context as _;
use clap::Parser as _;
use lexalr::dfa::Dfa;
use lexalr::grammar::{Grammar, SymbolID::*};
use lexalr::lalr::LalrTable;
use lexalr::minimize::minimize;
use lexalr::parser::Parser;
use lexalr::tokenizer::Tokenizer;
use tracing_subscriber::EnvFilter;

/// Tokenize and parse an arithmetic expression.
#[derive(Debug, clap::Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Print the recognized tokens before parsing.
    #[arg(long)]
    tokens: bool,

    /// The expression, e.g. "1 + 2 * (3 + 4)".
    expression: String,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let mut tokenizer = Tokenizer::new();
    let digits: Vec<String> = ('0'..='9').map(String::from).collect();
    let num = Dfa::compile(&format!("({})+", digits.join("|")))
        .context("failed to compile the number pattern")?;
    tokenizer.rule("NUM", minimize(&num));
    for op in ["+", "-", "*", "/", "(", ")"] {
        tokenizer.rule(op, Dfa::literal(op));
    }

    let tokens = tokenizer
        .tokenize(&args.expression)
        .context("tokenization failed")?;
    if args.tokens {
        for token in &tokens {
            println!("{:6} {:?}", token.kind, token.lexeme);
        }
    }

    let grammar = arithmetic_grammar()?;
    tracing::debug!("grammar:\n{}", grammar);

    let table = LalrTable::generate(grammar);
    if !table.conflicts().is_empty() {
        for conflict in table.conflicts() {
            eprintln!("conflict: {}", conflict.display(table.grammar()));
        }
        anyhow::bail!("the grammar produced a conflicting parse table");
    }

    let parser = Parser::new(table);
    if parser.parse(&tokens) {
        println!("accepted");
        Ok(())
    } else {
        anyhow::bail!("syntax error in {:?}", args.expression)
    }
}

fn arithmetic_grammar() -> anyhow::Result<Grammar> {
    let grammar = Grammar::define(|g| {
        let plus = g.terminal("+")?;
        let minus = g.terminal("-")?;
        let star = g.terminal("*")?;
        let slash = g.terminal("/")?;
        let lparen = g.terminal("(")?;
        let rparen = g.terminal(")")?;
        let num = g.terminal("NUM")?;

        let expr = g.nonterminal("expr")?;
        let term = g.nonterminal("term")?;
        let factor = g.nonterminal("factor")?;

        g.start_symbol(expr);

        g.production(expr, [N(expr), T(plus), N(term)])?;
        g.production(expr, [N(expr), T(minus), N(term)])?;
        g.production(expr, [N(term)])?;

        g.production(term, [N(term), T(star), N(factor)])?;
        g.production(term, [N(term), T(slash), N(factor)])?;
        g.production(term, [N(factor)])?;

        g.production(factor, [T(num)])?;
        g.production(factor, [T(lparen), N(expr), T(rparen)])?;
        Ok(())
    })?;
    Ok(grammar)
}
