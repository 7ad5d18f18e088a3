//! Rendering of id-based values through their owning grammar.
//!
//! Symbols, productions and items are dense integer ids; turning them back
//! into readable text always needs the [`Grammar`] that holds the name
//! tables. `Scoped` pairs a borrowed value with that grammar so each type
//! can hand out an `impl Display` without cloning names. The `Display`
//! impls themselves live next to the types they render.

use crate::grammar::Grammar;

pub(crate) struct Scoped<'g, T: ?Sized> {
    pub(crate) grammar: &'g Grammar,
    pub(crate) value: &'g T,
}

impl<'g, T: ?Sized> Scoped<'g, T> {
    pub(crate) fn new(grammar: &'g Grammar, value: &'g T) -> Self {
        Self { grammar, value }
    }
}
