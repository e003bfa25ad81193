//! Fluent query builder for the MOLGENIS EMX2 GraphQL dialect.
//!
//! Build a query through chained calls (`table`, `select`, `where_`/`filter`,
//! `or`, `find`, `limit`, `order_by`), render it with `get_query`, or post it
//! to an endpoint with `execute`.

mod builder;
mod filter;
mod selection;


pub use builder::{Direction, QueryBuilder, QueryError, WhereBuilder};
pub use filter::{FilterPath, FilterValue, Operator};
pub use selection::{Selection, SelectionEntry};

// Field and relation names are lower-camel-cased on output; table names are
// rendered as typed and never pass through here.
pub(crate) fn lowercase_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod case_tests {
    use super::lowercase_first;

    #[test]
    fn lowercases_only_the_first_letter() {
        assert_eq!(lowercase_first("Collections"), "collections");
        assert_eq!(lowercase_first("LayerA"), "layerA");
        assert_eq!(lowercase_first("name"), "name");
        assert_eq!(lowercase_first(""), "");
    }
}
