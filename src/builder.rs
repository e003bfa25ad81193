use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use thiserror::Error;

use crate::filter::{Branch, FilterPath, FilterTree, FilterValue, Operator};
use crate::lowercase_first;
use crate::selection::Selection;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("no table set; call table() before rendering the query")]
    NoTable,
    #[error("invalid sort direction: {0} (expected asc or desc)")]
    InvalidDirection(String),
    #[error("GraphQL request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("GraphQL response contained errors: {0}")]
    Graphql(Value),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    fn as_str(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

impl FromStr for Direction {
    type Err = QueryError;

    fn from_str(input: &str) -> Result<Self, QueryError> {
        match input.to_ascii_lowercase().as_str() {
            "asc" => Ok(Direction::Asc),
            "desc" => Ok(Direction::Desc),
            _ => Err(QueryError::InvalidDirection(input.to_string())),
        }
    }
}

/// Builds one EMX2 GraphQL query through chained calls and renders it on
/// demand. Construct a fresh builder per query; `execute` consumes it.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    endpoint: String,
    table: Option<String>,
    selection: Selection,
    filters: FilterTree,
    limit: Option<u32>,
    offset: Option<u32>,
    order: Option<(String, Direction)>,
    search: Option<String>,
}

impl QueryBuilder {
    /// The endpoint is only used by `execute`, never by `get_query`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        QueryBuilder {
            endpoint: endpoint.into(),
            ..QueryBuilder::default()
        }
    }

    /// Sets the target table. Rendered as typed; last write wins.
    pub fn table(mut self, name: impl Into<String>) -> Self {
        self.table = Some(name.into());
        self
    }

    /// Replaces the selection. Accepts a single field name, an array of
    /// names, or entries mixing fields with `SelectionEntry::nested`.
    /// Without a call, `id` and `name` are selected at render time.
    pub fn select(mut self, fields: impl Into<Selection>) -> Self {
        self.selection = fields.into();
        self
    }

    /// Starts an AND predicate on the given path. Complete it with
    /// `.equals(..)` or `.like(..)` to get the builder back.
    pub fn where_(self, path: impl Into<FilterPath>) -> WhereBuilder {
        self.start_predicate(Branch::And, path.into())
    }

    /// Alias for `where_`.
    pub fn filter(self, path: impl Into<FilterPath>) -> WhereBuilder {
        self.where_(path)
    }

    /// Starts a predicate that lands in the query's single `_or` branch.
    /// Repeated calls merge into the same `_or` object.
    pub fn or(self, path: impl Into<FilterPath>) -> WhereBuilder {
        self.start_predicate(Branch::Or, path.into())
    }

    fn start_predicate(self, branch: Branch, path: FilterPath) -> WhereBuilder {
        assert!(
            !path.is_empty(),
            "filter path requires at least one field name"
        );
        WhereBuilder {
            query: self,
            branch,
            path,
        }
    }

    /// Sets the free-text search term.
    pub fn find(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// Caps the result count. `_scope` labels the call site only and does
    /// not affect rendering; the cap always applies to the outer query.
    pub fn limit(mut self, _scope: &str, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips the first `offset` results. `_scope` as in `limit`.
    pub fn offset(mut self, _scope: &str, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Orders by a single field. `_scope` as in `limit`.
    pub fn order_by(mut self, _scope: &str, field: impl Into<String>, direction: Direction) -> Self {
        self.order = Some((field.into(), direction));
        self
    }

    /// Renders the query document. Pure and idempotent; the only error is
    /// rendering before `table` was set.
    pub fn get_query(&self) -> Result<String, QueryError> {
        let table = self.table.as_deref().ok_or(QueryError::NoTable)?;
        let selection = if self.selection.is_empty() {
            Selection::from(["id", "name"])
        } else {
            self.selection.clone()
        };

        let nested_paths = selection.nested_paths();
        let (root_filter, attachments) = self.filters.partition(&nested_paths);

        // Fixed argument order; unset parameters are omitted entirely.
        let mut arguments = Vec::new();
        if let Some(limit) = self.limit {
            arguments.push(format!("limit: {}", limit));
        }
        if let Some(offset) = self.offset {
            arguments.push(format!("offset: {}", offset));
        }
        if let Some((field, direction)) = &self.order {
            arguments.push(format!(
                "orderby: {{ {}: {} }}",
                lowercase_first(field),
                direction.as_str()
            ));
        }
        if let Some(term) = &self.search {
            arguments.push(format!("search: \"{}\"", term));
        }
        if let Some(filter) = root_filter {
            arguments.push(filter);
        }
        let arguments = if arguments.is_empty() {
            String::new()
        } else {
            format!("({})", arguments.join(", "))
        };

        let body = selection.render(&attachments);
        tracing::debug!(table, "rendered EMX2 query");
        Ok(format!("{{\n{}{} {{\n{}\n  }}\n}}", table, arguments, body))
    }

    /// Posts the rendered document to the endpoint and returns the parsed
    /// `data` payload. Transport errors and GraphQL-level `errors` propagate
    /// unchanged; no retries.
    pub async fn execute(self) -> Result<Value, QueryError> {
        let query = self.get_query()?;
        tracing::debug!(endpoint = %self.endpoint, "posting EMX2 query");

        let client = reqwest::Client::new();
        let response = client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&GraphqlRequest { query: &query })
            .send()
            .await?;

        let body: GraphqlResponse = response.json().await?;
        if let Some(errors) = body.errors {
            tracing::error!(endpoint = %self.endpoint, "GraphQL response carried errors");
            return Err(QueryError::Graphql(errors));
        }
        Ok(body.data.unwrap_or(Value::Null))
    }
}

/// Pending predicate returned by `where_`/`filter`/`or`. Only the terminal
/// operators are available, so an unfinished predicate cannot reach the
/// rendered query.
pub struct WhereBuilder {
    query: QueryBuilder,
    branch: Branch,
    path: FilterPath,
}

impl WhereBuilder {
    pub fn equals(self, value: impl Into<FilterValue>) -> QueryBuilder {
        self.finish(Operator::Equals, value.into())
    }

    pub fn like(self, value: impl Into<FilterValue>) -> QueryBuilder {
        self.finish(Operator::Like, value.into())
    }

    fn finish(self, operator: Operator, value: FilterValue) -> QueryBuilder {
        let WhereBuilder {
            mut query,
            branch,
            path,
        } = self;
        query.filters.insert(branch, path, operator, value);
        query
    }
}

#[derive(Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
}

#[derive(Deserialize)]
struct GraphqlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendering_without_a_table_fails() {
        let err = QueryBuilder::new("graphql").get_query().unwrap_err();
        assert!(matches!(err, QueryError::NoTable));
    }

    #[test]
    fn get_query_is_idempotent() {
        let query = QueryBuilder::new("graphql")
            .table("Biobanks")
            .where_("name")
            .like("UMC")
            .limit("biobanks", 100);
        assert_eq!(query.get_query().unwrap(), query.get_query().unwrap());
    }

    #[test]
    fn arguments_keep_their_fixed_order() {
        let query = QueryBuilder::new("graphql")
            .table("Biobanks")
            .select("id")
            .find("heart")
            .order_by("biobanks", "name", Direction::Desc)
            .offset("biobanks", 10)
            .where_("name")
            .like("UMC")
            .limit("biobanks", 100)
            .get_query()
            .unwrap();

        assert!(query.starts_with(
            "{\nBiobanks(limit: 100, offset: 10, orderby: { name: DESC }, \
             search: \"heart\", filter: { name: { like: \"UMC\"} })"
        ));
    }

    #[test]
    fn repeated_table_and_select_calls_take_the_last_write() {
        let query = QueryBuilder::new("graphql")
            .table("Collections")
            .select(["id", "name"])
            .table("Biobanks")
            .select("id")
            .get_query()
            .unwrap();
        assert_eq!(query, "{\nBiobanks {\n    id\n  }\n}");
    }

    #[test]
    fn direction_parses_case_insensitively() {
        assert_eq!("ASC".parse::<Direction>().unwrap(), Direction::Asc);
        assert_eq!("Desc".parse::<Direction>().unwrap(), Direction::Desc);
        assert!(matches!(
            "ascending".parse::<Direction>(),
            Err(QueryError::InvalidDirection(_))
        ));
    }

    #[test]
    fn table_name_renders_as_typed() {
        let query = QueryBuilder::new("graphql")
            .table("biobanks")
            .select("id")
            .get_query()
            .unwrap();
        assert_eq!(query, "{\nbiobanks {\n    id\n  }\n}");
    }
}
