use crate::lowercase_first;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equals,
    Like,
}

impl Operator {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Operator::Equals => "equals",
            Operator::Like => "like",
        }
    }
}

/// A predicate value: a single string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Scalar(String),
    List(Vec<String>),
}

impl FilterValue {
    fn render(&self) -> String {
        match self {
            FilterValue::Scalar(value) => format!("\"{}\"", value),
            FilterValue::List(values) => {
                let quoted: Vec<String> = values.iter().map(|v| format!("\"{}\"", v)).collect();
                format!("[{}]", quoted.join(","))
            }
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Scalar(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Scalar(value)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(values: Vec<String>) -> Self {
        FilterValue::List(values)
    }
}

impl From<Vec<&str>> for FilterValue {
    fn from(values: Vec<&str>) -> Self {
        FilterValue::List(values.into_iter().map(String::from).collect())
    }
}

impl From<&[&str]> for FilterValue {
    fn from(values: &[&str]) -> Self {
        FilterValue::List(values.iter().map(|v| v.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for FilterValue {
    fn from(values: [&str; N]) -> Self {
        FilterValue::List(values.iter().map(|v| v.to_string()).collect())
    }
}

/// Path to the field a predicate compares: zero or more relation segments
/// followed by the leaf field name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterPath(pub(crate) Vec<String>);

impl FilterPath {
    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for FilterPath {
    fn from(segment: &str) -> Self {
        FilterPath(vec![segment.to_string()])
    }
}

impl From<String> for FilterPath {
    fn from(segment: String) -> Self {
        FilterPath(vec![segment])
    }
}

impl From<Vec<String>> for FilterPath {
    fn from(segments: Vec<String>) -> Self {
        FilterPath(segments)
    }
}

impl From<Vec<&str>> for FilterPath {
    fn from(segments: Vec<&str>) -> Self {
        FilterPath(segments.into_iter().map(String::from).collect())
    }
}

impl From<&[&str]> for FilterPath {
    fn from(segments: &[&str]) -> Self {
        FilterPath(segments.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for FilterPath {
    fn from(segments: [&str; N]) -> Self {
        FilterPath(segments.iter().map(|s| s.to_string()).collect())
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Branch {
    And,
    Or,
}

#[derive(Debug, Clone)]
struct Predicate {
    leaf: String,
    operator: Operator,
    value: FilterValue,
}

impl Predicate {
    fn render(&self) -> String {
        // Leaf shape pins the dialect exactly: `name: { like: "UMC"}`.
        format!(
            "{}: {{ {}: {}}}",
            self.leaf,
            self.operator.as_str(),
            self.value.render()
        )
    }
}

// Predicates sharing a relation path merge into one entry so they render as
// sibling keys inside a single nested object.
#[derive(Debug, Clone)]
struct FilterEntry {
    relation: Vec<String>,
    predicates: Vec<Predicate>,
}

impl FilterEntry {
    fn render_leaves(&self) -> String {
        let leaves: Vec<String> = self.predicates.iter().map(Predicate::render).collect();
        leaves.join(", ")
    }

    fn render(&self) -> String {
        let mut rendered = self.render_leaves();
        for segment in self.relation.iter().rev() {
            rendered = format!("{}: {{ {} }}", segment, rendered);
        }
        rendered
    }
}

/// Ordered filter tree with the default AND branch and the single `_or`
/// branch the dialect supports. No deeper boolean nesting exists.
#[derive(Debug, Clone, Default)]
pub(crate) struct FilterTree {
    and: Vec<FilterEntry>,
    or: Vec<FilterEntry>,
}

impl FilterTree {
    pub(crate) fn insert(
        &mut self,
        branch: Branch,
        path: FilterPath,
        operator: Operator,
        value: FilterValue,
    ) {
        let mut relation: Vec<String> = path.0.iter().map(|s| lowercase_first(s)).collect();
        let leaf = relation.pop().expect("filter path checked non-empty on entry");
        let predicate = Predicate { leaf, operator, value };

        let entries = match branch {
            Branch::And => &mut self.and,
            Branch::Or => &mut self.or,
        };
        if let Some(entry) = entries.iter_mut().find(|e| e.relation == relation) {
            entry.predicates.push(predicate);
        } else {
            entries.push(FilterEntry {
                relation,
                predicates: vec![predicate],
            });
        }
    }

    /// Splits the tree into the root `filter:` argument and the fragments
    /// that attach to nested selection blocks. An AND entry attaches to the
    /// first nested node whose accumulated path ends with the entry's
    /// relation path; `_or` entries always stay at the root.
    pub(crate) fn partition(
        &self,
        nested_paths: &[Vec<String>],
    ) -> (Option<String>, HashMap<Vec<String>, String>) {
        let mut attached: HashMap<Vec<String>, Vec<&FilterEntry>> = HashMap::new();
        let mut root: Vec<String> = Vec::new();

        for entry in &self.and {
            let target = if entry.relation.is_empty() {
                None
            } else {
                nested_paths
                    .iter()
                    .find(|path| path.ends_with(entry.relation.as_slice()))
            };
            match target {
                Some(path) => attached.entry(path.clone()).or_default().push(entry),
                None => root.push(entry.render()),
            }
        }

        if !self.or.is_empty() {
            let ors: Vec<String> = self.or.iter().map(FilterEntry::render).collect();
            root.push(format!("_or: {{ {} }}", ors.join(", ")));
        }

        let root_argument = if root.is_empty() {
            None
        } else {
            Some(format!("filter: {{ {} }}", root.join(", ")))
        };

        let attachments = attached
            .into_iter()
            .map(|(path, entries)| {
                let leaves: Vec<String> =
                    entries.iter().map(|e| e.render_leaves()).collect();
                (path, format!("filter: {{ {} }}", leaves.join(", ")))
            })
            .collect();

        (root_argument, attachments)
    }
}
