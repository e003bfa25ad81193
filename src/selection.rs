use crate::lowercase_first;
use std::collections::HashMap;

/// One item of a selection: a scalar field or a nested sub-selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionEntry {
    Field(String),
    Nested(String, Vec<SelectionEntry>),
}

impl SelectionEntry {
    pub fn nested(name: impl Into<String>, fields: impl Into<Selection>) -> Self {
        SelectionEntry::Nested(name.into(), fields.into().0)
    }
}

impl From<&str> for SelectionEntry {
    fn from(name: &str) -> Self {
        SelectionEntry::Field(name.to_string())
    }
}

impl From<String> for SelectionEntry {
    fn from(name: String) -> Self {
        SelectionEntry::Field(name)
    }
}

/// Ordered selection for one table. Duplicates are kept as supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection(pub(crate) Vec<SelectionEntry>);

impl Selection {
    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Accumulated lower-camel paths of every nested block, in document order.
    pub(crate) fn nested_paths(&self) -> Vec<Vec<String>> {
        let mut paths = Vec::new();
        collect_paths(&self.0, &mut Vec::new(), &mut paths);
        paths
    }

    /// Renders the selection body, one field per line, four spaces per depth.
    /// `attachments` carries filter fragments keyed by accumulated path;
    /// a matching nested block gets the fragment as `(filter: ...)`.
    pub(crate) fn render(&self, attachments: &HashMap<Vec<String>, String>) -> String {
        render_entries(&self.0, 1, &mut Vec::new(), attachments)
    }
}

impl From<&str> for Selection {
    fn from(field: &str) -> Self {
        Selection(vec![SelectionEntry::from(field)])
    }
}

impl From<String> for Selection {
    fn from(field: String) -> Self {
        Selection(vec![SelectionEntry::from(field)])
    }
}

impl From<SelectionEntry> for Selection {
    fn from(entry: SelectionEntry) -> Self {
        Selection(vec![entry])
    }
}

impl From<Vec<SelectionEntry>> for Selection {
    fn from(entries: Vec<SelectionEntry>) -> Self {
        Selection(entries)
    }
}

impl From<Vec<&str>> for Selection {
    fn from(fields: Vec<&str>) -> Self {
        Selection(fields.into_iter().map(SelectionEntry::from).collect())
    }
}

impl From<Vec<String>> for Selection {
    fn from(fields: Vec<String>) -> Self {
        Selection(fields.into_iter().map(SelectionEntry::from).collect())
    }
}

impl From<&[&str]> for Selection {
    fn from(fields: &[&str]) -> Self {
        Selection(fields.iter().map(|f| SelectionEntry::from(*f)).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Selection {
    fn from(fields: [&str; N]) -> Self {
        Selection(fields.iter().map(|f| SelectionEntry::from(*f)).collect())
    }
}

impl<const N: usize> From<[SelectionEntry; N]> for Selection {
    fn from(entries: [SelectionEntry; N]) -> Self {
        Selection(entries.to_vec())
    }
}

fn collect_paths(
    entries: &[SelectionEntry],
    prefix: &mut Vec<String>,
    out: &mut Vec<Vec<String>>,
) {
    for entry in entries {
        if let SelectionEntry::Nested(name, children) = entry {
            prefix.push(lowercase_first(name));
            out.push(prefix.clone());
            collect_paths(children, prefix, out);
            prefix.pop();
        }
    }
}

fn render_entries(
    entries: &[SelectionEntry],
    depth: usize,
    prefix: &mut Vec<String>,
    attachments: &HashMap<Vec<String>, String>,
) -> String {
    let indent = "    ".repeat(depth);
    let mut chunks = Vec::with_capacity(entries.len());

    for entry in entries {
        match entry {
            SelectionEntry::Field(name) => {
                chunks.push(format!("{}{}", indent, lowercase_first(name)));
            }
            SelectionEntry::Nested(name, children) => {
                let name = lowercase_first(name);
                prefix.push(name.clone());
                let arguments = attachments
                    .get(prefix)
                    .map(|fragment| format!("({})", fragment))
                    .unwrap_or_default();
                let body = render_entries(children, depth + 1, prefix, attachments);
                prefix.pop();
                chunks.push(format!(
                    "{}{}{} {{\n{}\n{}}}",
                    indent, name, arguments, body, indent
                ));
            }
        }
    }

    chunks.join(",\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_fields_render_comma_separated() {
        let selection = Selection::from(["id", "name"]);
        assert_eq!(selection.render(&HashMap::new()), "    id,\n    name");
    }

    #[test]
    fn field_names_are_camel_cased_but_order_and_duplicates_are_kept() {
        let selection = Selection::from(["Name", "id", "name"]);
        assert_eq!(
            selection.render(&HashMap::new()),
            "    name,\n    id,\n    name"
        );
    }

    #[test]
    fn nested_entries_render_one_level_deeper() {
        let selection = Selection::from(vec![
            SelectionEntry::from("id"),
            SelectionEntry::nested("Collections", ["id", "name"]),
        ]);
        assert_eq!(
            selection.render(&HashMap::new()),
            "    id,\n    collections {\n        id,\n        name\n    }"
        );
    }

    #[test]
    fn nested_paths_accumulate_in_document_order() {
        let selection = Selection::from(vec![
            SelectionEntry::from("id"),
            SelectionEntry::nested(
                "LayerA",
                vec![SelectionEntry::nested("layerB", ["id"])],
            ),
        ]);
        assert_eq!(
            selection.nested_paths(),
            vec![
                vec!["layerA".to_string()],
                vec!["layerA".to_string(), "layerB".to_string()],
            ]
        );
    }

    #[test]
    fn attachments_render_as_filter_arguments() {
        let selection = Selection::from(vec![SelectionEntry::nested(
            "collections",
            ["id", "name"],
        )]);
        let mut attachments = HashMap::new();
        attachments.insert(
            vec!["collections".to_string()],
            "filter: { name: { like: \"cardiovascular\"} }".to_string(),
        );
        assert_eq!(
            selection.render(&attachments),
            "    collections(filter: { name: { like: \"cardiovascular\"} }) {\n        id,\n        name\n    }"
        );
    }
}
