//! Data tables and the argument lookup built from them.

use std::collections::HashMap;

use serde::Serialize;

use crate::token::Span;

/// How a table cell is resolved at execution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CellKind {
    Static,
    /// Refers to a column of an enclosing data table.
    Dynamic,
    /// `file:` or `table:` reference, left unresolved.
    Special,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableCell {
    pub value: String,
    pub kind: CellKind,
}

impl TableCell {
    #[must_use]
    pub fn new(value: impl Into<String>, kind: CellKind) -> Self {
        Self {
            value: value.into(),
            kind,
        }
    }

    #[must_use]
    pub fn literal(value: impl Into<String>) -> Self {
        Self::new(value, CellKind::Static)
    }
}

/// Headers plus rows of cells.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<TableCell>>,
    pub span: Span,
}

impl Table {
    #[must_use]
    pub fn new(headers: Vec<String>, line: usize) -> Self {
        Self {
            headers,
            rows: Vec::new(),
            span: Span::line(line),
        }
    }

    /// A table is declared once it has a header row.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        !self.headers.is_empty()
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn add_row(&mut self, cells: Vec<TableCell>, line: usize) {
        self.rows.push(cells);
        self.span.end = line;
    }

    /// Cell values of the column named `header`, top to bottom.
    #[must_use]
    pub fn column(&self, header: &str) -> Option<Vec<&str>> {
        let index = self.headers.iter().position(|h| h == header)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(index).map_or("", |cell| cell.value.as_str()))
                .collect(),
        )
    }
}

/// A document or scenario level data table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DataTable {
    pub table: Table,
    /// Declared with `table: <path>` rather than inline.
    pub is_external: bool,
    pub reference: Option<String>,
}

impl DataTable {
    #[must_use]
    pub fn inline(table: Table) -> Self {
        Self {
            table,
            is_external: false,
            reference: None,
        }
    }

    #[must_use]
    pub fn external(reference: &str, line: usize) -> Self {
        Self {
            table: Table {
                span: Span::line(line),
                ..Table::default()
            },
            is_external: true,
            reference: Some(reference.to_string()),
        }
    }

    /// True once either an inline header or an external reference has been
    /// declared.
    #[must_use]
    pub fn is_declared(&self) -> bool {
        self.is_external || self.table.is_initialized()
    }
}

/// Read-only view over one or more tables, keyed by column name.
///
/// Tables added later shadow earlier ones, so a scenario table passed after
/// the document table wins on a name collision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgLookup {
    values: HashMap<String, Option<String>>,
    concept_header: bool,
}

impl ArgLookup {
    #[must_use]
    pub fn from_tables(tables: &[&Table]) -> Self {
        let mut values = HashMap::new();
        for table in tables {
            for (index, header) in table.headers.iter().enumerate() {
                let first = table
                    .rows
                    .first()
                    .and_then(|row| row.get(index))
                    .map(|cell| cell.value.clone());
                values.insert(header.clone(), first);
            }
        }
        Self {
            values,
            concept_header: false,
        }
    }

    /// Lookup for a concept definition, whose dynamic arguments are the
    /// concept's own parameters and always resolve.
    #[must_use]
    pub fn concept_header() -> Self {
        Self {
            values: HashMap::new(),
            concept_header: true,
        }
    }

    /// Lookup whose only names are the given concept parameters.
    #[must_use]
    pub fn from_params<S: AsRef<str>>(names: &[S]) -> Self {
        Self {
            values: names
                .iter()
                .map(|name| (name.as_ref().to_string(), None))
                .collect(),
            concept_header: false,
        }
    }

    #[must_use]
    pub fn is_concept_header(&self) -> bool {
        self.concept_header
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// First-row value of the column `name`, if the column has any rows.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Option::as_deref)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> Table {
        let mut t = Table::new(headers.iter().map(ToString::to_string).collect(), 1);
        for (i, row) in rows.iter().enumerate() {
            t.add_row(row.iter().map(|v| TableCell::literal(*v)).collect(), i + 2);
        }
        t
    }

    #[test]
    fn lookup_merges_tables() {
        let spec = table(&["id", "name"], &[&["1", "ada"]]);
        let scenario = table(&["city"], &[&["paris"]]);
        let lookup = ArgLookup::from_tables(&[&spec, &scenario]);
        assert!(lookup.contains("id"));
        assert!(lookup.contains("city"));
        assert_eq!(lookup.get("name"), Some("ada"));
        assert_eq!(lookup.len(), 3);
    }

    #[test]
    fn scenario_table_shadows_document() {
        let spec = table(&["name"], &[&["ada"]]);
        let scenario = table(&["name"], &[&["grace"]]);
        let lookup = ArgLookup::from_tables(&[&spec, &scenario]);
        assert_eq!(lookup.get("name"), Some("grace"));
    }

    #[test]
    fn header_without_rows_is_known_but_empty() {
        let spec = table(&["name"], &[]);
        let lookup = ArgLookup::from_tables(&[&spec]);
        assert!(lookup.contains("name"));
        assert_eq!(lookup.get("name"), None);
    }

    #[test]
    fn column_values() {
        let t = table(&["a", "b"], &[&["1", "2"], &["3", "4"]]);
        assert_eq!(t.column("b"), Some(vec!["2", "4"]));
        assert_eq!(t.column("c"), None);
        assert_eq!(t.span, Span::new(1, 3));
    }

    #[test]
    fn external_table_is_declared_without_headers() {
        let dt = DataTable::external("data/users.csv", 3);
        assert!(dt.is_declared());
        assert!(!dt.table.is_initialized());
        assert!(!DataTable::default().is_declared());
    }
}
