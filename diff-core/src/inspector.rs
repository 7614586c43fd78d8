use std::collections::BTreeSet;
use std::fmt::Write as _;

use snitch_diff_client::NodeRecord;
use snitch_diff_client::display_value;
use unicode_width::UnicodeWidthStr;

use crate::render::NodeSelection;

/// How a value cell is marked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Emphasis {
    Common,
    /// Value at the left time.
    Removed,
    /// Value at the right time.
    Added,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub text: String,
    pub emphasis: Emphasis,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowValues {
    Common(String),
    Changed { left: String, right: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyRow {
    pub name: String,
    pub values: RowValues,
}

impl PropertyRow {
    pub fn cells(&self) -> Vec<Cell> {
        match &self.values {
            RowValues::Common(value) => vec![Cell {
                text: value.clone(),
                emphasis: Emphasis::Common,
            }],
            RowValues::Changed { left, right } => vec![
                Cell {
                    text: left.clone(),
                    emphasis: Emphasis::Removed,
                },
                Cell {
                    text: right.clone(),
                    emphasis: Emphasis::Added,
                },
            ],
        }
    }

    pub fn is_changed(&self) -> bool {
        matches!(self.values, RowValues::Changed { .. })
    }
}

/// Property table for one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailInspector {
    model: String,
    id: String,
    rows: Vec<PropertyRow>,
}

impl DetailInspector {
    pub fn new(model: impl Into<String>, id: impl Into<String>, record: &NodeRecord) -> Self {
        let names: BTreeSet<&String> = record
            .left
            .keys()
            .chain(record.right.keys())
            .chain(record.both.keys())
            .collect();

        let rows = names
            .into_iter()
            .map(|name| {
                let values = match record.both.get(name) {
                    Some(value) => RowValues::Common(display_value(value)),
                    None => RowValues::Changed {
                        left: record.left.get(name).map(display_value).unwrap_or_default(),
                        right: record.right.get(name).map(display_value).unwrap_or_default(),
                    },
                };
                PropertyRow {
                    name: name.clone(),
                    values,
                }
            })
            .collect();

        Self {
            model: model.into(),
            id: id.into(),
            rows,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Header line naming the node.
    pub fn title(&self) -> String {
        format!("{} {}", self.model, self.id)
    }

    /// Rows sorted by property name.
    pub fn rows(&self) -> &[PropertyRow] {
        &self.rows
    }

    /// Plain text table. Common values get two leading spaces; changed
    /// properties get a `-` line for the left value and a `+` line for the
    /// right value.
    pub fn to_text(&self) -> String {
        let width = self.rows.iter().map(|r| r.name.width()).max().unwrap_or(0);
        let mut out = self.title();
        out.push('\n');
        for row in &self.rows {
            for cell in row.cells() {
                let sign = match cell.emphasis {
                    Emphasis::Common => ' ',
                    Emphasis::Removed => '-',
                    Emphasis::Added => '+',
                };
                let pad = width - row.name.width();
                let line = format!("{sign} {}{:pad$}  {}", row.name, "", cell.text);
                let _ = writeln!(out, "{}", line.trim_end());
            }
        }
        out
    }
}

impl From<&NodeSelection> for DetailInspector {
    fn from(selection: &NodeSelection) -> Self {
        Self::new(&selection.model, &selection.id, &selection.record)
    }
}
