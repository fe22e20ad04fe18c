//! Row representations
//!
//! A row moves through exactly two states, modeled as two types: an open
//! [`PendingRow`] owned exclusively by the staging buffer, and a closed
//! [`Row`] handed to sinks. `PendingRow::close` is the single transition;
//! sinks can never observe a row whose identifier is not yet final.

use crate::schema::TableId;
use std::fmt;

/// A single column value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Synthetic identifier (self-id or foreign key)
    Id(u64),
    /// Attribute text
    Text(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Id(id) => write!(f, "{id}"),
            Value::Text(text) => write!(f, "{text}"),
        }
    }
}

/// A completed row, safe to emit
///
/// Values are indexed by column ordinal; a None slot means the column had
/// no value in this occurrence (an absent attribute, or a foreign key under
/// the document root).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    table: String,
    values: Vec<Option<Value>>,
}

impl Row {
    /// Name of the destination table
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Values by column ordinal
    pub fn values(&self) -> &[Option<Value>] {
        &self.values
    }

    /// Value at a column ordinal, if set
    pub fn value(&self, ordinal: usize) -> Option<&Value> {
        self.values.get(ordinal).and_then(Option::as_ref)
    }
}

/// A row created on an element's open tag but not yet structurally closed
#[derive(Debug)]
pub(crate) struct PendingRow {
    pub table: TableId,
    pub depth: i64,
    /// Fixed at creation; the future self-id value
    pub sequence: u64,
    values: Vec<Option<Value>>,
}

impl PendingRow {
    pub fn new(table: TableId, depth: i64, sequence: u64, columns: usize) -> Self {
        PendingRow {
            table,
            depth,
            sequence,
            values: vec![None; columns],
        }
    }

    /// Write a value slot (attribute at creation, foreign key at linkage)
    pub fn set(&mut self, ordinal: usize, value: Value) {
        self.values[ordinal] = Some(value);
    }

    /// Close the row: materialize the self-id fixed at creation and give up
    /// ownership to the emitted form.
    pub fn close(mut self, table_name: &str, self_id_ordinal: Option<usize>) -> Row {
        if let Some(ordinal) = self_id_ordinal {
            self.values[ordinal] = Some(Value::Id(self.sequence));
        }
        Row {
            table: table_name.to_string(),
            values: self.values,
        }
    }
}
