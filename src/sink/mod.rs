//! Row sinks
//!
//! Completed rows leave the engine through [`RowSink`]. Zero or more sinks
//! may be attached to one run; each receives every row exactly once, in
//! emission order, synchronously on the traversal thread. Sinks must not
//! block indefinitely.

use crate::error::{ShredError, ShredResult};
use crate::flatten::Row;
use crate::schema::SchemaCatalog;
use std::io::Write;

/// Receiver of emitted rows
pub trait RowSink {
    /// Called once per closed row, in emission order.
    fn on_row(&mut self, row: &Row) -> ShredResult<()>;

    /// Called exactly once after the full document has been consumed.
    fn on_complete(&mut self) -> ShredResult<()> {
        Ok(())
    }

    /// Called once if traversal aborts. Rows already delivered remain
    /// valid; nothing is rolled back.
    fn on_error(&mut self, _error: &ShredError) {}
}

/// Sink that collects rows in memory
#[derive(Debug, Default)]
pub struct CollectSink {
    rows: Vec<Row>,
    completed: bool,
}

impl CollectSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows received so far
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// True once `on_complete` was delivered
    pub fn is_complete(&self) -> bool {
        self.completed
    }

    /// Take ownership of the collected rows
    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

impl RowSink for CollectSink {
    fn on_row(&mut self, row: &Row) -> ShredResult<()> {
        self.rows.push(row.clone());
        Ok(())
    }

    fn on_complete(&mut self) -> ShredResult<()> {
        self.completed = true;
        Ok(())
    }
}

/// Sink that writes one delimited text line per row
///
/// Line format: table name, then one field per column ordinal. Unset slots
/// become empty fields. The catalog is only used to print header lines via
/// [`DelimitedSink::write_headers`].
pub struct DelimitedSink<W: Write> {
    writer: W,
    delimiter: char,
}

impl<W: Write> DelimitedSink<W> {
    /// Create a tab-delimited sink
    pub fn new(writer: W) -> Self {
        DelimitedSink {
            writer,
            delimiter: '\t',
        }
    }

    /// Use a different field delimiter
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Write one header line per catalog table
    pub fn write_headers(&mut self, catalog: &SchemaCatalog) -> ShredResult<()> {
        for id in 0..catalog.len() {
            let table = catalog.table(id);
            write!(self.writer, "#{}", table.name())?;
            for column in table.columns() {
                write!(self.writer, "{}{}", self.delimiter, column.name)?;
            }
            writeln!(self.writer)?;
        }
        Ok(())
    }

    /// Get the underlying writer back
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RowSink for DelimitedSink<W> {
    fn on_row(&mut self, row: &Row) -> ShredResult<()> {
        write!(self.writer, "{}", row.table())?;
        for slot in row.values() {
            match slot {
                Some(value) => write!(self.writer, "{}{}", self.delimiter, value)?,
                None => write!(self.writer, "{}", self.delimiter)?,
            }
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn on_complete(&mut self) -> ShredResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{collect_rows, shred_slice, SchemaCatalog};

    fn catalog() -> SchemaCatalog {
        SchemaCatalog::builder()
            .table("Order", ["Order_Id"])
            .table("Item", ["Item_Id", "Order_Id", "sku"])
            .build()
    }

    #[test]
    fn test_collect_sink_completes() {
        let catalog = catalog();
        let mut sink = CollectSink::new();
        shred_slice(&catalog, b"<Order><Item sku=\"A\"/></Order>", &mut [&mut sink]).unwrap();
        assert!(sink.is_complete());
        assert_eq!(sink.rows().len(), 2);
    }

    #[test]
    fn test_delimited_output() {
        let catalog = catalog();
        let mut sink = DelimitedSink::new(Vec::new()).with_delimiter('|');
        shred_slice(
            &catalog,
            b"<Order><Item sku=\"A\"/><Item sku=\"B\"/></Order>",
            &mut [&mut sink],
        )
        .unwrap();

        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(text, "Item|1|1|A\nItem|2|1|B\nOrder|1\n");
    }

    #[test]
    fn test_two_sinks_see_same_rows() {
        let catalog = catalog();
        let mut first = CollectSink::new();
        let mut second = CollectSink::new();
        shred_slice(
            &catalog,
            b"<Order><Item sku=\"A\"/></Order>",
            &mut [&mut first, &mut second],
        )
        .unwrap();
        assert_eq!(first.rows(), second.rows());
    }

    #[test]
    fn test_collect_rows_convenience() {
        let rows = collect_rows(&catalog(), b"<Order/>").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].table(), "Order");
    }
}
