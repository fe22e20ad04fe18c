//! xmlshred - Streaming XML to relational row shredding
//!
//! Converts an arbitrarily deep XML document into a flat sequence of
//! relational rows: one row per matching element occurrence, one table per
//! distinct element name, with synthetic surrogate keys linking child rows
//! to their structural ancestors.
//!
//! Layers, bottom up:
//! - `core`: byte-level XML primitives (scanner, tokenizer, attributes)
//! - `cursor`: forward-only document cursor the engine consumes
//! - `schema`: table/column catalog, plus an XSD-subset compiler
//! - `flatten`: identity chain, staging buffer and the shredder itself
//! - `sink`: row receivers (collect, delimited text)
//! - `parallel`: rayon fan-out over independent documents
//!
//! ```
//! use xmlshred::{collect_rows, SchemaCatalog};
//!
//! let catalog = SchemaCatalog::builder()
//!     .table("Order", ["Order_Id"])
//!     .table("Item", ["Item_Id", "Order_Id", "sku"])
//!     .build();
//!
//! let rows = collect_rows(
//!     &catalog,
//!     b"<Order><Item sku=\"A\"/><Item sku=\"B\"/></Order>",
//! )
//! .unwrap();
//!
//! // Children flush before their enclosing row
//! let tables: Vec<_> = rows.iter().map(|r| r.table()).collect();
//! assert_eq!(tables, vec!["Item", "Item", "Order"]);
//! ```

pub mod core;
pub mod cursor;
pub mod error;
pub mod flatten;
pub mod parallel;
pub mod schema;
pub mod sink;

pub use cursor::{CursorStep, DocumentCursor, SliceCursor};
pub use error::{ShredError, ShredResult};
pub use flatten::{CancelToken, Row, ShredSummary, Shredder, Value};
pub use schema::{xsd::compile_xsd, ColumnKind, SchemaCatalog};
pub use sink::{CollectSink, DelimitedSink, RowSink};

use std::io::Read;

/// Shred a document held in memory, delivering rows to the given sinks.
pub fn shred_slice(
    catalog: &SchemaCatalog,
    input: &[u8],
    sinks: &mut [&mut dyn RowSink],
) -> ShredResult<ShredSummary> {
    Shredder::new(catalog).run(SliceCursor::new(input), sinks)
}

/// Shred a document from any `Read` source.
///
/// The cursor is slice-backed, so the source is read fully into memory
/// first; rows still stream out one at a time.
pub fn shred_reader<R: Read>(
    catalog: &SchemaCatalog,
    mut reader: R,
    sinks: &mut [&mut dyn RowSink],
) -> ShredResult<ShredSummary> {
    let mut input = Vec::new();
    reader.read_to_end(&mut input)?;
    shred_slice(catalog, &input, sinks)
}

/// Shred a document and collect all rows in emission order.
pub fn collect_rows(catalog: &SchemaCatalog, input: &[u8]) -> ShredResult<Vec<Row>> {
    let mut sink = CollectSink::new();
    shred_slice(catalog, input, &mut [&mut sink])?;
    Ok(sink.into_rows())
}
