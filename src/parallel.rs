//! Parallel multi-document shredding
//!
//! The traversal itself is inherently sequential (sequence assignment
//! depends on document order), but independent documents can be shredded in
//! parallel, one fully independent engine per document. Results come back
//! in input order.

use rayon::prelude::*;

use crate::cursor::SliceCursor;
use crate::error::ShredResult;
use crate::flatten::{Row, Shredder};
use crate::schema::SchemaCatalog;
use crate::sink::CollectSink;

/// Shred multiple documents against one catalog, in parallel.
pub fn shred_documents(catalog: &SchemaCatalog, documents: &[&[u8]]) -> Vec<ShredResult<Vec<Row>>> {
    documents
        .par_iter()
        .map(|input| {
            let mut sink = CollectSink::new();
            Shredder::new(catalog).run(SliceCursor::new(input), &mut [&mut sink])?;
            Ok(sink.into_rows())
        })
        .collect()
}
