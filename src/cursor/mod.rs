//! Forward-only document cursor
//!
//! The shredding engine consumes documents through [`DocumentCursor`], a
//! forward-only stream of element openings plus one terminal end-of-document
//! step. Depth bookkeeping and end-tag balancing live below this trait, so
//! the engine never sees end tags, text, comments or processing
//! instructions.
//!
//! [`SliceCursor`] is the built-in implementation over a byte slice.

pub mod slice;

pub use slice::SliceCursor;

use crate::core::attributes::Attribute;
use crate::error::ShredResult;

/// One step of document traversal
#[derive(Debug)]
pub enum CursorStep<'a> {
    /// An element was opened. `depth` is the number of enclosing open
    /// elements (the document element is at depth 0). Empty elements
    /// (`<x/>`) appear as a single `Open` step.
    Open {
        name: &'a [u8],
        depth: usize,
        attributes: Vec<Attribute<'a>>,
    },
    /// End of input. `unclosed` is the number of elements still open; it is
    /// zero for a well-formed document.
    EndOfDocument { unclosed: usize },
}

/// Forward-only cursor over an XML document
///
/// Cursors cannot seek backward. After `EndOfDocument` has been returned
/// the cursor keeps returning it.
pub trait DocumentCursor {
    /// Advance to the next element opening or end of document.
    fn next_step(&mut self) -> ShredResult<CursorStep<'_>>;
}
