//! The shredding engine
//!
//! Drives a [`DocumentCursor`] in document order and turns every known-table
//! element into one relational row. Each step is classified by comparing the
//! cursor's element depth against the active identity context:
//!
//! - *descend* (deeper): the element is nested inside the active table;
//!   move the context down via `child_of`.
//! - *sibling / same depth*: bump the position's sequence counter; a new
//!   element name at the same depth switches to the sibling context first.
//! - *ascend* (shallower): the enclosing subtrees have ended; every staged
//!   row at or below the abandoned depth is closed and flushed, deepest
//!   first, then the context walks parent links back up.
//!
//! A row's self-id is fixed the moment its occurrence is counted; closing a
//! row only materializes that value into its column. Foreign keys are
//! written at creation from the immediate ancestor's already-fixed sequence.
//! Rows therefore never change value after creation, only ownership: buffer
//! to sink, exactly once, in closure order.

use std::cmp::Reverse;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

use super::chain::{IdentityChain, NodeId, ROOT};
use super::row::{PendingRow, Value};
use crate::core::attributes::Attribute;
use crate::cursor::{CursorStep, DocumentCursor};
use crate::error::{ShredError, ShredResult};
use crate::schema::{id_column_name, SchemaCatalog, TableId};
use crate::sink::RowSink;

/// Cooperative cancellation handle, checked before every cursor read
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; the running pass aborts with
    /// [`ShredError::Cancelled`] at its next cursor read.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Counters describing a finished run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShredSummary {
    /// Rows delivered to each sink
    pub rows_emitted: u64,
    /// Elements whose name mapped to a catalog table
    pub elements_seen: u64,
    /// High-water mark of the staging buffer
    pub max_staged: usize,
}

/// Streaming XML-to-row shredder
///
/// Single-threaded and pull-based: the shredder drives the cursor, and all
/// state (identity chain, staging buffer) is exclusively owned by the
/// running pass. One shredder can run any number of documents; every run is
/// independent.
pub struct Shredder<'a> {
    catalog: &'a SchemaCatalog,
    cancel: Option<CancelToken>,
}

impl<'a> Shredder<'a> {
    pub fn new(catalog: &'a SchemaCatalog) -> Self {
        Shredder {
            catalog,
            cancel: None,
        }
    }

    /// Attach a cancellation token checked before every cursor read
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Consume the document and deliver rows to every sink.
    ///
    /// On success each sink has seen every row exactly once followed by
    /// `on_complete`. On failure each sink gets `on_error`; rows flushed
    /// before the failure remain delivered (at-least-once, nothing is
    /// rolled back).
    pub fn run<C: DocumentCursor>(
        &self,
        cursor: C,
        sinks: &mut [&mut dyn RowSink],
    ) -> ShredResult<ShredSummary> {
        debug!(tables = self.catalog.len(), "shred run started");
        let mut pass = Pass {
            catalog: self.catalog,
            chain: IdentityChain::new(),
            active: ROOT,
            staged: Vec::new(),
            rows_emitted: 0,
            elements_seen: 0,
            max_staged: 0,
        };

        match pass.drive(cursor, self.cancel.as_ref(), sinks) {
            Ok(summary) => {
                debug!(
                    rows = summary.rows_emitted,
                    elements = summary.elements_seen,
                    "shred run finished"
                );
                Ok(summary)
            }
            Err(err) => {
                for sink in sinks.iter_mut() {
                    sink.on_error(&err);
                }
                Err(err)
            }
        }
    }
}

/// State of one traversal pass
struct Pass<'a> {
    catalog: &'a SchemaCatalog,
    chain: IdentityChain,
    active: NodeId,
    /// Rows created but not yet structurally closed, in creation order
    staged: Vec<PendingRow>,
    rows_emitted: u64,
    elements_seen: u64,
    max_staged: usize,
}

impl Pass<'_> {
    fn drive<C: DocumentCursor>(
        &mut self,
        mut cursor: C,
        cancel: Option<&CancelToken>,
        sinks: &mut [&mut dyn RowSink],
    ) -> ShredResult<ShredSummary> {
        loop {
            if cancel.is_some_and(CancelToken::is_cancelled) {
                return Err(ShredError::Cancelled);
            }

            match cursor.next_step()? {
                CursorStep::Open {
                    name,
                    depth,
                    attributes,
                } => {
                    // Skip rule: element names absent from the catalog are
                    // advanced past without creating state
                    let Some(table) = self.catalog.table_id(name) else {
                        continue;
                    };
                    self.open_element(table, depth as i64, &attributes, sinks)?;
                }
                CursorStep::EndOfDocument { unclosed } => {
                    return self.finish(unclosed, sinks);
                }
            }
        }
    }

    /// Handle one known-table element occurrence
    fn open_element(
        &mut self,
        table: TableId,
        depth: i64,
        attributes: &[Attribute<'_>],
        sinks: &mut [&mut dyn RowSink],
    ) -> ShredResult<()> {
        self.elements_seen += 1;

        // Ascend: the subtrees below this depth have ended, so their rows
        // cannot receive further content
        if depth < self.chain.depth(self.active) {
            self.flush_at_or_below(depth, sinks)?;
            self.active = self.chain.ascend_to(self.active, depth);
        }

        if depth > self.chain.depth(self.active) {
            // Descend into a nested table
            self.active = self.chain.child_of(self.active, table, depth);
        } else if self.chain.table(self.active) != Some(table) {
            // A different table at the same depth: switch to the sibling
            // position under the same parent
            let parent = self.chain.parent(self.active);
            self.active = self.chain.child_of(parent, table, depth);
        }

        let sequence = self.chain.increment(self.active);
        self.stage_row(table, depth, sequence, attributes)
    }

    /// Create the pending row for the occurrence just counted
    fn stage_row(
        &mut self,
        table_id: TableId,
        depth: i64,
        sequence: u64,
        attributes: &[Attribute<'_>],
    ) -> ShredResult<()> {
        let table = self.catalog.table(table_id);
        let mut row = PendingRow::new(table_id, depth, sequence, table.column_count());

        // Parent linkage is final at creation: the ancestor's sequence was
        // fixed when the ancestor's own occurrence was counted
        let parent = self.chain.parent(self.active);
        if parent != ROOT {
            let parent_table = self.catalog.table(
                self.chain
                    .table(parent)
                    .expect("non-root chain node has a table"),
            );
            let fk_name = id_column_name(parent_table.name());
            let ordinal = table.column_ordinal(&fk_name).ok_or_else(|| {
                ShredError::UnresolvedColumn {
                    table: table.name().to_string(),
                    column: fk_name,
                }
            })?;
            row.set(ordinal, Value::Id(self.chain.sequence(parent)));
        }

        for attr in attributes {
            let name = String::from_utf8_lossy(attr.name);
            let ordinal = table.column_ordinal(&name).ok_or_else(|| {
                ShredError::UnresolvedColumn {
                    table: table.name().to_string(),
                    column: name.into_owned(),
                }
            })?;
            let text = String::from_utf8_lossy(attr.value.as_ref()).into_owned();
            row.set(ordinal, Value::Text(text));
        }

        trace!(table = table.name(), depth, sequence, "row staged");
        self.staged.push(row);
        self.max_staged = self.max_staged.max(self.staged.len());
        Ok(())
    }

    /// Close and emit every staged row at `depth` or deeper. Innermost rows
    /// close first; rows at equal depth keep creation order.
    fn flush_at_or_below(
        &mut self,
        depth: i64,
        sinks: &mut [&mut dyn RowSink],
    ) -> ShredResult<()> {
        let mut closing = Vec::new();
        let mut i = 0;
        while i < self.staged.len() {
            if self.staged[i].depth >= depth {
                closing.push(self.staged.remove(i));
            } else {
                i += 1;
            }
        }
        // Stable sort: a row closes no earlier than the rows nested in it
        closing.sort_by_key(|row| Reverse(row.depth));

        for pending in closing {
            let table = self.catalog.table(pending.table);
            let row = pending.close(table.name(), table.self_id_ordinal());
            trace!(table = row.table(), "row flushed");
            for sink in sinks.iter_mut() {
                sink.on_row(&row)?;
            }
            self.rows_emitted += 1;
        }
        Ok(())
    }

    /// Terminal transition at end of input
    fn finish(
        &mut self,
        unclosed: usize,
        sinks: &mut [&mut dyn RowSink],
    ) -> ShredResult<ShredSummary> {
        if unclosed > 0 {
            return Err(ShredError::UnexpectedEndOfDocument {
                open_rows: self.staged.len(),
            });
        }

        // Final ascend to the document surface closes everything left
        self.flush_at_or_below(0, sinks)?;
        for sink in sinks.iter_mut() {
            sink.on_complete()?;
        }
        Ok(ShredSummary {
            rows_emitted: self.rows_emitted,
            elements_seen: self.elements_seen,
            max_staged: self.max_staged,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::SliceCursor;
    use crate::sink::CollectSink;

    fn order_item_catalog() -> SchemaCatalog {
        SchemaCatalog::builder()
            .table("Order", ["Order_Id"])
            .table("Item", ["Item_Id", "Order_Id", "sku"])
            .build()
    }

    fn run(catalog: &SchemaCatalog, input: &[u8]) -> ShredResult<(Vec<crate::flatten::Row>, ShredSummary)> {
        let mut sink = CollectSink::new();
        let summary = Shredder::new(catalog).run(SliceCursor::new(input), &mut [&mut sink])?;
        Ok((sink.into_rows(), summary))
    }

    fn id(row: &crate::flatten::Row, ordinal: usize) -> Option<u64> {
        match row.value(ordinal) {
            Some(Value::Id(id)) => Some(*id),
            _ => None,
        }
    }

    #[test]
    fn test_order_item_example() {
        let catalog = order_item_catalog();
        let (rows, summary) =
            run(&catalog, b"<Order><Item sku=\"A\"/><Item sku=\"B\"/></Order>").unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].table(), "Item");
        assert_eq!(id(&rows[0], 0), Some(1));
        assert_eq!(id(&rows[0], 1), Some(1));
        assert_eq!(rows[0].value(2), Some(&Value::Text("A".into())));

        assert_eq!(rows[1].table(), "Item");
        assert_eq!(id(&rows[1], 0), Some(2));
        assert_eq!(id(&rows[1], 1), Some(1));
        assert_eq!(rows[1].value(2), Some(&Value::Text("B".into())));

        assert_eq!(rows[2].table(), "Order");
        assert_eq!(id(&rows[2], 0), Some(1));

        assert_eq!(summary.rows_emitted, 3);
        assert_eq!(summary.elements_seen, 3);
    }

    #[test]
    fn test_unknown_elements_skipped_without_error() {
        let catalog = order_item_catalog();
        let (rows, summary) = run(
            &catalog,
            b"<Batch note=\"x\"><Order><Audit/><Item sku=\"A\"/></Order></Batch>",
        )
        .unwrap();

        assert_eq!(summary.elements_seen, 2);
        let tables: Vec<_> = rows.iter().map(|r| r.table()).collect();
        assert_eq!(tables, vec!["Item", "Order"]);
    }

    #[test]
    fn test_row_count_equals_known_element_count() {
        let catalog = order_item_catalog();
        let (rows, _) = run(
            &catalog,
            b"<Order><Item sku=\"A\"/><Item sku=\"B\"/><Item sku=\"C\"/></Order>",
        )
        .unwrap();
        assert_eq!(rows.len(), 4);
    }

    #[test]
    fn test_sibling_sequence_is_one_based() {
        let catalog = order_item_catalog();
        let (rows, _) = run(&catalog, b"<Order><Item/><Item/><Item/></Order>").unwrap();

        let item_ids: Vec<_> = rows
            .iter()
            .filter(|r| r.table() == "Item")
            .map(|r| id(r, 0).unwrap())
            .collect();
        assert_eq!(item_ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_sibling_parents_share_position_counter() {
        let catalog = SchemaCatalog::builder()
            .table("Orders", ["Orders_Id"])
            .table("Order", ["Order_Id", "Orders_Id"])
            .table("Item", ["Item_Id", "Order_Id", "sku"])
            .build();
        let input = b"<Orders>\
            <Order><Item sku=\"A\"/><Item sku=\"B\"/></Order>\
            <Order><Item sku=\"C\"/></Order>\
        </Orders>";
        let (rows, _) = run(&catalog, input).unwrap();

        // First Order's subtree flushes when the second Order opens
        let tables: Vec<_> = rows.iter().map(|r| r.table()).collect();
        assert_eq!(
            tables,
            vec!["Item", "Item", "Order", "Item", "Order", "Orders"]
        );

        // Item ids continue across the two parents; the foreign key tracks
        // whichever Order occurrence was live at creation
        assert_eq!(id(&rows[0], 0), Some(1));
        assert_eq!(id(&rows[1], 0), Some(2));
        assert_eq!(id(&rows[3], 0), Some(3));
        assert_eq!(id(&rows[0], 1), Some(1));
        assert_eq!(id(&rows[3], 1), Some(2));
    }

    #[test]
    fn test_same_table_under_different_parents_gets_own_counter() {
        let catalog = SchemaCatalog::builder()
            .table("Order", ["Order_Id"])
            .table("Box", ["Box_Id"])
            .table("Item", ["Item_Id", "Order_Id", "Box_Id"])
            .build();
        let input = b"<Root>\
            <Order><Item/><Item/></Order>\
            <Box><Item/></Box>\
        </Root>";
        let (rows, _) = run(&catalog, input).unwrap();

        let items: Vec<_> = rows.iter().filter(|r| r.table() == "Item").collect();
        assert_eq!(id(items[0], 0), Some(1));
        assert_eq!(id(items[1], 0), Some(2));
        // Item under Box is a different structural position: fresh counter,
        // linked through Box_Id instead of Order_Id
        assert_eq!(id(items[2], 0), Some(1));
        assert_eq!(items[2].value(1), None);
        assert_eq!(id(items[2], 2), Some(1));
    }

    #[test]
    fn test_deep_chain_links_each_level() {
        let catalog = SchemaCatalog::builder()
            .table("A", ["A_Id"])
            .table("B", ["B_Id", "A_Id"])
            .table("C", ["C_Id", "B_Id"])
            .build();
        let (rows, _) = run(&catalog, b"<A><B><C/></B></A>").unwrap();

        let tables: Vec<_> = rows.iter().map(|r| r.table()).collect();
        assert_eq!(tables, vec!["C", "B", "A"]);
        assert_eq!(id(&rows[0], 1), Some(1)); // C -> B
        assert_eq!(id(&rows[1], 1), Some(1)); // B -> A
    }

    #[test]
    fn test_skipped_level_links_to_nearest_known_ancestor() {
        let catalog = SchemaCatalog::builder()
            .table("Order", ["Order_Id"])
            .table("Item", ["Item_Id", "Order_Id"])
            .build();
        // <Lines> is unknown, so Item's nearest known ancestor is Order
        let (rows, _) = run(&catalog, b"<Order><Lines><Item/></Lines></Order>").unwrap();
        let item = rows.iter().find(|r| r.table() == "Item").unwrap();
        assert_eq!(id(item, 1), Some(1));
    }

    #[test]
    fn test_truncated_document_flushes_nothing_further() {
        let catalog = order_item_catalog();
        let mut sink = CollectSink::new();
        let err = Shredder::new(&catalog)
            .run(
                SliceCursor::new(b"<Order><Item sku=\"A\"/>"),
                &mut [&mut sink],
            )
            .unwrap_err();

        assert!(matches!(
            err,
            ShredError::UnexpectedEndOfDocument { open_rows: 2 }
        ));
        assert!(sink.rows().is_empty());
        assert!(!sink.is_complete());
    }

    #[test]
    fn test_malformed_input_propagates() {
        let catalog = order_item_catalog();
        let mut sink = CollectSink::new();
        let err = Shredder::new(&catalog)
            .run(SliceCursor::new(b"<Order></Wrong>"), &mut [&mut sink])
            .unwrap_err();
        assert!(matches!(err, ShredError::Malformed { .. }));
    }

    #[test]
    fn test_unresolved_attribute_column() {
        let catalog = order_item_catalog();
        let err = run(&catalog, b"<Order><Item color=\"red\"/></Order>").unwrap_err();
        assert!(matches!(
            err,
            ShredError::UnresolvedColumn { ref column, .. } if column == "color"
        ));
    }

    #[test]
    fn test_missing_foreign_key_column() {
        let catalog = SchemaCatalog::builder()
            .table("Order", ["Order_Id"])
            .table("Item", ["Item_Id"])
            .build();
        let err = run(&catalog, b"<Order><Item/></Order>").unwrap_err();
        assert!(matches!(
            err,
            ShredError::UnresolvedColumn { ref column, .. } if column == "Order_Id"
        ));
    }

    #[test]
    fn test_empty_document_completes_empty() {
        let catalog = order_item_catalog();
        let (rows, summary) = run(&catalog, b"").unwrap();
        assert!(rows.is_empty());
        assert_eq!(summary.rows_emitted, 0);
        assert_eq!(summary.max_staged, 0);
    }

    #[test]
    fn test_rerun_is_deterministic() {
        let catalog = order_item_catalog();
        let input = b"<Order><Item sku=\"A\"/><Item sku=\"B\"/></Order>";
        let (first, _) = run(&catalog, input).unwrap();
        let (second, _) = run(&catalog, input).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_staging_stays_bounded_by_live_rows() {
        let catalog = order_item_catalog();
        let input = b"<Order><Item/><Item/><Item/><Item/></Order>";
        let (_, summary) = run(&catalog, input).unwrap();
        // One open Order plus four live Item siblings
        assert_eq!(summary.max_staged, 5);
    }

    #[test]
    fn test_cancellation_aborts_run() {
        let catalog = order_item_catalog();
        let token = CancelToken::new();
        token.cancel();

        let mut sink = CollectSink::new();
        let err = Shredder::new(&catalog)
            .with_cancel_token(token)
            .run(
                SliceCursor::new(b"<Order><Item sku=\"A\"/></Order>"),
                &mut [&mut sink],
            )
            .unwrap_err();
        assert!(matches!(err, ShredError::Cancelled));
        assert!(sink.rows().is_empty());
    }

    #[test]
    fn test_error_reaches_every_sink() {
        struct ErrorProbe {
            saw_error: bool,
        }
        impl RowSink for ErrorProbe {
            fn on_row(&mut self, _row: &crate::flatten::Row) -> ShredResult<()> {
                Ok(())
            }
            fn on_error(&mut self, _error: &ShredError) {
                self.saw_error = true;
            }
        }

        let catalog = order_item_catalog();
        let mut first = ErrorProbe { saw_error: false };
        let mut second = ErrorProbe { saw_error: false };
        Shredder::new(&catalog)
            .run(
                SliceCursor::new(b"<Order><Item/>"),
                &mut [&mut first, &mut second],
            )
            .unwrap_err();
        assert!(first.saw_error);
        assert!(second.saw_error);
    }
}
