//! Table/column catalog
//!
//! The catalog maps element names to relational tables and attribute names
//! to column ordinals. It is built once before traversal starts and is
//! immutable afterward; the engine treats it as a read-only layout
//! description.
//!
//! Two synthetic column kinds exist beside plain attribute columns, both
//! following the `"<Table>_Id"` naming pattern:
//! - a *self-id* column holding the table's own surrogate key, and
//! - a *foreign-key* column on a nested table referencing the surrogate key
//!   of its immediate ancestor table.
//!
//! Column kinds are inferred at build time from the naming pattern, the way
//! a `DataSet`-style schema reader produces them.

pub mod xsd;

use crate::error::{ShredError, ShredResult};
use std::collections::HashMap;

/// Index of a table within the catalog
pub type TableId = usize;

/// What a column holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Synthetic surrogate key of this table's own rows
    SelfId,
    /// Synthetic reference to the immediate ancestor table's surrogate key
    ForeignKey,
    /// Value of an XML attribute with the same name
    Attribute,
}

/// One column of a table's row layout
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    /// Stable position within the table's row layout
    pub ordinal: usize,
    pub kind: ColumnKind,
}

/// A relational destination table for one element name
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
    by_name: HashMap<String, usize>,
    self_id: Option<usize>,
}

impl Table {
    /// The table name, equal to the element name it receives
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ordered column list
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Ordinal of a column by name
    pub fn column_ordinal(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Ordinal of this table's self-id column, if it has one
    pub fn self_id_ordinal(&self) -> Option<usize> {
        self.self_id
    }
}

/// Immutable mapping from table name to row layout
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    tables: Vec<Table>,
    by_name: HashMap<String, TableId>,
}

impl SchemaCatalog {
    /// Start building a catalog
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    /// Cheap pre-filter: the id of the table receiving this element name,
    /// or None if the name maps to no table
    pub fn table_id(&self, element_name: &[u8]) -> Option<TableId> {
        let name = std::str::from_utf8(element_name).ok()?;
        self.by_name.get(name).copied()
    }

    /// Get a table by id
    pub fn table(&self, id: TableId) -> &Table {
        &self.tables[id]
    }

    /// Ordered column list of a table, failing with `UnknownTable` if the
    /// name has no corresponding table
    pub fn columns_of(&self, table_name: &str) -> ShredResult<&Table> {
        self.by_name
            .get(table_name)
            .map(|&id| &self.tables[id])
            .ok_or_else(|| ShredError::UnknownTable {
                table: table_name.to_string(),
            })
    }

    /// Number of tables
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// True if the catalog has no tables
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Builder collecting table declarations before kind inference
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    tables: Vec<(String, Vec<String>)>,
}

impl CatalogBuilder {
    /// Declare a table with its columns in layout order. Synthetic columns
    /// are declared by name like any other (`"Order_Id"`); their kind is
    /// inferred when the catalog is built.
    pub fn table<N, C, I>(mut self, name: N, columns: I) -> Self
    where
        N: Into<String>,
        C: Into<String>,
        I: IntoIterator<Item = C>,
    {
        self.tables.push((
            name.into(),
            columns.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// Infer column kinds and finish the catalog
    pub fn build(self) -> SchemaCatalog {
        let known: HashMap<String, TableId> = self
            .tables
            .iter()
            .enumerate()
            .map(|(id, (name, _))| (name.clone(), id))
            .collect();

        let tables = self
            .tables
            .into_iter()
            .map(|(name, column_names)| {
                let mut columns = Vec::with_capacity(column_names.len());
                let mut by_name = HashMap::with_capacity(column_names.len());
                let mut self_id = None;

                for (ordinal, column_name) in column_names.into_iter().enumerate() {
                    let kind = infer_kind(&name, &column_name, &known);
                    if kind == ColumnKind::SelfId {
                        self_id = Some(ordinal);
                    }
                    by_name.insert(column_name.clone(), ordinal);
                    columns.push(Column {
                        name: column_name,
                        ordinal,
                        kind,
                    });
                }

                Table {
                    name,
                    columns,
                    by_name,
                    self_id,
                }
            })
            .collect();

        SchemaCatalog {
            tables,
            by_name: known,
        }
    }
}

/// Classify a column: `"<Self>_Id"` is the self-id, `"<OtherTable>_Id"` a
/// foreign key, anything else an attribute column.
fn infer_kind(table: &str, column: &str, known: &HashMap<String, TableId>) -> ColumnKind {
    match column.strip_suffix("_Id") {
        Some(stem) if stem == table => ColumnKind::SelfId,
        Some(stem) if known.contains_key(stem) => ColumnKind::ForeignKey,
        _ => ColumnKind::Attribute,
    }
}

/// Synthetic column name for a table's surrogate key
pub fn id_column_name(table: &str) -> String {
    format!("{table}_Id")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_item_catalog() -> SchemaCatalog {
        SchemaCatalog::builder()
            .table("Order", ["Order_Id"])
            .table("Item", ["Item_Id", "Order_Id", "sku"])
            .build()
    }

    #[test]
    fn test_kind_inference() {
        let catalog = order_item_catalog();
        let item = catalog.columns_of("Item").unwrap();
        let kinds: Vec<_> = item.columns().iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ColumnKind::SelfId,
                ColumnKind::ForeignKey,
                ColumnKind::Attribute
            ]
        );
        assert_eq!(item.self_id_ordinal(), Some(0));
    }

    #[test]
    fn test_ordinals_are_stable() {
        let catalog = order_item_catalog();
        let item = catalog.columns_of("Item").unwrap();
        assert_eq!(item.column_ordinal("sku"), Some(2));
        assert_eq!(item.column_ordinal("Order_Id"), Some(1));
        assert_eq!(item.column_ordinal("missing"), None);
    }

    #[test]
    fn test_unknown_table() {
        let catalog = order_item_catalog();
        let err = catalog.columns_of("Nope").unwrap_err();
        assert!(matches!(err, ShredError::UnknownTable { .. }));
    }

    #[test]
    fn test_prefilter() {
        let catalog = order_item_catalog();
        assert_eq!(catalog.table_id(b"Order"), Some(0));
        assert_eq!(catalog.table_id(b"Unknown"), None);
        assert_eq!(catalog.table_id(b"\xff\xfe"), None);
    }

    #[test]
    fn test_id_suffix_without_known_table_is_attribute() {
        let catalog = SchemaCatalog::builder()
            .table("Part", ["Part_Id", "Vendor_Id"])
            .build();
        let part = catalog.columns_of("Part").unwrap();
        // Vendor is not a declared table, so Vendor_Id is data, not linkage
        assert_eq!(part.columns()[1].kind, ColumnKind::Attribute);
    }
}
