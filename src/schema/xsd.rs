//! Pragmatic XSD-subset catalog compiler
//!
//! Derives a [`SchemaCatalog`] from an XML Schema document the way a
//! `DataSet`-style schema reader does: one table per named `xs:element`,
//! one attribute column per `xs:attribute`, a synthetic `"<Table>_Id"`
//! self-id on every table and a `"<Parent>_Id"` foreign key on nested
//! tables.
//!
//! This is catalog *acquisition*, not schema validation: unsupported XSD
//! constructs (type references, groups, restrictions, imports) are skipped
//! without error.

use super::{id_column_name, SchemaCatalog};
use crate::cursor::{CursorStep, DocumentCursor, SliceCursor};
use crate::error::ShredResult;
use memchr::memchr;

/// Column layout: self-id first, then the foreign key, then declared
/// attributes in document order.
#[derive(Debug)]
struct TableDecl {
    name: String,
    parent: Option<usize>,
    attributes: Vec<String>,
}

/// Compile an XSD document held in memory into a catalog.
pub fn compile_xsd(input: &[u8]) -> ShredResult<SchemaCatalog> {
    let mut cursor = SliceCursor::new(input);
    let mut decls: Vec<TableDecl> = Vec::new();
    // Named xs:element declarations currently enclosing the cursor,
    // as (document depth, index into decls)
    let mut enclosing: Vec<(usize, usize)> = Vec::new();

    loop {
        match cursor.next_step()? {
            CursorStep::Open {
                name,
                depth,
                attributes,
            } => {
                while matches!(enclosing.last(), Some(&(d, _)) if d >= depth) {
                    enclosing.pop();
                }

                let declared = attributes
                    .iter()
                    .find(|a| a.name == b"name")
                    .and_then(|a| a.value_str())
                    .map(str::to_string);

                match (local_name(name), declared) {
                    (b"element", Some(element_name)) => {
                        // Re-declarations of the same element name merge
                        // into the first table
                        let idx = match decls.iter().position(|d| d.name == element_name) {
                            Some(idx) => idx,
                            None => {
                                decls.push(TableDecl {
                                    name: element_name,
                                    parent: enclosing.last().map(|&(_, idx)| idx),
                                    attributes: Vec::new(),
                                });
                                decls.len() - 1
                            }
                        };
                        enclosing.push((depth, idx));
                    }
                    (b"attribute", Some(attr_name)) => {
                        if let Some(&(_, idx)) = enclosing.last() {
                            if !decls[idx].attributes.contains(&attr_name) {
                                decls[idx].attributes.push(attr_name);
                            }
                        }
                    }
                    _ => {}
                }
            }
            CursorStep::EndOfDocument { .. } => break,
        }
    }

    let mut builder = SchemaCatalog::builder();
    for decl in &decls {
        let mut columns = Vec::with_capacity(decl.attributes.len() + 2);
        columns.push(id_column_name(&decl.name));
        if let Some(parent) = decl.parent {
            columns.push(id_column_name(&decls[parent].name));
        }
        columns.extend(decl.attributes.iter().cloned());
        builder = builder.table(decl.name.clone(), columns);
    }
    Ok(builder.build())
}

/// Local part of a possibly prefixed name
fn local_name(name: &[u8]) -> &[u8] {
    match memchr(b':', name) {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}
