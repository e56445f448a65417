//! Statement model and PostgreSQL rendering.
//!
//! Identifiers in a statement always come from catalog descriptors; request
//! input only ever reaches the store as bound parameters.

use std::fmt;

use crate::binding::ChangeSet;
use crate::error::{ExplorerError, ExplorerResult};
use crate::field::{FieldDescriptor, FieldKind};
use crate::page::Page;
use crate::table::TableDescriptor;
use crate::value::{Identifier, Value};

/// A column reference with the kind it is read or written as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub kind: FieldKind,
}

impl From<&FieldDescriptor> for Column {
    fn from(field: &FieldDescriptor) -> Self {
        Self {
            name: field.name().to_string(),
            kind: field.kind(),
        }
    }
}

/// A bound parameter in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub kind: FieldKind,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub table: String,
    pub columns: Vec<Column>,
    pub key: Column,
    /// Restrict to one row by primary key
    pub filter: Option<Identifier>,
    /// Ordered, windowed scan
    pub page: Option<Page>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub table: String,
    pub columns: Vec<Column>,
    pub values: Vec<Value>,
    /// Auto-increment key to hand back
    pub returning: Option<Column>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub table: String,
    pub columns: Vec<Column>,
    pub values: Vec<Value>,
    pub key: Column,
    pub id: Identifier,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    pub table: String,
    pub key: Column,
    pub id: Identifier,
}

/// One SQL statement against a catalog table.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(Select),
    Insert(Insert),
    Update(Update),
    Delete(Delete),
}

impl Statement {
    /// All fields, ascending by primary key, windowed by `page`.
    pub fn list(table: &TableDescriptor, page: Page) -> Self {
        Statement::Select(Select {
            table: table.name().to_string(),
            columns: all_columns(table),
            key: table.primary_key().into(),
            filter: None,
            page: Some(page),
        })
    }

    /// All fields of the row whose primary key is `id`.
    pub fn get(table: &TableDescriptor, id: Identifier) -> Self {
        Statement::Select(Select {
            table: table.name().to_string(),
            columns: all_columns(table),
            key: table.primary_key().into(),
            filter: Some(id),
            page: None,
        })
    }

    pub fn delete(table: &TableDescriptor, id: Identifier) -> Self {
        Statement::Delete(Delete {
            table: table.name().to_string(),
            key: table.primary_key().into(),
            id,
        })
    }

    /// Insert exactly the fields in `changes`.
    ///
    /// Auto-increment keys may not be supplied; they are returned instead.
    pub fn insert(table: &TableDescriptor, changes: &ChangeSet) -> ExplorerResult<Self> {
        let columns = bound_columns(table, changes, |field| field.is_auto_increment())?;
        let key = table.primary_key();
        Ok(Statement::Insert(Insert {
            table: table.name().to_string(),
            columns,
            values: changes.values().to_vec(),
            returning: key.is_auto_increment().then(|| key.into()),
        }))
    }

    /// Set the fields in `changes` on the row whose primary key is `id`.
    ///
    /// `changes` must be non-empty and may not contain the primary key.
    pub fn update(
        table: &TableDescriptor,
        id: Identifier,
        changes: &ChangeSet,
    ) -> ExplorerResult<Self> {
        debug_assert!(!changes.is_empty(), "update needs at least one field");
        let columns = bound_columns(table, changes, |field| field.is_primary_key())?;
        Ok(Statement::Update(Update {
            table: table.name().to_string(),
            columns,
            values: changes.values().to_vec(),
            key: table.primary_key().into(),
            id,
        }))
    }

    pub fn table(&self) -> &str {
        match self {
            Statement::Select(s) => &s.table,
            Statement::Insert(s) => &s.table,
            Statement::Update(s) => &s.table,
            Statement::Delete(s) => &s.table,
        }
    }

    /// Columns of each result row, in order.
    pub fn result_columns(&self) -> Vec<Column> {
        match self {
            Statement::Select(s) => s.columns.clone(),
            Statement::Insert(s) => s.returning.iter().cloned().collect(),
            Statement::Update(_) | Statement::Delete(_) => Vec::new(),
        }
    }

    /// Parameters in placeholder order.
    pub fn params(&self) -> Vec<Param> {
        let id_param = |id: Identifier| Param {
            kind: FieldKind::Integer,
            value: Value::Integer(id.get()),
        };
        match self {
            Statement::Select(s) => {
                let mut params = Vec::new();
                if let Some(id) = s.filter {
                    params.push(id_param(id));
                }
                if let Some(page) = s.page {
                    params.push(Param {
                        kind: FieldKind::Integer,
                        value: Value::Integer(i64::from(page.limit())),
                    });
                    params.push(Param {
                        kind: FieldKind::Integer,
                        value: Value::Integer(i64::from(page.offset())),
                    });
                }
                params
            }
            Statement::Insert(s) => bound_params(&s.columns, &s.values),
            Statement::Update(s) => {
                let mut params = bound_params(&s.columns, &s.values);
                params.push(id_param(s.id));
                params
            }
            Statement::Delete(s) => vec![id_param(s.id)],
        }
    }

    /// Render the statement as PostgreSQL text with `$n` placeholders.
    pub fn sql(&self) -> String {
        let mut placeholders = Placeholders::default();
        match self {
            Statement::Select(s) => {
                let mut sql = format!(
                    "SELECT {} FROM {}",
                    select_list(&s.columns),
                    quote_ident(&s.table)
                );
                if s.filter.is_some() {
                    sql.push_str(&format!(
                        " WHERE {} = {}",
                        quote_ident(&s.key.name),
                        placeholders.next(FieldKind::Integer)
                    ));
                }
                if s.page.is_some() {
                    sql.push_str(&format!(
                        " ORDER BY {} ASC LIMIT {} OFFSET {}",
                        quote_ident(&s.key.name),
                        placeholders.next(FieldKind::Integer),
                        placeholders.next(FieldKind::Integer)
                    ));
                }
                sql
            }
            Statement::Insert(s) => {
                let mut sql = if s.columns.is_empty() {
                    format!("INSERT INTO {} DEFAULT VALUES", quote_ident(&s.table))
                } else {
                    let names: Vec<String> = s.columns.iter().map(|c| quote_ident(&c.name)).collect();
                    let values: Vec<String> =
                        s.columns.iter().map(|c| placeholders.next(c.kind)).collect();
                    format!(
                        "INSERT INTO {} ({}) VALUES ({})",
                        quote_ident(&s.table),
                        names.join(", "),
                        values.join(", ")
                    )
                };
                if let Some(key) = &s.returning {
                    sql.push_str(&format!(" RETURNING {}", cast_column(key)));
                }
                sql
            }
            Statement::Update(s) => {
                let assignments: Vec<String> = s
                    .columns
                    .iter()
                    .map(|c| format!("{} = {}", quote_ident(&c.name), placeholders.next(c.kind)))
                    .collect();
                format!(
                    "UPDATE {} SET {} WHERE {} = {}",
                    quote_ident(&s.table),
                    assignments.join(", "),
                    quote_ident(&s.key.name),
                    placeholders.next(FieldKind::Integer)
                )
            }
            Statement::Delete(s) => format!(
                "DELETE FROM {} WHERE {} = {}",
                quote_ident(&s.table),
                quote_ident(&s.key.name),
                placeholders.next(FieldKind::Integer)
            ),
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql())
    }
}

/// Quote an identifier, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Canonical PostgreSQL type each kind is read and bound as.
pub fn pg_type(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Integer => "int8",
        FieldKind::Text => "text",
        FieldKind::Float64 => "float8",
    }
}

#[derive(Default)]
struct Placeholders(usize);

impl Placeholders {
    fn next(&mut self, kind: FieldKind) -> String {
        self.0 += 1;
        format!("${}::{}", self.0, pg_type(kind))
    }
}

fn cast_column(column: &Column) -> String {
    let name = quote_ident(&column.name);
    format!("{}::{} AS {}", name, pg_type(column.kind), name)
}

fn select_list(columns: &[Column]) -> String {
    columns.iter().map(cast_column).collect::<Vec<_>>().join(", ")
}

fn all_columns(table: &TableDescriptor) -> Vec<Column> {
    table.fields().iter().map(Column::from).collect()
}

fn bound_params(columns: &[Column], values: &[Value]) -> Vec<Param> {
    columns
        .iter()
        .zip(values)
        .map(|(c, v)| Param {
            kind: c.kind,
            value: v.clone(),
        })
        .collect()
}

/// Resolve change-set names against the table, rejecting unknown names,
/// `forbidden` fields and values of the wrong kind.
fn bound_columns(
    table: &TableDescriptor,
    changes: &ChangeSet,
    forbidden: impl Fn(&FieldDescriptor) -> bool,
) -> ExplorerResult<Vec<Column>> {
    changes
        .iter()
        .map(|(name, value)| {
            let field = table.field(name).ok_or_else(|| ExplorerError::UnknownField {
                field: name.to_string(),
            })?;
            if forbidden(field) || !value.fits(field.kind()) {
                return Err(ExplorerError::invalid_field_type(name));
            }
            if value.is_null() && !field.is_nullable() {
                return Err(ExplorerError::invalid_field_type(name));
            }
            Ok(Column::from(field))
        })
        .collect()
}
