//! Thin execution glue: turns a parsed [`Statement`] into page-level
//! operations against the Pager/Catalog/B+Tree (spec §4.3).

use std::cmp::Ordering;

use crate::ast::{
    ColumnDef, CreateTableStatement, InsertStatement, Literal, Operator, SelectColumn,
    SelectStatement, Statement,
};
use crate::btree::BTree;
use crate::catalog::Catalog;
use crate::error::{DbError, DbResult};
use crate::page::{
    ColumnDefinition, ColumnType, Value, CONSTRAINT_NOT_NULL, CONSTRAINT_PRIMARY_KEY,
    CONSTRAINT_UNIQUE,
};
use crate::pager::Pager;

/// Result of executing one statement (spec §6): a message alone for DDL/DML,
/// or a message plus a projected result set for SELECT.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecResult {
    Message(String),
    Rows {
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
        message: String,
    },
}

pub fn execute(pager: &mut Pager, catalog: &mut Catalog, statement: Statement) -> DbResult<ExecResult> {
    match statement {
        Statement::CreateTable(stmt) => execute_create_table(pager, catalog, stmt),
        Statement::Insert(stmt) => execute_insert(pager, catalog, stmt),
        Statement::Select(stmt) => execute_select(pager, catalog, stmt),
    }
}

fn to_storage_column(col: &ColumnDef) -> ColumnDefinition {
    let mut constraints = 0u8;
    if col.primary_key {
        constraints |= CONSTRAINT_PRIMARY_KEY;
    }
    if col.not_null {
        constraints |= CONSTRAINT_NOT_NULL;
    }
    if col.unique {
        constraints |= CONSTRAINT_UNIQUE;
    }
    let data_type = match col.data_type {
        crate::ast::DataType::Integer => ColumnType::Integer,
        crate::ast::DataType::Text => ColumnType::Text,
    };
    ColumnDefinition::new(col.name.clone(), data_type, constraints)
}

fn execute_create_table(
    pager: &mut Pager,
    catalog: &mut Catalog,
    stmt: CreateTableStatement,
) -> DbResult<ExecResult> {
    let columns: Vec<ColumnDefinition> = stmt.columns.iter().map(to_storage_column).collect();
    catalog.create_table(pager, stmt.name.clone(), columns)?;
    log::info!("created table '{}'", stmt.name);
    Ok(ExecResult::Message(format!("Table '{}' created", stmt.name)))
}

fn convert_literal(literal: &Literal, column: &ColumnDefinition) -> DbResult<Value> {
    if matches!(literal, Literal::Null) {
        return Ok(Value::Null);
    }
    match column.data_type {
        ColumnType::Integer => match literal {
            Literal::Integer(n) => i32::try_from(*n)
                .map(Value::Integer)
                .map_err(|_| DbError::Conversion {
                    column: column.name.clone(),
                    reason: format!("{n} does not fit in a 32-bit integer"),
                }),
            Literal::Text(s) => s
                .trim()
                .parse::<i32>()
                .map(Value::Integer)
                .map_err(|_| DbError::Conversion {
                    column: column.name.clone(),
                    reason: format!("'{s}' is not a whole integer"),
                }),
            Literal::Null => unreachable!(),
        },
        ColumnType::Text => match literal {
            Literal::Text(s) => Ok(Value::Text(s.clone())),
            Literal::Integer(n) => Ok(Value::Text(n.to_string())),
            Literal::Null => unreachable!(),
        },
    }
}

fn execute_insert(pager: &mut Pager, catalog: &mut Catalog, stmt: InsertStatement) -> DbResult<ExecResult> {
    let table_name = stmt.table.clone();
    let (columns, root_page, pk_index) = {
        let entry = catalog
            .find_table(&table_name)
            .ok_or_else(|| DbError::TableNotFound(table_name.clone()))?;
        (entry.columns.clone(), entry.root_page, entry.primary_key_index())
    };

    let provided_names: Vec<String> = match &stmt.columns {
        Some(names) => names.clone(),
        None => columns.iter().map(|c| c.name.clone()).collect(),
    };
    if provided_names.len() != stmt.values.len() {
        return Err(DbError::Arity {
            expected: provided_names.len(),
            got: stmt.values.len(),
        });
    }

    let mut row: Vec<Value> = vec![Value::Null; columns.len()];
    for (name, literal) in provided_names.iter().zip(stmt.values.iter()) {
        let idx = columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| DbError::ColumnNotFound(name.clone()))?;
        row[idx] = convert_literal(literal, &columns[idx])?;
    }

    for (idx, col) in columns.iter().enumerate() {
        if col.is_not_null() && row[idx] == Value::Null {
            return Err(DbError::NotNull(col.name.clone()));
        }
    }

    let mut tree = BTree::open(root_page);
    let key = match pk_index {
        Some(idx) => match row[idx] {
            Value::Integer(n) if n >= 0 => n as u32,
            _ => return Err(DbError::PrimaryKeyNotInteger(columns[idx].name.clone())),
        },
        None => {
            let existing = tree.scan(pager)?;
            existing.iter().map(|(k, _)| *k).max().map(|m| m + 1).unwrap_or(1)
        }
    };

    tree.insert(pager, key, row).map_err(|e| match e {
        DbError::DuplicateKey(k) if pk_index.is_some() => DbError::DuplicatePrimaryKey(k as i64),
        other => other,
    })?;

    if tree.root_page() != root_page {
        let entry = catalog
            .find_table_mut(&table_name)
            .expect("table resolved moments ago must still exist");
        entry.root_page = tree.root_page();
        catalog.save(pager)?;
        log::debug!("root of '{table_name}' moved to page {}", tree.root_page());
    }

    log::info!("inserted 1 row into '{table_name}'");
    Ok(ExecResult::Message(format!("1 row inserted into '{table_name}'")))
}

fn apply_op(ordering: Ordering, op: Operator) -> bool {
    match op {
        Operator::Eq => ordering == Ordering::Equal,
        Operator::Ne => ordering != Ordering::Equal,
        Operator::Lt => ordering == Ordering::Less,
        Operator::Le => ordering != Ordering::Greater,
        Operator::Gt => ordering == Ordering::Greater,
        Operator::Ge => ordering != Ordering::Less,
    }
}

/// NULL on the left never matches (spec §4.3 step 4, §8). Mixed-type
/// comparisons use the column's own storage type to decide whether to
/// compare numerically or lexicographically (SPEC_FULL.md §D.1); a literal
/// that cannot be coerced into that shape makes the predicate false rather
/// than erroring the whole query.
fn evaluate_predicate(stored: &Value, op: Operator, literal: &Literal) -> bool {
    match stored {
        Value::Null => false,
        Value::Integer(n) => {
            let other = match literal {
                Literal::Integer(m) => Some(*m),
                Literal::Text(s) => s.trim().parse::<i64>().ok(),
                Literal::Null => None,
            };
            match other {
                Some(m) => apply_op((*n as i64).cmp(&m), op),
                None => false,
            }
        }
        Value::Text(s) => {
            let other = match literal {
                Literal::Text(t) => Some(t.clone()),
                Literal::Integer(m) => Some(m.to_string()),
                Literal::Null => None,
            };
            match other {
                Some(t) => apply_op(s.as_str().cmp(t.as_str()), op),
                None => false,
            }
        }
    }
}

fn execute_select(pager: &mut Pager, catalog: &Catalog, stmt: SelectStatement) -> DbResult<ExecResult> {
    let entry = catalog
        .find_table(&stmt.table)
        .ok_or_else(|| DbError::TableNotFound(stmt.table.clone()))?;

    let projects_all = stmt.columns.iter().any(|c| matches!(c, SelectColumn::All));
    let proj_indices: Vec<usize> = if projects_all {
        (0..entry.columns.len()).collect()
    } else {
        stmt.columns
            .iter()
            .map(|c| match c {
                SelectColumn::Named(name) => entry
                    .column_index(name)
                    .ok_or_else(|| DbError::ColumnNotFound(name.clone())),
                SelectColumn::All => unreachable!(),
            })
            .collect::<DbResult<Vec<_>>>()?
    };

    let mut predicates = Vec::with_capacity(stmt.where_clause.len());
    for pred in &stmt.where_clause {
        let idx = entry
            .column_index(&pred.column)
            .ok_or_else(|| DbError::ColumnNotFound(pred.column.clone()))?;
        predicates.push((idx, pred.op, &pred.value));
    }

    let tree = BTree::open(entry.root_page);
    let all_rows = tree.scan(pager)?;

    let mut out_rows = Vec::new();
    for (_key, row) in &all_rows {
        let matches = predicates
            .iter()
            .all(|(idx, op, literal)| evaluate_predicate(&row[*idx], *op, literal));
        if matches {
            out_rows.push(proj_indices.iter().map(|&i| row[i].clone()).collect());
        }
    }

    let columns: Vec<String> = proj_indices
        .iter()
        .map(|&i| entry.columns[i].name.clone())
        .collect();
    let message = format!("{} row(s)", out_rows.len());
    log::info!("selected {} row(s) from '{}'", out_rows.len(), stmt.table);
    Ok(ExecResult::Rows {
        columns,
        rows: out_rows,
        message,
    })
}
