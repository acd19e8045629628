//! A small single-file relational database: a paged B+Tree storage core
//! plus thin CREATE TABLE / INSERT / SELECT execution glue (spec §1).

pub mod ast;
pub mod btree;
pub mod catalog;
pub mod database;
pub mod error;
pub mod executor;
pub mod lexer;
pub mod page;
pub mod pager;
pub mod parser;

pub use database::Database;
pub use error::{DbError, DbResult};

/// Tokenize, parse, and execute one SQL statement against `db`.
pub fn process_query(db: &mut Database, query: &str) -> DbResult<executor::ExecResult> {
    let tokens = lexer::tokenize(query).map_err(DbError::Parse)?;
    let statement = parser::parse(tokens).map_err(DbError::Parse)?;
    db.execute(statement)
}
