//! Parsed-statement surface the Executor consumes (spec §4.3, §6).
//!
//! This is intentionally small: the storage core only needs to support
//! `CREATE TABLE`, `INSERT`, and `SELECT`, each carrying exactly the
//! fields §4.3 describes. The lexer/parser front end that produces these
//! values is an external collaborator as far as the storage core's
//! contract is concerned (spec §1).

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    CreateTable(CreateTableStatement),
    Insert(InsertStatement),
    Select(SelectStatement),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Integer,
    Text,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: DataType,
    pub primary_key: bool,
    pub not_null: bool,
    pub unique: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableStatement {
    pub name: String,
    pub columns: Vec<ColumnDef>,
}

/// A literal as it comes off the parser, before conversion to a column's
/// storage type (spec §4.3 step 4).
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Integer(i64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    pub table: String,
    /// `None` means "values are positional, one per declared column".
    pub columns: Option<Vec<String>>,
    pub values: Vec<Literal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: String,
    pub op: Operator,
    pub value: Literal,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectColumn {
    All,
    Named(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    pub table: String,
    pub columns: Vec<SelectColumn>,
    /// A conjunction ("AND"ed together) of simple predicates (spec §4.3).
    pub where_clause: Vec<Predicate>,
}
