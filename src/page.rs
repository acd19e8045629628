//! On-disk value encoding shared by the catalog and B+Tree pages.
//!
//! Everything here is little-endian (spec §6). A [`Value`] round-trips
//! through [`Value::encode`]/[`Value::decode`] to the exact tagged-value
//! layout the file format describes: a one-byte tag, then a type-specific
//! payload (none / 4-byte signed integer / length-prefixed UTF-8 text).

use crate::error::{DbError, DbResult};

/// Default page size in bytes, fixed for the lifetime of a database file.
pub const PAGE_SIZE: usize = 4096;

pub const MAGIC: [u8; 4] = *b"SQLT";

pub const TAG_CATALOG: u8 = 0x01;
pub const TAG_LEAF: u8 = 0x02;
pub const TAG_INTERNAL: u8 = 0x03;

pub const VALUE_NULL: u8 = 0x00;
pub const VALUE_INTEGER: u8 = 0x01;
pub const VALUE_TEXT: u8 = 0x02;

pub const COLTYPE_INTEGER: u8 = 0x01;
pub const COLTYPE_TEXT: u8 = 0x02;

pub const CONSTRAINT_PRIMARY_KEY: u8 = 1 << 0;
pub const CONSTRAINT_NOT_NULL: u8 = 1 << 1;
pub const CONSTRAINT_UNIQUE: u8 = 1 << 2;

/// Tuning constants (spec §3). Kept deliberately small so splits happen
/// early and are observable in tests.
pub const MAX_LEAF_CELLS: usize = 4;
pub const MAX_INTERNAL_KEYS: usize = 4;

/// A stored column value. `Null` carries no payload on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Integer(i32),
    Text(String),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Integer(_) => "INTEGER",
            Value::Text(_) => "TEXT",
        }
    }

    /// Encode this value's tagged-value form, appending to `buf`.
    pub fn encode(&self, buf: &mut Vec<u8>) {
        match self {
            Value::Null => buf.push(VALUE_NULL),
            Value::Integer(n) => {
                buf.push(VALUE_INTEGER);
                buf.extend_from_slice(&n.to_le_bytes());
            }
            Value::Text(s) => {
                buf.push(VALUE_TEXT);
                let bytes = s.as_bytes();
                buf.extend_from_slice(&(bytes.len() as u16).to_le_bytes());
                buf.extend_from_slice(bytes);
            }
        }
    }

    /// Decode a single tagged value starting at `offset`. Returns the value
    /// and the offset of the first byte after it.
    pub fn decode(buf: &[u8], offset: usize) -> DbResult<(Value, usize)> {
        let tag = *buf
            .get(offset)
            .ok_or_else(|| DbError::Format("truncated tagged value".into()))?;
        match tag {
            VALUE_NULL => Ok((Value::Null, offset + 1)),
            VALUE_INTEGER => {
                let bytes = buf
                    .get(offset + 1..offset + 5)
                    .ok_or_else(|| DbError::Format("truncated integer value".into()))?;
                let n = i32::from_le_bytes(bytes.try_into().unwrap());
                Ok((Value::Integer(n), offset + 5))
            }
            VALUE_TEXT => {
                let len_bytes = buf
                    .get(offset + 1..offset + 3)
                    .ok_or_else(|| DbError::Format("truncated text length".into()))?;
                let len = u16::from_le_bytes(len_bytes.try_into().unwrap()) as usize;
                let start = offset + 3;
                let end = start + len;
                let text_bytes = buf
                    .get(start..end)
                    .ok_or_else(|| DbError::Format("truncated text payload".into()))?;
                let s = String::from_utf8(text_bytes.to_vec())
                    .map_err(|_| DbError::Format("invalid UTF-8 in text value".into()))?;
                Ok((Value::Text(s), end))
            }
            other => Err(DbError::Format(format!("unknown value tag {other:#04x}"))),
        }
    }
}

/// Declared column type (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Text,
}

impl ColumnType {
    pub fn to_byte(self) -> u8 {
        match self {
            ColumnType::Integer => COLTYPE_INTEGER,
            ColumnType::Text => COLTYPE_TEXT,
        }
    }

    pub fn from_byte(b: u8) -> DbResult<Self> {
        match b {
            COLTYPE_INTEGER => Ok(ColumnType::Integer),
            COLTYPE_TEXT => Ok(ColumnType::Text),
            other => Err(DbError::Format(format!("unknown column type tag {other:#04x}"))),
        }
    }
}

/// A column definition as stored in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    pub name: String,
    pub data_type: ColumnType,
    pub constraints: u8,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, data_type: ColumnType, constraints: u8) -> Self {
        ColumnDefinition {
            name: name.into(),
            data_type,
            constraints,
        }
    }

    pub fn is_primary_key(&self) -> bool {
        self.constraints & CONSTRAINT_PRIMARY_KEY != 0
    }

    pub fn is_not_null(&self) -> bool {
        self.constraints & CONSTRAINT_NOT_NULL != 0
    }

    #[allow(dead_code)]
    pub fn is_unique(&self) -> bool {
        self.constraints & CONSTRAINT_UNIQUE != 0
    }
}

pub(crate) fn read_u16(buf: &[u8], offset: usize) -> DbResult<u16> {
    let bytes = buf
        .get(offset..offset + 2)
        .ok_or_else(|| DbError::Format("truncated u16 field".into()))?;
    Ok(u16::from_le_bytes(bytes.try_into().unwrap()))
}

pub(crate) fn read_u32(buf: &[u8], offset: usize) -> DbResult<u32> {
    let bytes = buf
        .get(offset..offset + 4)
        .ok_or_else(|| DbError::Format("truncated u32 field".into()))?;
    Ok(u32::from_le_bytes(bytes.try_into().unwrap()))
}

pub(crate) fn read_string(buf: &[u8], offset: usize) -> DbResult<(String, usize)> {
    let len = read_u16(buf, offset)? as usize;
    let start = offset + 2;
    let end = start + len;
    let bytes = buf
        .get(start..end)
        .ok_or_else(|| DbError::Format("truncated string field".into()))?;
    let s = String::from_utf8(bytes.to_vec())
        .map_err(|_| DbError::Format("invalid UTF-8 in string field".into()))?;
    Ok((s, end))
}

pub(crate) fn write_string(buf: &mut Vec<u8>, s: &str) {
    let bytes = s.as_bytes();
    buf.extend_from_slice(&(bytes.len() as u16).to_le_bytes());
    buf.extend_from_slice(bytes);
}
