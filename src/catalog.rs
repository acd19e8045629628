//! The catalog page: the single page listing every table (spec §4.3, §6).
//!
//! The catalog is loaded once on open and rewritten in full on every
//! change — there is no incremental update format. Table lookup is
//! case-insensitive: callers normalize to lowercase before matching, while
//! the table's original spelling is kept for diagnostics.

use crate::btree::BTree;
use crate::error::{DbError, DbResult};
use crate::page::{self, ColumnDefinition, ColumnType, TAG_CATALOG};
use crate::pager::{Pager, CATALOG_PAGE};

#[derive(Debug, Clone, PartialEq)]
pub struct TableEntry {
    pub name: String,
    pub columns: Vec<ColumnDefinition>,
    pub root_page: u32,
}

impl TableEntry {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let needle = name.to_lowercase();
        self.columns
            .iter()
            .position(|c| c.name.to_lowercase() == needle)
    }

    pub fn primary_key_index(&self) -> Option<usize> {
        self.columns.iter().position(|c| c.is_primary_key())
    }
}

pub struct Catalog {
    tables: Vec<TableEntry>,
}

impl Catalog {
    /// Load the catalog page (page 1) into memory.
    pub fn load(pager: &mut Pager) -> DbResult<Self> {
        let buf = pager.read_page(CATALOG_PAGE)?;
        if buf[0] != TAG_CATALOG {
            return Err(DbError::Format(format!(
                "expected catalog tag, got {:#04x}",
                buf[0]
            )));
        }
        let table_count = page::read_u16(&buf, 1)? as usize;
        let mut tables = Vec::with_capacity(table_count);
        let mut offset = 3;
        for _ in 0..table_count {
            let (name, next) = page::read_string(&buf, offset)?;
            offset = next;
            let col_count = page::read_u16(&buf, offset)? as usize;
            offset += 2;
            let mut columns = Vec::with_capacity(col_count);
            for _ in 0..col_count {
                let (col_name, next) = page::read_string(&buf, offset)?;
                offset = next;
                let data_type = ColumnType::from_byte(buf[offset])?;
                let constraints = buf[offset + 1];
                offset += 2;
                columns.push(ColumnDefinition::new(col_name, data_type, constraints));
            }
            let root_page = page::read_u32(&buf, offset)?;
            offset += 4;
            tables.push(TableEntry {
                name,
                columns,
                root_page,
            });
        }
        Ok(Catalog { tables })
    }

    /// Rewrite the entire catalog page from the in-memory table list.
    pub fn save(&self, pager: &mut Pager) -> DbResult<()> {
        let mut buf = Vec::new();
        buf.push(TAG_CATALOG);
        buf.extend_from_slice(&(self.tables.len() as u16).to_le_bytes());
        for table in &self.tables {
            page::write_string(&mut buf, &table.name);
            buf.extend_from_slice(&(table.columns.len() as u16).to_le_bytes());
            for col in &table.columns {
                page::write_string(&mut buf, &col.name);
                buf.push(col.data_type.to_byte());
                buf.push(col.constraints);
            }
            buf.extend_from_slice(&table.root_page.to_le_bytes());
        }

        let page_size = pager.page_size();
        if buf.len() > page_size {
            return Err(DbError::Format("catalog page overflowed page size".into()));
        }
        buf.resize(page_size, 0);
        pager.write_page(CATALOG_PAGE, &buf)
    }

    pub fn find_table(&self, name: &str) -> Option<&TableEntry> {
        let needle = name.to_lowercase();
        self.tables.iter().find(|t| t.name.to_lowercase() == needle)
    }

    pub fn find_table_mut(&mut self, name: &str) -> Option<&mut TableEntry> {
        let needle = name.to_lowercase();
        self.tables
            .iter_mut()
            .find(|t| t.name.to_lowercase() == needle)
    }

    /// CREATE TABLE: reject duplicate (case-insensitive) names and more
    /// than one PRIMARY KEY column, allocate a fresh tree, then persist.
    pub fn create_table(
        &mut self,
        pager: &mut Pager,
        name: String,
        columns: Vec<ColumnDefinition>,
    ) -> DbResult<()> {
        if self.find_table(&name).is_some() {
            return Err(DbError::TableExists(name));
        }
        let pk_count = columns.iter().filter(|c| c.is_primary_key()).count();
        if pk_count > 1 {
            return Err(DbError::MultiplePrimaryKeys(name));
        }

        let tree = BTree::create(pager)?;
        self.tables.push(TableEntry {
            name,
            columns,
            root_page: tree.root_page(),
        });
        self.save(pager)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{CONSTRAINT_NOT_NULL, CONSTRAINT_PRIMARY_KEY, CONSTRAINT_UNIQUE};
    use crate::pager::Pager;

    fn open_pager() -> (tempfile::TempDir, Pager) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.db");
        let pager = Pager::open(&path, crate::page::PAGE_SIZE as u16).unwrap();
        (dir, pager)
    }

    #[test]
    fn save_then_load_round_trips_tables_columns_and_constraints() {
        let (_dir, mut pager) = open_pager();
        let mut catalog = Catalog::load(&mut pager).unwrap();

        catalog
            .create_table(
                &mut pager,
                "users".into(),
                vec![
                    ColumnDefinition::new("id", ColumnType::Integer, CONSTRAINT_PRIMARY_KEY),
                    ColumnDefinition::new(
                        "name",
                        ColumnType::Text,
                        CONSTRAINT_NOT_NULL | CONSTRAINT_UNIQUE,
                    ),
                ],
            )
            .unwrap();
        catalog
            .create_table(
                &mut pager,
                "logs".into(),
                vec![
                    ColumnDefinition::new("message", ColumnType::Text, 0),
                    ColumnDefinition::new("severity", ColumnType::Integer, CONSTRAINT_NOT_NULL),
                ],
            )
            .unwrap();

        catalog.save(&mut pager).unwrap();
        let reloaded = Catalog::load(&mut pager).unwrap();
        assert_eq!(reloaded.tables, catalog.tables);
        assert_eq!(reloaded.tables.len(), 2);
        assert_eq!(reloaded.find_table("USERS"), catalog.find_table("users"));
        assert_eq!(reloaded.find_table("logs"), catalog.find_table("logs"));
    }
}
