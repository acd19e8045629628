//! Facade tying the Pager, Catalog, and executor together into one handle.

use std::path::Path;

use crate::ast::Statement;
use crate::catalog::Catalog;
use crate::error::DbResult;
use crate::executor::{self, ExecResult};
use crate::pager::Pager;

pub struct Database {
    pager: Pager,
    catalog: Catalog,
}

impl Database {
    /// Open (or create) the database file at `path`. `page_size` is only
    /// honored when the file does not already exist; an existing file keeps
    /// the page size recorded in its header.
    pub fn open<P: AsRef<Path>>(path: P, page_size: u16) -> DbResult<Self> {
        let mut pager = Pager::open(path, page_size)?;
        let catalog = Catalog::load(&mut pager)?;
        Ok(Database { pager, catalog })
    }

    pub fn execute(&mut self, statement: Statement) -> DbResult<ExecResult> {
        executor::execute(&mut self.pager, &mut self.catalog, statement)
    }

    pub fn close(self) -> DbResult<()> {
        self.pager.close()
    }
}
