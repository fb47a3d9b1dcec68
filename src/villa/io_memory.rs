// A spreadsheet service kept in memory, with the same lookup rules as the remote one.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use log::debug;
use snafu::prelude::*;

use villa_survey::{records_from_rows, CellValue, Record};

use crate::villa::client::{Connector, Spreadsheet, Spreadsheets, Worksheet};
use crate::villa::credentials::CredentialBundle;
use crate::villa::*;

type Rows = Vec<Vec<CellValue>>;

#[derive(Default)]
pub struct MemorySheets {
    books: RefCell<BTreeMap<String, BTreeMap<String, Rows>>>,
    connects: Cell<usize>,
    reject: Cell<bool>,
}

impl MemorySheets {
    pub fn new() -> Rc<MemorySheets> {
        Rc::new(MemorySheets::default())
    }

    /// Creates a worksheet (and its spreadsheet if needed) holding only a header row.
    pub fn add_worksheet(&self, url: &str, title: &str, headers: &[&str]) {
        let header: Vec<CellValue> = headers.iter().map(|h| CellValue::from(*h)).collect();
        self.books
            .borrow_mut()
            .entry(url.to_string())
            .or_default()
            .insert(title.to_string(), vec![header]);
    }

    /// All the rows of a worksheet, header included.
    pub fn rows(&self, url: &str, title: &str) -> Rows {
        self.books
            .borrow()
            .get(url)
            .and_then(|b| b.get(title))
            .cloned()
            .unwrap_or_default()
    }

    /// The number of connection attempts, successful or not.
    pub fn connect_count(&self) -> usize {
        self.connects.get()
    }

    /// When set, connections fail as if the credentials were refused.
    pub fn reject_connections(&self, reject: bool) {
        self.reject.set(reject);
    }
}

pub struct MemoryConnector {
    sheets: Rc<MemorySheets>,
}

impl MemoryConnector {
    pub fn new(sheets: Rc<MemorySheets>) -> MemoryConnector {
        MemoryConnector { sheets }
    }
}

impl Connector for MemoryConnector {
    fn connect(&self, credentials: &CredentialBundle) -> SheetResult<Rc<dyn Spreadsheets>> {
        self.sheets.connects.set(self.sheets.connects.get() + 1);
        if self.sheets.reject.get() {
            return TokenRejectedSnafu {
                token_uri: credentials.token_uri.clone(),
                status: 400_u16,
                body: "invalid_grant",
            }
            .fail();
        }
        let client: Rc<dyn Spreadsheets> = self.sheets.clone();
        Ok(client)
    }
}

impl Spreadsheets for MemorySheets {
    fn open_by_url(&self, url: &str) -> SheetResult<Box<dyn Spreadsheet + '_>> {
        ensure!(
            self.books.borrow().contains_key(url),
            SpreadsheetNotFoundSnafu { url }
        );
        Ok(Box::new(MemorySpreadsheet {
            sheets: self,
            url: url.to_string(),
        }))
    }
}

struct MemorySpreadsheet<'a> {
    sheets: &'a MemorySheets,
    url: String,
}

impl<'a> Spreadsheet for MemorySpreadsheet<'a> {
    fn worksheet(&self, title: &str) -> SheetResult<Box<dyn Worksheet + '_>> {
        let exists = self
            .sheets
            .books
            .borrow()
            .get(&self.url)
            .map(|b| b.contains_key(title))
            .unwrap_or(false);
        ensure!(exists, WorksheetNotFoundSnafu { title });
        Ok(Box::new(MemoryWorksheet {
            sheets: self.sheets,
            url: self.url.clone(),
            title: title.to_string(),
        }))
    }
}

struct MemoryWorksheet<'a> {
    sheets: &'a MemorySheets,
    url: String,
    title: String,
}

impl<'a> Worksheet for MemoryWorksheet<'a> {
    fn all_records(&self) -> SheetResult<Vec<Record>> {
        Ok(records_from_rows(&self.sheets.rows(&self.url, &self.title)))
    }

    fn row_values(&self, row: usize) -> SheetResult<Vec<String>> {
        let rows = self.sheets.rows(&self.url, &self.title);
        Ok(row
            .checked_sub(1)
            .and_then(|idx| rows.get(idx))
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .unwrap_or_default())
    }

    fn append_row(&self, values: &[CellValue]) -> SheetResult<()> {
        debug!("MemoryWorksheet::append_row: {:?} <- {:?}", self.title, values);
        let mut books = self.sheets.books.borrow_mut();
        let rows = books
            .get_mut(&self.url)
            .and_then(|b| b.get_mut(&self.title))
            .context(WorksheetNotFoundSnafu {
                title: self.title.clone(),
            })?;
        rows.push(values.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "memory://villa";

    #[test]
    fn lookups_follow_the_remote_rules() {
        let sheets = MemorySheets::new();
        sheets.add_worksheet(URL, "Participants", &["Name", "Age"]);

        assert!(matches!(
            sheets.open_by_url("memory://elsewhere").err(),
            Some(SheetError::SpreadsheetNotFound { .. })
        ));
        let book = sheets.open_by_url(URL).unwrap();
        assert!(matches!(
            book.worksheet("Sheet1").err(),
            Some(SheetError::WorksheetNotFound { .. })
        ));

        let tab = book.worksheet("Participants").unwrap();
        assert_eq!(tab.row_values(1).unwrap(), vec!["Name", "Age"]);
        assert!(tab.row_values(0).unwrap().is_empty());
        tab.append_row(&[CellValue::from("Alex"), CellValue::Int(27)])
            .unwrap();
        let records = tab.all_records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("Age"), Some(&CellValue::Int(27)));
    }
}
