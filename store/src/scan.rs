use std::collections::VecDeque;

use crate::{Key, Record, RecordStore, StoreError, TableSpec};

/// One page request: resume strictly after `exclusive_start_key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub exclusive_start_key: Option<Key>,
    pub limit: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanPage {
    pub records: Vec<Record>,
    /// Present when more records may follow; feed it back as the next start key.
    pub last_evaluated_key: Option<Key>,
}

/// Lazy full-table scan that drains `scan_page` one page at a time.
///
/// Finite, and independent per call: a new `Scan` starts from the first key.
pub struct Scan<'a, S: ?Sized> {
    store: &'a S,
    table: &'a TableSpec,
    page_size: usize,
    next_start: Option<Key>,
    buffer: VecDeque<Record>,
    exhausted: bool,
}

impl<'a, S: RecordStore + ?Sized> Scan<'a, S> {
    pub(crate) fn new(store: &'a S, table: &'a TableSpec, page_size: usize) -> Self {
        Self {
            store,
            table,
            page_size: page_size.max(1),
            next_start: None,
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }

    fn fetch_page(&mut self) -> Result<(), StoreError> {
        let request = ScanRequest {
            exclusive_start_key: self.next_start.take(),
            limit: self.page_size,
        };
        let page = self.store.scan_page(self.table, &request)?;
        self.buffer.extend(page.records);
        self.next_start = page.last_evaluated_key;
        self.exhausted = self.next_start.is_none();
        Ok(())
    }
}

impl<S: RecordStore + ?Sized> Iterator for Scan<'_, S> {
    type Item = Result<Record, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.buffer.pop_front() {
                return Some(Ok(record));
            }
            if self.exhausted {
                return None;
            }
            if let Err(err) = self.fetch_page() {
                self.exhausted = true;
                return Some(Err(err));
            }
        }
    }
}

/// Convenience methods available on every store, including trait objects.
pub trait RecordStoreExt: RecordStore {
    fn scan_all<'a>(&'a self, table: &'a TableSpec, page_size: usize) -> Scan<'a, Self> {
        Scan::new(self, table, page_size)
    }
}

impl<S: RecordStore + ?Sized> RecordStoreExt for S {}
