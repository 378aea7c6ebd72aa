//! Compare-and-swap on a single attribute.

use sandpool_store::{Condition, Key, Record, RecordStore, StoreError, TableSpec, Update};
use tracing::debug;

use crate::{DbError, StatusTransitionError};

/// One guarded attribute change, issued as a single conditional update.
///
/// The condition is `attribute == from` (or `attribute` absent when `from`
/// is `None`); `attribute` becomes `to` and every attribute in `touched` is
/// set to the write time, all in the same write.
pub(crate) struct Transition<'a> {
    pub(crate) entity: &'static str,
    pub(crate) label: &'static str,
    pub(crate) target: String,
    pub(crate) field: &'static str,
    pub(crate) attribute: &'static str,
    pub(crate) from: Option<&'a str>,
    pub(crate) to: &'a str,
    pub(crate) touched: &'a [&'static str],
}

impl Transition<'_> {
    pub(crate) fn apply(
        self,
        store: &dyn RecordStore,
        table: &TableSpec,
        key: &Key,
        now: i64,
    ) -> Result<Record, DbError> {
        let condition = match self.from {
            Some(from) => Condition::equals(self.attribute, from),
            None => Condition::exists().and_missing(self.attribute),
        };
        let update = self
            .touched
            .iter()
            .fold(Update::new().set(self.attribute, self.to), |update, field| {
                update.set(*field, now)
            });

        match store.update(table, key, &update, Some(&condition)) {
            Ok(record) => {
                debug!(
                    table = table.name(),
                    key = %key,
                    attribute = self.attribute,
                    from = self.from,
                    to = self.to,
                    "transition applied"
                );
                Ok(record)
            }
            Err(StoreError::ConditionFailed { .. }) => Err(StatusTransitionError {
                entity: self.entity,
                label: self.label,
                target: self.target,
                field: self.field,
                from: self.from.map(str::to_owned),
                to: self.to.to_owned(),
            }
            .into()),
            Err(err) => Err(err.into()),
        }
    }
}
