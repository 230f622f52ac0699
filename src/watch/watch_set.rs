use std::sync::Arc;

use tracing::debug;

use crate::Field;
use crate::FieldError;
use crate::FieldResolver;
use crate::Result;
use crate::WatchEntry;

/// A bound field together with the value it had when last saved
pub struct WatchedField {
    pub(crate) key: String,
    pub(crate) field: Arc<dyn Field>,
    pub(crate) snapshot: Option<String>,
}

impl WatchedField {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn snapshot(&self) -> Option<&str> {
        self.snapshot.as_deref()
    }

    /// Live value as reported by the host
    pub fn current(&self) -> Option<String> {
        self.field.read()
    }

    pub fn is_changed(&self) -> bool {
        self.field.read() != self.snapshot
    }
}

impl std::fmt::Debug for WatchedField {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("WatchedField")
            .field("key", &self.key)
            .field("snapshot", &self.snapshot)
            .finish()
    }
}

/// Last submitted value of every watched field, in watch list order.
///
/// Snapshots are written at bind time and after a successful submission, never
/// on a failed one.
#[derive(Debug, Default)]
pub struct WatchSet {
    fields: Vec<WatchedField>,
}

impl WatchSet {
    /// Resolves every locator and records the current values as baseline
    pub fn bind(
        entries: &[WatchEntry],
        resolver: &dyn FieldResolver,
    ) -> Result<Self> {
        let mut fields = Vec::with_capacity(entries.len());

        for entry in entries {
            let field = resolver.resolve(&entry.key, &entry.locator).map_err(|e| {
                debug!("resolve {} -> {} failed: {:?}", entry.key, entry.locator, e);
                FieldError::Unresolved {
                    key: entry.key.clone(),
                    locator: entry.locator.clone(),
                }
            })?;
            let snapshot = field.read();
            fields.push(WatchedField {
                key: entry.key.clone(),
                field,
                snapshot,
            });
        }

        Ok(Self { fields })
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WatchedField> {
        self.fields.iter()
    }

    pub fn get(
        &self,
        key: &str,
    ) -> Option<&WatchedField> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// `None` for an unknown key, `Some(None)` for a field saved without value
    pub fn snapshot(
        &self,
        key: &str,
    ) -> Option<Option<&str>> {
        self.get(key).map(|f| f.snapshot.as_deref())
    }

    /// Returns false when `key` is not watched
    pub fn update_snapshot(
        &mut self,
        key: &str,
        value: Option<String>,
    ) -> bool {
        match self.fields.iter_mut().find(|f| f.key == key) {
            Some(watched) => {
                watched.snapshot = value;
                true
            }
            None => false,
        }
    }

    /// Takes the live value of every field as its new snapshot
    pub fn rebaseline(&mut self) {
        for watched in self.fields.iter_mut() {
            watched.snapshot = watched.field.read();
        }
    }

    /// Compares the live value of `key` with its snapshot
    pub fn is_changed(
        &self,
        key: &str,
    ) -> bool {
        self.get(key).is_some_and(WatchedField::is_changed)
    }
}
