use super::{Identity, Insert, Store, StoreError, Value};
use crate::path::NodePath;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

/// In-process [`Store`] with one serial counter per table.
///
/// Identities are handed out in statement order starting at 1, and
/// `truncate` restarts them, the same way `TRUNCATE ... RESTART IDENTITY`
/// does. Used by the tests, the benches and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: HashMap<&'static str, MemoryTable>,
    rejecting: HashSet<&'static str>,
    renumbering: HashSet<&'static str>,
}

#[derive(Debug)]
struct MemoryTable {
    rows: Vec<MemoryRow>,
    next_id: Identity,
    requests: usize,
}

impl Default for MemoryTable {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            next_id: 1,
            requests: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MemoryRow {
    pub id: Identity,
    pub values: Vec<(&'static str, Value)>,
}

impl MemoryRow {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, value)| value)
    }

    pub fn int(&self, column: &str) -> Option<i32> {
        self.get(column).and_then(Value::as_int)
    }

    pub fn text(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(Value::as_text)
    }

    pub fn path(&self, column: &str) -> Option<&NodePath> {
        self.get(column).and_then(Value::as_path)
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self, table: &str) -> &[MemoryRow] {
        self.tables
            .get(table)
            .map(|table| table.rows.as_slice())
            .unwrap_or(&[])
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.rows(table).len()
    }

    /// Number of insert statements issued against `table` since creation.
    pub fn requests(&self, table: &str) -> usize {
        self.tables.get(table).map_or(0, |table| table.requests)
    }

    /// Makes every following insert into `table` fail.
    pub fn reject_inserts_into(&mut self, table: &'static str) {
        self.rejecting.insert(table);
    }

    /// Makes inserts into `table` take identities from the table's own
    /// counter even when the row supplies an `id`.
    pub fn ignore_explicit_ids(&mut self, table: &'static str) {
        self.renumbering.insert(table);
    }

    fn append(&mut self, insert: &Insert<'_>) -> Result<Vec<MemoryRow>, StoreError> {
        if self.rejecting.contains(insert.table) {
            return Err(StoreError::Rejected {
                table: insert.table,
                reason: "rejected by test store".to_string(),
            });
        }

        let honour_ids = !self.renumbering.contains(insert.table);
        let table = self.tables.entry(insert.table).or_default();
        table.requests += 1;

        let mut appended = Vec::with_capacity(insert.rows.len());
        for values in insert.rows {
            if values.len() != insert.columns.len() {
                return Err(StoreError::Rejected {
                    table: insert.table,
                    reason: format!(
                        "{} values for {} columns",
                        values.len(),
                        insert.columns.len()
                    ),
                });
            }

            let explicit_id = insert
                .columns
                .iter()
                .position(|column| *column == "id")
                .and_then(|index| values[index].as_int())
                .filter(|_| honour_ids);
            let id = match explicit_id {
                Some(id) => {
                    table.next_id = table.next_id.max(id + 1);
                    id
                }
                None => {
                    let id = table.next_id;
                    table.next_id += 1;
                    id
                }
            };

            let row = MemoryRow {
                id,
                values: insert.columns.iter().copied().zip(values.iter().cloned()).collect(),
            };
            table.rows.push(row.clone());
            appended.push(row);
        }
        Ok(appended)
    }

    fn root(&self, table: &'static str) -> Result<&MemoryRow, StoreError> {
        self.rows(table)
            .iter()
            .find(|row| row.text("name") == Some("all"))
            .ok_or(StoreError::MissingRoot { table })
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn truncate(&mut self, tables: &[&'static str]) -> Result<(), StoreError> {
        for name in tables {
            let table = self.tables.entry(*name).or_default();
            table.rows.clear();
            table.next_id = 1;
        }
        Ok(())
    }

    async fn insert(&mut self, insert: Insert<'_>) -> Result<(), StoreError> {
        self.append(&insert)?;
        Ok(())
    }

    async fn insert_returning_ids(
        &mut self,
        insert: Insert<'_>,
    ) -> Result<Vec<Identity>, StoreError> {
        Ok(self.append(&insert)?.into_iter().map(|row| row.id).collect())
    }

    async fn insert_returning_named(
        &mut self,
        insert: Insert<'_>,
        name_column: &'static str,
    ) -> Result<Vec<(Identity, String)>, StoreError> {
        self.append(&insert)?
            .into_iter()
            .map(|row| match row.text(name_column) {
                Some(name) => Ok((row.id, name.to_string())),
                None => Err(StoreError::Rejected {
                    table: insert.table,
                    reason: format!("no text column {name_column}"),
                }),
            })
            .collect()
    }

    async fn allocate_ids(
        &mut self,
        table: &'static str,
        count: usize,
    ) -> Result<Vec<Identity>, StoreError> {
        let table = self.tables.entry(table).or_default();
        let ids = (0..count)
            .map(|offset| table.next_id + offset as Identity)
            .collect();
        table.next_id += count as Identity;
        Ok(ids)
    }

    async fn root_id(&mut self, table: &'static str) -> Result<Identity, StoreError> {
        self.root(table).map(|row| row.id)
    }

    async fn root_path(&mut self, table: &'static str) -> Result<(Identity, NodePath), StoreError> {
        let row = self.root(table)?;
        let path = row
            .path("path")
            .cloned()
            .ok_or(StoreError::MissingRoot { table })?;
        Ok((row.id, path))
    }
}
