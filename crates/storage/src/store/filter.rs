use serde_json::Value;
use uuid::Uuid;

use super::{Row, Table};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(&'static str, Value),
    In(&'static str, Vec<Value>),
    IsNull(&'static str),
    NotNull(&'static str),
}

impl Condition {
    pub fn column(&self) -> &'static str {
        match self {
            Self::Eq(c, _) | Self::In(c, _) | Self::IsNull(c) | Self::NotNull(c) => c,
        }
    }

    /// Evaluates the condition with SQL semantics: comparing against null never matches.
    pub fn matches(&self, row: &Row) -> bool {
        let value = row.get(self.column()).unwrap_or(&Value::Null);
        match self {
            Self::Eq(_, expected) => !value.is_null() && value == expected,
            Self::In(_, candidates) => !value.is_null() && candidates.contains(value),
            Self::IsNull(_) => value.is_null(),
            Self::NotNull(_) => !value.is_null(),
        }
    }
}

/// Conjunction of column conditions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Eq(column, value.into()));
        self
    }

    pub fn eq_id(self, column: &'static str, id: Uuid) -> Self {
        self.eq(column, id.to_string())
    }

    pub fn in_values(mut self, column: &'static str, values: Vec<Value>) -> Self {
        self.conditions.push(Condition::In(column, values));
        self
    }

    pub fn in_ids(self, column: &'static str, ids: impl IntoIterator<Item = Uuid>) -> Self {
        let values = ids.into_iter().map(|id| Value::String(id.to_string())).collect();
        self.in_values(column, values)
    }

    pub fn is_null(mut self, column: &'static str) -> Self {
        self.conditions.push(Condition::IsNull(column));
        self
    }

    pub fn not_null(mut self, column: &'static str) -> Self {
        self.conditions.push(Condition::NotNull(column));
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.conditions.iter().all(|c| c.matches(row))
    }

    pub fn validate(&self, table: Table) -> Result<()> {
        for condition in &self.conditions {
            table.column(condition.column())?;
        }
        Ok(())
    }
}
