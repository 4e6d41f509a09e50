//! Single-row tabular records.
//!
//! Fitted preprocessors address their inputs by column name and position, so
//! a `Record` keeps both: an ordered list of named cells.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Category(String),
}

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(value) => Some(*value),
            Value::Category(_) => None,
        }
    }

    pub fn as_category(&self) -> Option<&str> {
        match self {
            Value::Number(_) => None,
            Value::Category(value) => Some(value),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(value) => write!(f, "{value}"),
            Value::Category(value) => write!(f, "{value:?}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    cells: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_number(mut self, column: impl Into<String>, value: f64) -> Self {
        self.push(column, Value::Number(value));
        self
    }

    pub fn with_category(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(column, Value::Category(value.into()));
        self
    }

    pub fn push(&mut self, column: impl Into<String>, value: Value) {
        self.cells.push((column.into(), value));
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Returns a copy without the named columns. Names not present are ignored.
    pub fn drop_columns(&self, columns: &[&str]) -> Record {
        let cells = self
            .cells
            .iter()
            .filter(|(name, _)| !columns.contains(&name.as_str()))
            .cloned()
            .collect();
        Record { cells }
    }

    /// Appends the columns of `other` after the columns of `self`.
    pub fn concat(mut self, other: Record) -> Record {
        self.cells.extend(other.cells);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Record {
        Record::new()
            .with_category("Fuel Type", "Petrol")
            .with_number("Speed", 60.0)
            .with_number("Emission_Index", 0.0)
    }

    #[test]
    fn columns_keep_insertion_order() {
        let record = sample();

        let columns: Vec<&str> = record.columns().collect();

        assert_eq!(columns, vec!["Fuel Type", "Speed", "Emission_Index"]);
    }

    #[test]
    fn drop_columns_ignores_missing_names() {
        let record = sample();

        let dropped = record.drop_columns(&["Emission_Index", "Wind Speed"]);

        let columns: Vec<&str> = dropped.columns().collect();
        assert_eq!(columns, vec!["Fuel Type", "Speed"]);
        assert_eq!(record.len(), 3);
    }

    #[test]
    fn concat_appends_in_order() {
        let left = Record::new().with_number("a", 1.0);
        let right = Record::new().with_number("b", 2.0).with_number("c", 3.0);

        let combined = left.concat(right);

        let columns: Vec<&str> = combined.columns().collect();
        assert_eq!(columns, vec!["a", "b", "c"]);
        assert_eq!(combined.get("c").and_then(Value::as_number), Some(3.0));
    }

    #[test]
    fn value_accessors_distinguish_kinds() {
        let number = Value::Number(2.5);
        let category = Value::Category("City".to_string());

        assert_eq!(number.as_number(), Some(2.5));
        assert_eq!(number.as_category(), None);
        assert_eq!(category.as_category(), Some("City"));
        assert_eq!(category.as_number(), None);
    }
}
