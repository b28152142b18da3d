use crate::document::Document;
use crate::error::TableError;
use crate::value::Value;

/// Ordered columns plus positional rows.
///
/// Every row holds exactly one value per column, in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Result<Self, TableError> {
        for (idx, column) in columns.iter().enumerate() {
            if columns[..idx].contains(column) {
                return Err(TableError::DuplicateColumn {
                    column: column.clone(),
                });
            }
        }
        Ok(Self {
            columns,
            rows: Vec::new(),
        })
    }

    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, TableError> {
        let mut table = Self::new(columns)?;
        table.rows.reserve(rows.len());
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Build a table from documents; columns appear in first-seen order and
    /// fields absent from a document read as `Null`.
    #[must_use]
    pub fn from_documents(documents: &[Document]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for doc in documents {
            for key in doc.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.to_string());
                }
            }
        }
        let rows = documents
            .iter()
            .map(|doc| {
                columns
                    .iter()
                    .map(|c| doc.get(c).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();
        Self { columns, rows }
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> Result<(), TableError> {
        if row.len() != self.columns.len() {
            return Err(TableError::RowWidth {
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Values of one column, top to bottom.
    pub fn column_values(&self, name: &str) -> Option<impl Iterator<Item = &Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    #[must_use]
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// One document per row, fields in column order.
    #[must_use]
    pub fn to_documents(&self) -> Vec<Document> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect()
    }

    #[must_use]
    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<Value>>) {
        (self.columns, self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|c| (*c).to_string()).collect()
    }

    #[test]
    fn test_duplicate_columns_rejected() {
        let result = Table::new(names(&["a", "b", "a"]));
        assert_eq!(
            result,
            Err(TableError::DuplicateColumn {
                column: "a".to_string()
            })
        );
    }

    #[test]
    fn test_row_width_enforced() {
        let mut table = Table::new(names(&["a", "b"])).unwrap();
        assert!(table.push_row(vec![Value::Int(1)]).is_err());
        assert!(table.push_row(vec![Value::Int(1), Value::Null]).is_ok());
        assert_eq!(table.height(), 1);
    }

    #[test]
    fn test_documents_round_trip_with_missing_fields() {
        let table = Table::from_rows(
            names(&["a", "b"]),
            vec![vec![Value::Int(1), Value::from("x")]],
        )
        .unwrap();
        let mut docs = table.to_documents();
        let mut extra = Document::new();
        extra.insert("c", Value::Int(9));
        docs.push(extra);

        let back = Table::from_documents(&docs);
        assert_eq!(back.columns(), names(&["a", "b", "c"]).as_slice());
        assert_eq!(back.get(0, "c"), Some(&Value::Null));
        assert_eq!(back.get(1, "a"), Some(&Value::Null));
        assert_eq!(back.get(1, "c"), Some(&Value::Int(9)));
    }
}
