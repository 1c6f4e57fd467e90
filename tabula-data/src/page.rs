use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::DataError;
use crate::hydrate::Record;

/// A page of results with pagination metadata.
///
/// `current_page` and `per_page` echo the request; they are not derived from
/// the number of records returned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paginated<T> {
    pub total_records: u64,
    pub current_page: u64,
    pub per_page: u64,
    pub records: Vec<T>,
}

impl<T> Paginated<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            total_records: self.total_records,
            current_page: self.current_page,
            per_page: self.per_page,
            records: self.records.into_iter().map(f).collect(),
        }
    }

    /// Number of pages needed for `total_records`.
    pub fn total_pages(&self) -> u64 {
        if self.per_page == 0 {
            0
        } else {
            self.total_records.div_ceil(self.per_page)
        }
    }
}

impl Paginated<Record> {
    /// Deserialize every record into `T`.
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<Paginated<T>, DataError> {
        let records = self
            .records
            .into_iter()
            .map(|r| serde_json::from_value(serde_json::Value::Object(r)))
            .collect::<Result<Vec<T>, _>>()
            .map_err(|e| DataError::Other(format!("record does not match target type: {e}")))?;
        Ok(Paginated {
            total_records: self.total_records,
            current_page: self.current_page,
            per_page: self.per_page,
            records,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Row {
        id: i64,
    }

    fn page() -> Paginated<Record> {
        let record = |id: i64| match json!({"id": id}) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        };
        Paginated {
            total_records: 21,
            current_page: 2,
            per_page: 10,
            records: vec![record(11), record(12)],
        }
    }

    #[test]
    fn serializes_with_snake_case_keys() {
        let value = serde_json::to_value(page()).unwrap();
        assert_eq!(
            value,
            json!({"total_records": 21, "current_page": 2, "per_page": 10,
                   "records": [{"id": 11}, {"id": 12}]})
        );
    }

    #[test]
    fn typed_conversion_and_pages() {
        let typed: Paginated<Row> = page().into_typed().unwrap();
        assert_eq!(typed.records, vec![Row { id: 11 }, Row { id: 12 }]);
        assert_eq!(typed.total_pages(), 3);
        assert!(page().map(|_| ()).records.len() == 2);
    }
}
