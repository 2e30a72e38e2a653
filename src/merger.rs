use log::info;

use crate::crs::Crs;
use crate::error::{PipelineError, Result};
use crate::table::FeatureTable;

/// Concatenates `tables` into one table stamped with `crs`.
///
/// Rows keep input order and are re-indexed from zero; columns are the union
/// of every input's columns in first-seen order. An input that declares a
/// different CRS is rejected rather than silently relabelled.
pub fn merge<I>(tables: I, crs: Crs) -> Result<FeatureTable>
where
    I: IntoIterator<Item = Result<FeatureTable>>,
{
    let mut merged = FeatureTable::new(Some(crs.clone()));
    let mut table_count = 0;

    for table in tables {
        let table = table?;
        table_count += 1;

        if let Some(declared) = &table.crs {
            if *declared != crs {
                return Err(PipelineError::Schema(format!(
                    "CRS mismatch: input declares {} but the merge expects {}",
                    declared, crs
                )));
            }
        }

        for record in table.into_records() {
            merged.push(record);
        }
    }

    if table_count == 0 {
        return Err(PipelineError::EmptyInput { dir: None });
    }

    info!(
        "Merged {} tables into {} rows and {} columns",
        table_count,
        merged.len(),
        merged.columns().len()
    );
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Record;
    use serde_json::json;

    fn table(crs: Option<Crs>, rows: &[serde_json::Value]) -> FeatureTable {
        let mut table = FeatureTable::new(crs);
        for row in rows {
            table.push(Record::new(row.as_object().cloned().unwrap(), None));
        }
        table
    }

    #[test]
    fn concatenates_rows_and_unions_columns() {
        let a = table(None, &[json!({"id": 1, "name": "a"}), json!({"id": 2})]);
        let b = table(Some(Crs::wgs84()), &[json!({"id": 3, "kind": "x"})]);

        let merged = merge(vec![Ok(a), Ok(b)], Crs::wgs84()).unwrap();
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.columns(), ["id", "name", "kind"]);
        assert_eq!(merged.crs, Some(Crs::wgs84()));
        let ids: Vec<_> = merged.column("id").map(|v| v.cloned()).collect();
        assert_eq!(ids, [Some(json!(1)), Some(json!(2)), Some(json!(3))]);
    }

    #[test]
    fn empty_input_is_an_error() {
        let result = merge(Vec::new(), Crs::wgs84());
        assert!(matches!(result, Err(PipelineError::EmptyInput { dir: None })));
    }

    #[test]
    fn crs_mismatch_is_schema_error() {
        let a = table(Some(Crs::british_national_grid()), &[json!({"id": 1})]);
        let result = merge(vec![Ok(a)], Crs::wgs84());
        assert!(matches!(result, Err(PipelineError::Schema(msg)) if msg.contains("CRS mismatch")));
    }

    #[test]
    fn load_errors_propagate() {
        let err = PipelineError::Schema("boom".to_string());
        let result = merge(vec![Err(err)], Crs::wgs84());
        assert!(matches!(result, Err(PipelineError::Schema(msg)) if msg == "boom"));
    }
}
