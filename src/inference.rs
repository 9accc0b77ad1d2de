//! Storage-type inference from runtime values.
//!
//! Used when a call supplies positional values without an explicit type
//! configuration. Inference is a closed match over the value kinds the crate
//! accepts; there is no open-ended reflection. Booleans and integers keep a
//! typed binding. Floats, text, timestamps, structured values, and NULLs all
//! widen to the text storage type; on SQLite, column affinity restores
//! numeric storage for numeric columns, so the round trip stays lossless.
//! Binary values are the one exception: bytes infer to the binary type
//! because a textual widening would corrupt them.

use crate::params::ParamTypes;
use crate::types::{ParamValue, StorageType};

/// Storage type for one runtime value.
#[must_use]
pub fn storage_type_for(value: &ParamValue) -> StorageType {
    match value {
        ParamValue::Bool(_) => StorageType::Boolean,
        ParamValue::Int(_) => StorageType::Integer,
        ParamValue::Blob(_) => StorageType::Binary,
        ParamValue::Float(_)
        | ParamValue::Text(_)
        | ParamValue::Timestamp(_)
        | ParamValue::Json(_)
        | ParamValue::Null => StorageType::Text,
    }
}

/// Infer a type per placeholder from one representative row: the first row of
/// a batch, or the sole row of a single execution.
///
/// Later rows of a batch are assumed to share these types; the caller owns
/// that invariant and the crate does not re-check it row by row.
#[must_use]
pub fn infer_param_types(names: &[String], row: &[ParamValue]) -> ParamTypes {
    ParamTypes::from_pairs(
        names
            .iter()
            .zip(row)
            .map(|(name, value)| (name.clone(), storage_type_for(value))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_int_text_infer_their_own_types() {
        let names = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let row = vec![
            ParamValue::Bool(true),
            ParamValue::Int(5),
            ParamValue::Text("x".into()),
        ];
        let types = infer_param_types(&names, &row);
        assert_eq!(types.get("a"), Some(StorageType::Boolean));
        assert_eq!(types.get("b"), Some(StorageType::Integer));
        assert_eq!(types.get("c"), Some(StorageType::Text));
    }

    #[test]
    fn floats_structured_and_null_widen_to_text() {
        assert_eq!(
            storage_type_for(&ParamValue::Float(1.5)),
            StorageType::Text
        );
        assert_eq!(
            storage_type_for(&ParamValue::Json(serde_json::json!([1]))),
            StorageType::Text
        );
        assert_eq!(storage_type_for(&ParamValue::Null), StorageType::Text);
        assert_eq!(
            storage_type_for(&ParamValue::Timestamp(Default::default())),
            StorageType::Text
        );
    }

    #[test]
    fn blobs_infer_binary() {
        assert_eq!(
            storage_type_for(&ParamValue::Blob(vec![1, 2])),
            StorageType::Binary
        );
    }
}
