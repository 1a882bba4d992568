use crate::errors::DbError;

/// Convert a `serde_json::Value` that must be an object into a `bson::Document`.
///
/// # Errors
/// Returns `DbError::Schema` when the value is not an object or holds values BSON cannot represent.
pub fn json_value_to_bson_document(val: &serde_json::Value) -> Result<bson::Document, DbError> {
    let obj = val.as_object().ok_or_else(|| DbError::Schema("expected JSON object".into()))?;
    bson::Document::try_from(obj.clone()).map_err(|e| DbError::Schema(e.to_string()))
}

/// Parse a JSON string into a `bson::Document`. The JSON must be a top-level object.
///
/// # Errors
/// Returns an error on malformed JSON or a non-object top level.
pub fn parse_json_to_bson_document(json: &str) -> Result<bson::Document, DbError> {
    let val: serde_json::Value = serde_json::from_str(json)?;
    json_value_to_bson_document(&val)
}

/// Parse a JSON array of objects into BSON documents.
///
/// # Errors
/// Returns an error on malformed JSON, a non-array top level, or a non-object element.
pub fn parse_json_array_to_bson_documents(json: &str) -> Result<Vec<bson::Document>, DbError> {
    let val: serde_json::Value = serde_json::from_str(json)?;
    let arr = val.as_array().ok_or_else(|| DbError::Schema("expected JSON array".into()))?;
    arr.iter().map(json_value_to_bson_document).collect()
}
