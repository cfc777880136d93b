use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

/// Columns of the pattern vector table. `type` is the lower-cased pattern
/// name and is what the query builder's `type` filter matches.
pub fn build_arrow_schema(dim: i32) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("name", DataType::Utf8, false),
        Field::new("category", DataType::Utf8, false),
        Field::new("type", DataType::Utf8, false),
        Field::new("framework", DataType::Utf8, false),
        Field::new("library", DataType::Utf8, false),
        Field::new("vector", DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true),
    ]))
}
