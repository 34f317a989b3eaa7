use arrow_schema::{Schema, Field, DataType};
use std::sync::Arc;

pub const ID_COL: &str = "id";
pub const TEXT_COL: &str = "text";
pub const METADATA_COL: &str = "metadata";
pub const VECTOR_COL: &str = "vector";
pub const DISTANCE_COL: &str = "_distance";

/// Passage table layout. `metadata` holds a JSON object of string attributes.
pub fn build_passage_schema(dim: i32) -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new(ID_COL, DataType::Utf8, false),
		Field::new(TEXT_COL, DataType::Utf8, true),
		Field::new(METADATA_COL, DataType::Utf8, true),
		Field::new(VECTOR_COL, DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true),
	]))
}
