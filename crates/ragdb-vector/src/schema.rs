use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

/// Arrow schema for the child-vector table. The embedding dimension comes
/// from the configured embedder rather than a fixed constant.
pub fn build_arrow_schema(dim: i32) -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new("id", DataType::Utf8, false),
		Field::new("parent_id", DataType::Utf8, false),
		Field::new(
			"vector",
			DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim),
			true,
		),
	]))
}
