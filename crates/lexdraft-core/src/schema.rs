/// Arrow schema for the persisted chunk index.
pub mod index {
    use std::collections::HashMap;
    use std::sync::Arc;

    use arrow::datatypes::{DataType, Field, Schema};

    /// Schema metadata key holding the embedding model name.
    pub const MODEL_KEY: &str = "embedding_model";
    /// Schema metadata key holding the embedding dimension.
    pub const DIM_KEY: &str = "embedding_dim";

    /// Schema for chunk rows with a `FixedSizeList<Float32, dim>` embedding.
    pub fn chunk_index_schema(dim: usize, model: &str) -> Schema {
        let metadata = HashMap::from([
            (MODEL_KEY.to_string(), model.to_string()),
            (DIM_KEY.to_string(), dim.to_string()),
        ]);
        Schema::new(vec![
            Field::new("chunk_id", DataType::Utf8, false),
            Field::new("document_id", DataType::Utf8, false),
            Field::new("ordinal", DataType::UInt64, false),
            Field::new("text", DataType::Utf8, false),
            Field::new(
                "embedding",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    dim as i32,
                ),
                false,
            ),
        ])
        .with_metadata(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::index;
    use arrow::datatypes::DataType;

    #[test]
    fn chunk_index_schema_has_expected_fields() {
        let schema = index::chunk_index_schema(384, "all-MiniLM-L6-v2");
        assert_eq!(schema.fields().len(), 5);
        assert!(schema.field_with_name("chunk_id").is_ok());
        assert!(schema.field_with_name("text").is_ok());
        let emb = schema.field_with_name("embedding").unwrap();
        assert!(matches!(emb.data_type(), DataType::FixedSizeList(_, 384)));
    }

    #[test]
    fn chunk_index_schema_records_model() {
        let schema = index::chunk_index_schema(4, "test-model");
        assert_eq!(schema.metadata()[index::MODEL_KEY], "test-model");
        assert_eq!(schema.metadata()[index::DIM_KEY], "4");
    }
}
