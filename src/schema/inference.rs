// Type inference for the typedata schema system
//
// This module derives schemas from sample values. Arrays of heterogeneous
// elements and format readers that only learn structure by seeing data both
// go through here; the result is the schema merge fold over all samples.

use serde::{Deserialize, Serialize};

use crate::data::value::TypedValue;
use crate::internal::error::Result;
use crate::schema::merge::{SchemaInterner, SchemaMerger};
use crate::schema::model::Schema;

/// Configuration for schema inference
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Upper bound on the number of samples looked at; `None` reads all
    pub max_samples: Option<usize>,
}

/// Schema inference engine
#[derive(Debug, Default)]
pub struct SchemaInference {
    config: InferenceConfig,
    merger: SchemaMerger,
}

impl SchemaInference {
    /// Creates a new schema inference engine with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new schema inference engine with custom configuration
    pub fn with_config(config: InferenceConfig) -> Self {
        Self {
            config,
            merger: SchemaMerger::new(),
        }
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    /// Canonical struct shapes seen so far
    pub fn interner(&self) -> &SchemaInterner {
        self.merger.interner()
    }

    /// Infers the schema shared by `samples`.
    ///
    /// Zero samples yield the placeholder none schema. Otherwise the result
    /// is the schema merge of every sample's schema, so struct samples with
    /// different field subsets produce one struct holding all fields.
    pub fn infer(&mut self, samples: &[TypedValue]) -> Result<Schema> {
        let limit = self.config.max_samples.unwrap_or(usize::MAX);
        let mut schema = Schema::none();
        for sample in samples.iter().take(limit) {
            schema = self.merger.merge(&schema, &sample.schema())?;
        }
        Ok(schema)
    }

    /// Infers the schema of an array holding `items`
    pub fn infer_array(&mut self, items: &[TypedValue]) -> Result<Schema> {
        self.infer(items).map(Schema::array)
    }

    /// Folds already-derived schemas together
    pub fn infer_schemas<'a, I>(&mut self, schemas: I) -> Result<Schema>
    where
        I: IntoIterator<Item = &'a Schema>,
    {
        let limit = self.config.max_samples.unwrap_or(usize::MAX);
        let mut merged = Schema::none();
        for schema in schemas.into_iter().take(limit) {
            merged = self.merger.merge(&merged, schema)?;
        }
        Ok(merged)
    }
}

/// Infers an array element schema from sample elements with default settings
pub fn infer_element_schema(samples: &[TypedValue]) -> Result<Schema> {
    SchemaInference::new().infer(samples)
}
