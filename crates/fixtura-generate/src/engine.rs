use std::fmt;
use std::iter::FusedIterator;
use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde_json::Value;
use tracing::{trace, warn};

use fixtura_core::{FixtureSchema, Record};

use crate::errors::GenerationError;
use crate::faker::{FakerOptions, RecordGenerator, SchemaFaker};
use crate::model::Overrides;

/// Turns a schema, a quantity and overrides into a run of candidate records.
///
/// The generator itself holds no per-call state: every call to
/// [`ModelGenerator::generate`] returns an independent [`ModelRun`].
#[derive(Clone)]
pub struct ModelGenerator {
    generator: Arc<dyn RecordGenerator>,
}

impl ModelGenerator {
    pub fn new(generator: Arc<dyn RecordGenerator>) -> Self {
        Self { generator }
    }

    pub fn with_options(options: FakerOptions) -> Self {
        Self::new(Arc::new(SchemaFaker::new(options)))
    }

    /// Start a run of `quantity` records.
    ///
    /// Record `i` is generated from an rng seeded with `(seed, i)`, so a run
    /// depends only on its arguments.
    pub fn generate<'a>(
        &'a self,
        schema: &'a FixtureSchema,
        quantity: usize,
        overrides: &'a Overrides,
        refs: &'a [FixtureSchema],
        seed: u64,
    ) -> Result<ModelRun<'a>, GenerationError> {
        overrides.validate()?;
        Ok(ModelRun {
            generator: self.generator.as_ref(),
            schema,
            overrides,
            refs,
            seed,
            quantity,
            index: 0,
            done: false,
        })
    }
}

impl Default for ModelGenerator {
    fn default() -> Self {
        Self::with_options(FakerOptions::default())
    }
}

impl fmt::Debug for ModelGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelGenerator").finish_non_exhaustive()
    }
}

/// Lazy, finite run of generated records.
///
/// Records are produced on demand. The first failure ends the run: the error
/// is yielded once and the iterator is exhausted afterwards.
pub struct ModelRun<'a> {
    generator: &'a dyn RecordGenerator,
    schema: &'a FixtureSchema,
    overrides: &'a Overrides,
    refs: &'a [FixtureSchema],
    seed: u64,
    quantity: usize,
    index: usize,
    done: bool,
}

impl Iterator for ModelRun<'_> {
    type Item = Result<Record, GenerationError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.index >= self.quantity {
            return None;
        }

        let index = self.index;
        let mut rng = ChaCha8Rng::seed_from_u64(hash_row_seed(self.seed, index as u64));
        let generated = match self.generator.generate(self.schema, self.refs, &mut rng) {
            Ok(value) => value,
            Err(source) => {
                self.done = true;
                warn!(index, error = %source, "record generation failed");
                return Some(Err(GenerationError::References { source }));
            }
        };

        let mut record = match generated {
            Value::Object(record) => record,
            other => {
                self.done = true;
                return Some(Err(GenerationError::NotAnObject {
                    kind: value_kind(&other),
                }));
            }
        };

        if let Some(fields) = self.overrides.for_index(index) {
            for (field, value) in fields {
                record.insert(field.clone(), value.clone());
            }
        }

        self.index += 1;
        trace!(index, fields = record.len(), "record generated");
        Some(Ok(record))
    }

    /// An unfinished run yields at least one more item, possibly an error
    /// that ends it early, and never more than the remaining quantity.
    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            return (0, Some(0));
        }
        let remaining = self.quantity.saturating_sub(self.index);
        (remaining.min(1), Some(remaining))
    }
}

impl FusedIterator for ModelRun<'_> {}

/// Derive a stable seed from a base seed and a key.
pub fn hash_seed(seed: u64, key: &str) -> u64 {
    let mut hash = seed ^ 0xcbf29ce484222325;
    for byte in key.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

fn hash_row_seed(seed: u64, row_index: u64) -> u64 {
    let mut hash = seed ^ row_index.wrapping_mul(0x9e3779b97f4a7c15);
    hash = hash.wrapping_mul(0x100000001b3);
    hash
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn row_seeds_differ_per_index() {
        assert_ne!(hash_row_seed(1, 0), hash_row_seed(1, 1));
        assert_eq!(hash_seed(9, "user#0"), hash_seed(9, "user#0"));
        assert_ne!(hash_seed(9, "user#0"), hash_seed(9, "user#1"));
    }

    #[test]
    fn size_hint_tracks_the_remaining_quantity() {
        let generator = ModelGenerator::default();
        let schema = FixtureSchema::new(json!({"type": "object"}));
        let overrides = Overrides::none();
        let mut run = generator
            .generate(&schema, 3, &overrides, &[], 1)
            .expect("start run");

        assert_eq!(run.size_hint(), (1, Some(3)));
        assert!(matches!(run.next(), Some(Ok(_))));
        assert_eq!(run.size_hint(), (1, Some(2)));
        assert_eq!(run.by_ref().count(), 2);
        assert_eq!(run.size_hint(), (0, Some(0)));

        let empty = generator
            .generate(&schema, 0, &overrides, &[], 1)
            .expect("start run");
        assert_eq!(empty.size_hint(), (0, Some(0)));
    }

    #[test]
    fn failed_run_reports_no_remaining_items() {
        let generator = ModelGenerator::default();
        let schema = FixtureSchema::new(json!({"type": "string"}));
        let overrides = Overrides::none();
        let mut run = generator
            .generate(&schema, 3, &overrides, &[], 1)
            .expect("start run");

        assert_eq!(run.size_hint(), (1, Some(3)));
        assert!(matches!(run.next(), Some(Err(_))));
        assert_eq!(run.size_hint(), (0, Some(0)));
    }

    #[test]
    fn non_object_root_ends_the_run() {
        let generator = ModelGenerator::default();
        let schema = FixtureSchema::new(json!({"type": "string"}));
        let overrides = Overrides::none();
        let mut run = generator
            .generate(&schema, 3, &overrides, &[], 1)
            .expect("start run");

        assert!(matches!(
            run.next(),
            Some(Err(GenerationError::NotAnObject { kind: "a string" }))
        ));
        assert!(run.next().is_none());
    }
}
