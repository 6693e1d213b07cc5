//! Default implementation of the schema-driven record generator.
//!
//! Supports the JSON Schema subset fixture files use in practice plus the
//! `faker` extension keyword. Every random choice is drawn from the `rng`
//! argument so a seeded rng reproduces the same value.

mod fake_ids;
mod numbers;

use std::collections::HashSet;

use rand::{Rng, RngCore};
use rand_regex::Regex as RandRegex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use fixtura_core::{FixtureSchema, GenerationConfig};

use crate::errors::FakerError;

use fake_ids::{fake_by_id, fake_format};

const DEFAULT_MAX_REPEAT: u32 = 16;
const DEFAULT_TEXT_MAX: usize = 48;
const UNIQUE_ITEM_ATTEMPTS: usize = 10;

/// Produces one sample value from a schema and its external references.
pub trait RecordGenerator: Send + Sync {
    fn generate(
        &self,
        schema: &FixtureSchema,
        refs: &[FixtureSchema],
        rng: &mut dyn RngCore,
    ) -> Result<Value, FakerError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FakerOptions {
    pub always_fake_optionals: bool,
    pub max_depth: usize,
    pub max_items: usize,
    pub item_ceiling: usize,
    pub text_ceiling: usize,
}

impl Default for FakerOptions {
    fn default() -> Self {
        Self::from(&GenerationConfig::default())
    }
}

impl From<&GenerationConfig> for FakerOptions {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            always_fake_optionals: config.always_fake_optionals,
            max_depth: config.max_depth,
            max_items: config.max_items,
            item_ceiling: config.item_ceiling,
            text_ceiling: config.text_ceiling,
        }
    }
}

/// JSON Schema faker with `$ref` resolution against external references.
#[derive(Debug, Clone, Default)]
pub struct SchemaFaker {
    options: FakerOptions,
}

impl SchemaFaker {
    pub fn new(options: FakerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &FakerOptions {
        &self.options
    }
}

impl RecordGenerator for SchemaFaker {
    fn generate(
        &self,
        schema: &FixtureSchema,
        refs: &[FixtureSchema],
        rng: &mut dyn RngCore,
    ) -> Result<Value, FakerError> {
        if let Some(index) = refs.iter().position(|reference| !reference.is_object()) {
            return Err(FakerError::InvalidReference { index });
        }

        let ctx = FakeContext {
            refs,
            options: &self.options,
        };
        ctx.fake(schema.as_value(), schema.as_value(), 0, rng)
    }
}

/// Local pointers (`#`, `#/definitions/..`) resolve against `root`, the
/// document currently being faked. Following an external `$ref` switches it.
struct FakeContext<'a> {
    refs: &'a [FixtureSchema],
    options: &'a FakerOptions,
}

impl<'a> FakeContext<'a> {
    fn fake(
        &self,
        root: &'a Value,
        schema: &Value,
        depth: usize,
        rng: &mut dyn RngCore,
    ) -> Result<Value, FakerError> {
        if depth > self.options.max_depth {
            return Err(FakerError::DepthExceeded(self.options.max_depth));
        }

        let object = match schema {
            Value::Object(object) => object,
            Value::Bool(true) => return Ok(Value::Null),
            other => {
                return Err(FakerError::UnsupportedSchema(format!(
                    "expected a schema object, found {other}"
                )));
            }
        };

        if let Some(reference) = object.get("$ref") {
            let reference = reference.as_str().ok_or_else(|| {
                FakerError::UnsupportedSchema("$ref must be a string".to_string())
            })?;
            let (root, target) = self.resolve(root, reference)?;
            return self.fake(root, target, depth + 1, rng);
        }

        if let Some(value) = object.get("const") {
            return Ok(value.clone());
        }

        if let Some(options) = object.get("enum") {
            return pick_enum(options, rng);
        }

        if let Some(Value::Array(branches)) = object.get("allOf") {
            let merged = self.merge_all_of(root, object, branches)?;
            return self.fake(root, &merged, depth + 1, rng);
        }

        if let Some(Value::Array(branches)) = object.get("anyOf").or_else(|| object.get("oneOf")) {
            if branches.is_empty() {
                return Err(FakerError::Unsatisfiable("empty anyOf/oneOf".to_string()));
            }
            let branch = &branches[rng.random_range(0..branches.len())];
            return self.fake(root, branch, depth + 1, rng);
        }

        if let Some(id) = object.get("faker") {
            return fake_keyword(id, rng);
        }

        match schema_type(object, rng)? {
            "object" => self.fake_object(root, object, depth, rng),
            "array" => self.fake_array(root, object, depth, rng),
            "string" => fake_string(object, self.options.text_ceiling, rng),
            "integer" => numbers::fake_integer(object, rng),
            "number" => numbers::fake_number(object, rng),
            "boolean" => Ok(Value::Bool(rng.random_bool(0.5))),
            "null" => Ok(Value::Null),
            other => Err(FakerError::UnsupportedSchema(format!("type '{other}'"))),
        }
    }

    /// Returns the target schema together with the document it lives in.
    fn resolve(
        &self,
        root: &'a Value,
        reference: &str,
    ) -> Result<(&'a Value, &'a Value), FakerError> {
        if reference == "#" {
            return Ok((root, root));
        }

        for prefix in ["#/definitions/", "#/$defs/"] {
            if let Some(name) = reference.strip_prefix(prefix) {
                let section = prefix.trim_start_matches("#/").trim_end_matches('/');
                return root
                    .get(section)
                    .and_then(|definitions| definitions.get(name))
                    .map(|target| (root, target))
                    .ok_or_else(|| FakerError::UnresolvedRef(reference.to_string()));
            }
        }

        self.refs
            .iter()
            .find(|schema| schema.id() == Some(reference))
            .map(|schema| (schema.as_value(), schema.as_value()))
            .ok_or_else(|| FakerError::UnresolvedRef(reference.to_string()))
    }

    fn merge_all_of(
        &self,
        root: &'a Value,
        object: &Map<String, Value>,
        branches: &[Value],
    ) -> Result<Value, FakerError> {
        let mut merged = object.clone();
        merged.remove("allOf");
        let mut properties = match merged.remove("properties") {
            Some(Value::Object(properties)) => properties,
            _ => Map::new(),
        };
        let mut required = string_set(merged.remove("required").as_ref());

        for branch in branches {
            let branch = match branch.get("$ref").and_then(Value::as_str) {
                Some(reference) => self.resolve(root, reference)?.1,
                None => branch,
            };
            let Some(branch) = branch.as_object() else {
                return Err(FakerError::UnsupportedSchema(
                    "allOf entries must be schema objects".to_string(),
                ));
            };
            for (key, value) in branch {
                match key.as_str() {
                    "properties" => {
                        if let Value::Object(extra) = value {
                            properties.extend(extra.clone());
                        }
                    }
                    "required" => required.extend(string_set(Some(value))),
                    _ => {
                        merged.entry(key.clone()).or_insert_with(|| value.clone());
                    }
                }
            }
        }

        if !properties.is_empty() {
            merged.insert("properties".to_string(), Value::Object(properties));
            merged
                .entry("type".to_string())
                .or_insert_with(|| Value::String("object".to_string()));
        }
        if !required.is_empty() {
            let mut required: Vec<String> = required.into_iter().collect();
            required.sort();
            merged.insert(
                "required".to_string(),
                Value::Array(required.into_iter().map(Value::String).collect()),
            );
        }
        Ok(Value::Object(merged))
    }

    fn fake_object(
        &self,
        root: &'a Value,
        object: &Map<String, Value>,
        depth: usize,
        rng: &mut dyn RngCore,
    ) -> Result<Value, FakerError> {
        let required = string_set(object.get("required"));
        let mut record = Map::new();

        if let Some(Value::Object(properties)) = object.get("properties") {
            for (name, property) in properties {
                let wanted = required.contains(name)
                    || self.options.always_fake_optionals
                    || rng.random_bool(0.5);
                if wanted {
                    record.insert(name.clone(), self.fake(root, property, depth + 1, rng)?);
                }
            }
        }

        Ok(Value::Object(record))
    }

    fn fake_array(
        &self,
        root: &'a Value,
        object: &Map<String, Value>,
        depth: usize,
        rng: &mut dyn RngCore,
    ) -> Result<Value, FakerError> {
        if let Some(Value::Array(tuple)) = object.get("items") {
            let items = tuple
                .iter()
                .map(|item| self.fake(root, item, depth + 1, rng))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Value::Array(items));
        }

        let ceiling = self.options.item_ceiling;
        let min_items = length_bound(object, "minItems")?.unwrap_or(0);
        if min_items > ceiling {
            return Err(FakerError::Unsatisfiable(format!(
                "minItems {min_items} exceeds the item ceiling of {ceiling}"
            )));
        }
        let max_items = length_bound(object, "maxItems")?
            .unwrap_or_else(|| self.options.max_items.max(min_items))
            .min(ceiling);
        if min_items > max_items {
            return Err(FakerError::Unsatisfiable(
                "minItems must be <= maxItems".to_string(),
            ));
        }
        let len = rng.random_range(min_items..=max_items);
        let unique = object
            .get("uniqueItems")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let Some(item_schema) = object.get("items") else {
            return Ok(Value::Array(vec![Value::Null; len]));
        };

        let mut items = Vec::with_capacity(len);
        let mut attempts = 0;
        while items.len() < len {
            attempts += 1;
            let item = self.fake(root, item_schema, depth + 1, rng)?;
            if unique && items.contains(&item) {
                if attempts >= len * UNIQUE_ITEM_ATTEMPTS {
                    break;
                }
                continue;
            }
            items.push(item);
        }

        if items.len() < min_items {
            return Err(FakerError::Unsatisfiable(format!(
                "could not produce {min_items} unique items"
            )));
        }
        Ok(Value::Array(items))
    }
}

fn schema_type<'s>(
    object: &'s Map<String, Value>,
    rng: &mut dyn RngCore,
) -> Result<&'s str, FakerError> {
    match object.get("type") {
        Some(Value::String(name)) => Ok(name.as_str()),
        Some(Value::Array(names)) => {
            let names: Vec<&str> = names.iter().filter_map(Value::as_str).collect();
            if names.is_empty() {
                return Err(FakerError::UnsupportedSchema("empty type list".to_string()));
            }
            Ok(names[rng.random_range(0..names.len())])
        }
        Some(other) => Err(FakerError::UnsupportedSchema(format!(
            "type must be a string or array, found {other}"
        ))),
        None => Ok(infer_type(object)),
    }
}

fn infer_type(object: &Map<String, Value>) -> &'static str {
    let has = |key: &str| object.contains_key(key);
    if has("properties") || has("required") {
        "object"
    } else if has("items") || has("minItems") || has("maxItems") {
        "array"
    } else if has("format") || has("pattern") || has("minLength") || has("maxLength") {
        "string"
    } else if has("minimum") || has("maximum") || has("multipleOf") {
        "number"
    } else {
        "null"
    }
}

fn pick_enum(options: &Value, rng: &mut dyn RngCore) -> Result<Value, FakerError> {
    match options {
        Value::Array(options) if !options.is_empty() => {
            Ok(options[rng.random_range(0..options.len())].clone())
        }
        _ => Err(FakerError::Unsatisfiable(
            "enum must be a non-empty array".to_string(),
        )),
    }
}

fn fake_keyword(id: &Value, rng: &mut dyn RngCore) -> Result<Value, FakerError> {
    let id = match id {
        Value::String(id) => id.as_str(),
        Value::Object(call) if call.len() == 1 => {
            call.keys().next().map(String::as_str).unwrap_or_default()
        }
        other => return Err(FakerError::UnknownFaker(other.to_string())),
    };
    fake_by_id(id, rng).ok_or_else(|| FakerError::UnknownFaker(id.to_string()))
}

fn fake_string(
    object: &Map<String, Value>,
    ceiling: usize,
    rng: &mut dyn RngCore,
) -> Result<Value, FakerError> {
    if let Some(pattern) = object.get("pattern").and_then(Value::as_str) {
        let regex = RandRegex::compile(pattern, DEFAULT_MAX_REPEAT).map_err(|err| {
            FakerError::InvalidPattern {
                pattern: pattern.to_string(),
                message: err.to_string(),
            }
        })?;
        let value: String = rng.sample(regex);
        return Ok(Value::String(value));
    }

    if let Some(format) = object.get("format").and_then(Value::as_str)
        && let Some(value) = fake_format(format, rng)
    {
        return Ok(Value::String(value));
    }

    let min_len = length_bound(object, "minLength")?.unwrap_or(0);
    if min_len > ceiling {
        return Err(FakerError::Unsatisfiable(format!(
            "minLength {min_len} exceeds the text ceiling of {ceiling}"
        )));
    }
    let max_len = length_bound(object, "maxLength")?
        .unwrap_or(DEFAULT_TEXT_MAX.max(min_len))
        .min(ceiling);
    if min_len > max_len {
        return Err(FakerError::Unsatisfiable(
            "minLength must be <= maxLength".to_string(),
        ));
    }

    Ok(Value::String(fake_ids::lorem_text(min_len, max_len, rng)))
}

/// Read a non-negative length keyword. Integral floats such as `4e12` count.
fn length_bound(object: &Map<String, Value>, key: &str) -> Result<Option<usize>, FakerError> {
    let Some(value) = object.get(key) else {
        return Ok(None);
    };
    let bound = match value.as_u64() {
        Some(bound) => bound,
        None => match value.as_f64() {
            // Float casts saturate, so `1e300` reads as `u64::MAX`.
            Some(bound) if bound >= 0.0 && bound.fract() == 0.0 => bound as u64,
            _ => {
                return Err(FakerError::UnsupportedSchema(format!(
                    "{key} must be a non-negative integer, found {value}"
                )));
            }
        },
    };
    Ok(Some(usize::try_from(bound).unwrap_or(usize::MAX)))
}

fn string_set(value: Option<&Value>) -> HashSet<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use serde_json::json;

    use super::*;

    fn fake(schema: Value, refs: &[FixtureSchema]) -> Result<Value, FakerError> {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        SchemaFaker::default().generate(&FixtureSchema::new(schema), refs, &mut rng)
    }

    #[test]
    fn required_properties_are_always_present() {
        let value = fake(
            json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string", "faker": "name.findName"},
                    "active": {"type": "boolean"}
                },
                "required": ["name"]
            }),
            &[],
        )
        .expect("fake object");

        let name = value["name"].as_str().expect("name is a string");
        assert!(!name.is_empty());
    }

    #[test]
    fn const_and_enum_are_respected() {
        let value = fake(
            json!({
                "type": "object",
                "properties": {
                    "kind": {"const": "tag"},
                    "color": {"enum": ["red", "green"]}
                },
                "required": ["kind", "color"]
            }),
            &[],
        )
        .expect("fake object");

        assert_eq!(value["kind"], "tag");
        assert!(value["color"] == "red" || value["color"] == "green");
    }

    #[test]
    fn local_definitions_resolve() {
        let value = fake(
            json!({
                "definitions": {"code": {"type": "string", "pattern": "[A-Z]{3}"}},
                "type": "object",
                "properties": {"code": {"$ref": "#/definitions/code"}},
                "required": ["code"]
            }),
            &[],
        )
        .expect("fake object");

        let code = value["code"].as_str().expect("code is a string");
        assert_eq!(code.len(), 3);
        assert!(code.chars().all(|ch| ch.is_ascii_uppercase()));
    }

    #[test]
    fn null_reference_is_rejected_before_generation() {
        let err = fake(json!({"type": "object"}), &[FixtureSchema::new(Value::Null)])
            .expect_err("null reference");
        assert!(matches!(err, FakerError::InvalidReference { index: 0 }));
    }

    #[test]
    fn unresolved_reference_fails() {
        let err = fake(json!({"$ref": "missing"}), &[]).expect_err("unresolved");
        assert!(matches!(err, FakerError::UnresolvedRef(name) if name == "missing"));
    }

    #[test]
    fn self_reference_hits_depth_limit() {
        let err = fake(
            json!({
                "type": "object",
                "properties": {"child": {"$ref": "#"}},
                "required": ["child"]
            }),
            &[],
        )
        .expect_err("infinite recursion");
        assert!(matches!(err, FakerError::DepthExceeded(_)));
    }

    #[test]
    fn all_of_merges_properties() {
        let value = fake(
            json!({
                "allOf": [
                    {"properties": {"a": {"const": 1}}, "required": ["a"]},
                    {"properties": {"b": {"const": 2}}, "required": ["b"]}
                ]
            }),
            &[],
        )
        .expect("fake allOf");

        assert_eq!(value, json!({"a": 1, "b": 2}));
    }

    #[test]
    fn unknown_faker_id_fails() {
        let err = fake(json!({"type": "string", "faker": "nope.nothing"}), &[])
            .expect_err("unknown faker");
        assert!(matches!(err, FakerError::UnknownFaker(_)));
    }

    #[test]
    fn external_refs_resolve_their_own_definitions() {
        let tag = FixtureSchema::new(json!({
            "id": "tag",
            "definitions": {"label": {"type": "string", "pattern": "[a-z]{4}"}},
            "type": "object",
            "properties": {"label": {"$ref": "#/definitions/label"}},
            "required": ["label"]
        }));
        let value = fake(
            json!({
                "type": "object",
                "properties": {"tag": {"$ref": "tag"}},
                "required": ["tag"]
            }),
            &[tag],
        )
        .expect("fake account");

        let label = value["tag"]["label"].as_str().expect("label is a string");
        assert_eq!(label.len(), 4);
        assert!(label.chars().all(|ch| ch.is_ascii_lowercase()));
    }

    #[test]
    fn primary_definitions_are_not_visible_from_external_refs() {
        let tag = FixtureSchema::new(json!({
            "id": "tag",
            "type": "object",
            "properties": {"label": {"$ref": "#/definitions/label"}},
            "required": ["label"]
        }));
        let err = fake(
            json!({
                "definitions": {"label": {"type": "string"}},
                "type": "object",
                "properties": {"tag": {"$ref": "tag"}},
                "required": ["tag"]
            }),
            &[tag],
        )
        .expect_err("label is not defined in the tag schema");
        assert!(matches!(err, FakerError::UnresolvedRef(name) if name == "#/definitions/label"));
    }

    #[test]
    fn oversized_minimums_are_unsatisfiable() {
        let huge = 4_000_000_000_000_u64;
        let err = fake(
            json!({"type": "array", "items": {"type": "integer"}, "minItems": huge, "maxItems": huge}),
            &[],
        )
        .expect_err("array above the item ceiling");
        assert!(matches!(err, FakerError::Unsatisfiable(_)));

        let err = fake(json!({"type": "array", "minItems": 4e12}), &[])
            .expect_err("float bound above the item ceiling");
        assert!(matches!(err, FakerError::Unsatisfiable(_)));

        let err = fake(json!({"type": "string", "minLength": huge}), &[])
            .expect_err("string above the text ceiling");
        assert!(matches!(err, FakerError::Unsatisfiable(_)));
    }

    #[test]
    fn oversized_maximums_are_clamped() {
        let options = FakerOptions {
            item_ceiling: 8,
            text_ceiling: 16,
            ..FakerOptions::default()
        };
        let faker = SchemaFaker::new(options);
        let huge = 4_000_000_000_000_u64;
        let array = FixtureSchema::new(
            json!({"type": "array", "items": {"type": "integer"}, "minItems": 8, "maxItems": huge}),
        );
        let text = FixtureSchema::new(json!({"type": "string", "minLength": 3, "maxLength": huge}));

        for seed in 0..10 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let items = faker.generate(&array, &[], &mut rng).expect("fake array");
            assert_eq!(items.as_array().map(Vec::len), Some(8));

            let value = faker.generate(&text, &[], &mut rng).expect("fake string");
            let len = value.as_str().expect("string").chars().count();
            assert!((3..=16).contains(&len), "length {len} out of bounds");
        }
    }

    #[test]
    fn negative_lengths_are_rejected() {
        let err = fake(json!({"type": "string", "maxLength": -1}), &[]).expect_err("negative");
        assert!(matches!(err, FakerError::UnsupportedSchema(_)));
    }

    #[test]
    fn string_lengths_are_bounded() {
        for seed in 0..20 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let schema =
                FixtureSchema::new(json!({"type": "string", "minLength": 5, "maxLength": 12}));
            let value = SchemaFaker::default()
                .generate(&schema, &[], &mut rng)
                .expect("fake string");
            let len = value.as_str().expect("string").chars().count();
            assert!((5..=12).contains(&len), "length {len} out of bounds");
        }
    }
}
