use rand::{Rng, RngCore};
use serde_json::{Map, Number, Value};

use crate::errors::FakerError;

const DEFAULT_MIN: f64 = 0.0;
const DEFAULT_SPAN: f64 = 10000.0;

/// Inclusive bounds after folding in draft-4 and draft-6 exclusivity.
struct Bounds {
    min: f64,
    max: f64,
    exclusive_min: bool,
    exclusive_max: bool,
}

fn bounds(object: &Map<String, Value>) -> Bounds {
    let mut min = object.get("minimum").and_then(Value::as_f64);
    let mut max = object.get("maximum").and_then(Value::as_f64);
    let mut exclusive_min = false;
    let mut exclusive_max = false;

    match object.get("exclusiveMinimum") {
        Some(Value::Bool(flag)) => exclusive_min = *flag,
        Some(value) => {
            if let Some(bound) = value.as_f64()
                && min.is_none_or(|min| bound >= min)
            {
                min = Some(bound);
                exclusive_min = true;
            }
        }
        None => {}
    }
    match object.get("exclusiveMaximum") {
        Some(Value::Bool(flag)) => exclusive_max = *flag,
        Some(value) => {
            if let Some(bound) = value.as_f64()
                && max.is_none_or(|max| bound <= max)
            {
                max = Some(bound);
                exclusive_max = true;
            }
        }
        None => {}
    }

    let (min, max) = match (min, max) {
        (Some(min), Some(max)) => (min, max),
        (Some(min), None) => (min, min + DEFAULT_SPAN),
        (None, Some(max)) => (max - DEFAULT_SPAN, max),
        (None, None) => (DEFAULT_MIN, DEFAULT_MIN + DEFAULT_SPAN),
    };

    Bounds {
        min,
        max,
        exclusive_min: exclusive_min && min.is_finite(),
        exclusive_max: exclusive_max && max.is_finite(),
    }
}

pub(super) fn fake_integer(
    object: &Map<String, Value>,
    rng: &mut dyn RngCore,
) -> Result<Value, FakerError> {
    let bounds = bounds(object);
    let mut min = bounds.min.ceil() as i64;
    let mut max = bounds.max.floor() as i64;
    if bounds.exclusive_min && min as f64 == bounds.min {
        min += 1;
    }
    if bounds.exclusive_max && max as f64 == bounds.max {
        max -= 1;
    }

    if let Some(step) = object.get("multipleOf").and_then(Value::as_i64) {
        if step <= 0 {
            return Err(FakerError::Unsatisfiable(
                "multipleOf must be > 0".to_string(),
            ));
        }
        let low = min.div_euclid(step) + i64::from(min.rem_euclid(step) != 0);
        let high = max.div_euclid(step);
        if low > high {
            return Err(FakerError::Unsatisfiable(format!(
                "no multiple of {step} between {min} and {max}"
            )));
        }
        return Ok(Value::from(rng.random_range(low..=high) * step));
    }

    if min > max {
        return Err(FakerError::Unsatisfiable(format!(
            "integer range {min}..={max} is empty"
        )));
    }
    Ok(Value::from(rng.random_range(min..=max)))
}

pub(super) fn fake_number(
    object: &Map<String, Value>,
    rng: &mut dyn RngCore,
) -> Result<Value, FakerError> {
    let bounds = bounds(object);
    if bounds.min > bounds.max
        || (bounds.min == bounds.max && (bounds.exclusive_min || bounds.exclusive_max))
    {
        return Err(FakerError::Unsatisfiable(format!(
            "number range {}..{} is empty",
            bounds.min, bounds.max
        )));
    }

    let value = if let Some(step) = object.get("multipleOf").and_then(Value::as_f64) {
        if step <= 0.0 {
            return Err(FakerError::Unsatisfiable(
                "multipleOf must be > 0".to_string(),
            ));
        }
        let low = (bounds.min / step).ceil() as i64;
        let high = (bounds.max / step).floor() as i64;
        if low > high {
            return Err(FakerError::Unsatisfiable(format!(
                "no multiple of {step} in range"
            )));
        }
        rng.random_range(low..=high) as f64 * step
    } else if bounds.min == bounds.max {
        bounds.min
    } else {
        let mut value = rng.random_range(bounds.min..bounds.max);
        if bounds.exclusive_min && value == bounds.min {
            value = (bounds.min + bounds.max) / 2.0;
        }
        value
    };

    Number::from_f64(value)
        .map(Value::Number)
        .ok_or_else(|| FakerError::Unsatisfiable(format!("{value} is not a finite number")))
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use serde_json::json;

    use super::*;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn draft4_exclusive_minimum_skips_bound() {
        let schema = object(json!({"minimum": 0, "maximum": 1, "exclusiveMinimum": true}));
        for seed in 0..16 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            assert_eq!(fake_integer(&schema, &mut rng).expect("integer"), json!(1));
        }
    }

    #[test]
    fn draft6_exclusive_maximum_is_numeric() {
        let schema = object(json!({"minimum": 5, "exclusiveMaximum": 7}));
        for seed in 0..16 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let value = fake_integer(&schema, &mut rng).expect("integer");
            let value = value.as_i64().expect("i64");
            assert!((5..7).contains(&value));
        }
    }

    #[test]
    fn multiple_of_is_respected() {
        let schema = object(json!({"minimum": 1, "maximum": 100, "multipleOf": 25}));
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let value = fake_integer(&schema, &mut rng).expect("integer");
        assert_eq!(value.as_i64().expect("i64") % 25, 0);
    }

    #[test]
    fn empty_ranges_are_unsatisfiable() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let schema = object(json!({"minimum": 10, "maximum": 1}));
        assert!(matches!(
            fake_integer(&schema, &mut rng),
            Err(FakerError::Unsatisfiable(_))
        ));
        assert!(matches!(
            fake_number(&schema, &mut rng),
            Err(FakerError::Unsatisfiable(_))
        ));
    }

    #[test]
    fn numbers_stay_in_range() {
        let schema = object(json!({"minimum": 1.5, "maximum": 2.5}));
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let value = fake_number(&schema, &mut rng).expect("number");
        let value = value.as_f64().expect("f64");
        assert!((1.5..=2.5).contains(&value));
    }
}
