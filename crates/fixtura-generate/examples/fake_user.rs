use fixtura_core::FixtureSchema;
use fixtura_generate::{ModelGenerator, Overrides};
use serde_json::json;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let schema = FixtureSchema::new(json!({
        "type": "object",
        "properties": {
            "name": {"type": "string", "faker": "name.findName"},
            "email": {"type": "string", "format": "email"}
        },
        "required": ["name", "email"]
    }));

    let generator = ModelGenerator::default();
    let overrides = Overrides::none();
    for record in generator.generate(&schema, 3, &overrides, &[], 7)? {
        println!("{}", serde_json::to_string(&record?)?);
    }
    Ok(())
}
