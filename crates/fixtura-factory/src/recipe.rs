use fixtura_core::{FixtureSchema, ID_FIELD, Record};
use fixtura_generate::Overrides;

use crate::errors::{FactoryError, Result};
use crate::factory::FixtureFactory;

/// A fixture bound to the names of the schemas its `$ref`s point at.
///
/// ```ignore
/// let account = FixtureRecipe::new("account", ["tags"]);
/// let record = account.create(&factory, Record::new()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct FixtureRecipe {
    model: String,
    refs: Vec<String>,
}

impl FixtureRecipe {
    pub fn new<I, S>(model: impl Into<String>, refs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            model: model.into(),
            refs: refs.into_iter().map(Into::into).collect(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn refs(&self) -> &[String] {
        &self.refs
    }

    /// Create one record with `data` merged over the generated fields.
    ///
    /// A missing `_id` is minted by the factory's store.
    pub async fn create(&self, factory: &FixtureFactory, mut data: Record) -> Result<Record> {
        match data.get(ID_FIELD) {
            Some(id) if !factory.store().is_native_id(id) => {
                return Err(FactoryError::Validation(
                    "_id must be a native identifier".to_string(),
                ));
            }
            Some(_) => {}
            None => {
                data.insert(ID_FIELD.to_string(), factory.store().new_id());
            }
        }

        let refs = self
            .refs
            .iter()
            .map(|name| {
                factory
                    .fixture(name)
                    .cloned()
                    .ok_or_else(|| FactoryError::NotFound(name.clone()))
            })
            .collect::<Result<Vec<FixtureSchema>>>()?;

        let mut created = factory
            .create_list(&self.model, 1, Overrides::Cycle(vec![data]), &refs)
            .await?;
        created.pop().ok_or_else(|| {
            FactoryError::Configuration(format!("no record created for '{}'", self.model))
        })
    }
}
