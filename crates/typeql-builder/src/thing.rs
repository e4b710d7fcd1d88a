//! Entities and relationships registered in a query.

use crate::error::QueryError;
use crate::value::AttributeValue;
use serde_json::Value;
use std::fmt;

/// Name of a query variable, stored without the leading `$`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Variable(String);

impl Variable {
    pub fn new(name: impl Into<String>) -> Self {
        Variable(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

impl From<&str> for Variable {
    fn from(name: &str) -> Self {
        Variable(name.to_string())
    }
}

impl From<String> for Variable {
    fn from(name: String) -> Self {
        Variable(name)
    }
}

impl From<&Variable> for Variable {
    fn from(var: &Variable) -> Self {
        var.clone()
    }
}

/// Attribute values keyed by attribute name, in first-insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<(String, Vec<AttributeValue>)>,
}

impl Attributes {
    /// Append a value to the named attribute, creating it if absent.
    pub fn push(&mut self, name: &str, value: AttributeValue) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((name.to_string(), vec![value])),
        }
    }

    /// Replace the named attribute's values, keeping its position if present.
    pub fn replace(&mut self, name: &str, values: Vec<AttributeValue>) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = values,
            None => self.entries.push((name.to_string(), values)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&[AttributeValue]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[AttributeValue])> {
        self.entries
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fields shared by every thing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThingCore {
    type_name: String,
    variable: Variable,
    attributes: Attributes,
}

impl ThingCore {
    fn new(type_name: &str, variable: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            variable: Variable::new(variable),
            attributes: Attributes::default(),
        }
    }
}

/// A typed graph element bound to a variable that accumulates attributes.
///
/// All attribute methods return `&mut Self` so calls can be chained straight
/// off the builder:
///
/// ```
/// use typeql_builder::{QueryBuilder, Thing};
///
/// let mut builder = QueryBuilder::new();
/// builder
///     .match_entity("protein", "p1")?
///     .has("protein_name", "ACE")
///     .has_typed("mass", 42.5, "double");
/// # Ok::<(), typeql_builder::QueryError>(())
/// ```
pub trait Thing {
    fn core(&self) -> &ThingCore;

    fn core_mut(&mut self) -> &mut ThingCore;

    fn type_name(&self) -> &str {
        &self.core().type_name
    }

    fn variable(&self) -> &Variable {
        &self.core().variable
    }

    fn attributes(&self) -> &Attributes {
        &self.core().attributes
    }

    /// Add a `string` attribute value.
    fn has(&mut self, attribute: &str, value: impl Into<String>) -> &mut Self
    where
        Self: Sized,
    {
        self.has_value(attribute, AttributeValue::text(value))
    }

    /// Add an attribute value with an explicit type tag (`double`, `long`, ...).
    fn has_typed(&mut self, attribute: &str, value: impl ToString, value_type: &str) -> &mut Self
    where
        Self: Sized,
    {
        self.has_value(attribute, AttributeValue::typed(value, value_type))
    }

    fn has_value(&mut self, attribute: &str, value: AttributeValue) -> &mut Self
    where
        Self: Sized,
    {
        self.core_mut().attributes.push(attribute, value);
        self
    }

    /// Set several attributes from a JSON map of the form
    /// `{"name": [{"value": ..., "type": ...}, ...], ...}`.
    ///
    /// Each listed attribute replaces any values already recorded under that
    /// name. Nothing is changed if the map is malformed.
    fn has_many(&mut self, attributes: &Value) -> Result<&mut Self, QueryError>
    where
        Self: Sized,
    {
        let map = attributes.as_object().ok_or_else(|| {
            QueryError::Validation("attributes must be a map of attribute name to list".into())
        })?;

        let mut parsed = Vec::with_capacity(map.len());
        for (name, entries) in map {
            let entries = entries.as_array().ok_or_else(|| {
                QueryError::Validation(format!("attribute '{name}' must map to a list"))
            })?;
            let values = entries
                .iter()
                .map(|entry| AttributeValue::from_json(name, entry))
                .collect::<Result<Vec<_>, _>>()?;
            parsed.push((name, values));
        }

        let core = self.core_mut();
        for (name, values) in parsed {
            core.attributes.replace(name, values);
        }
        Ok(self)
    }
}

/// An entity: a thing with attributes only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    core: ThingCore,
}

impl Entity {
    pub fn new(type_name: &str, variable: &str) -> Self {
        Self {
            core: ThingCore::new(type_name, variable),
        }
    }
}

impl Thing for Entity {
    fn core(&self) -> &ThingCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ThingCore {
        &mut self.core
    }
}

/// A relationship: a thing that also relates other things through roles.
///
/// Role players are held by variable and resolved when the owning builder
/// compiles the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    core: ThingCore,
    related: Vec<(String, Variable)>,
}

impl Relationship {
    pub fn new(type_name: &str, variable: &str) -> Self {
        Self {
            core: ThingCore::new(type_name, variable),
            related: Vec::new(),
        }
    }

    /// Add a role player.
    pub fn relates(&mut self, role: &str, target: impl Into<Variable>) -> &mut Self {
        self.related.push((role.to_string(), target.into()));
        self
    }

    /// Add several role players that all play the same role.
    pub fn relates_many<I, V>(&mut self, role: &str, targets: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Variable>,
    {
        self.related.extend(
            targets
                .into_iter()
                .map(|target| (role.to_string(), target.into())),
        );
        self
    }

    /// Role players in the order they were added.
    pub fn related(&self) -> &[(String, Variable)] {
        &self.related
    }
}

impl Thing for Relationship {
    fn core(&self) -> &ThingCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ThingCore {
        &mut self.core
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_has_appends_in_order() {
        let mut entity = Entity::new("person", "x");
        entity.has("name", "a").has("email", "e").has("name", "b");

        let names: Vec<&str> = entity.attributes().iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["name", "email"]);
        assert_eq!(
            entity.attributes().get("name").unwrap(),
            &[AttributeValue::text("a"), AttributeValue::text("b")]
        );
    }

    #[test]
    fn test_has_many_overwrites_existing_list() {
        let mut entity = Entity::new("protein", "p2");
        entity.has("protein_name", "old").has("source", "uniprot");
        entity
            .has_many(&json!({
                "protein_name": [{"value": "ACE2"}],
                "id": [{"value": 1, "type": "double"}]
            }))
            .unwrap();

        let attrs = entity.attributes();
        assert_eq!(attrs.get("protein_name").unwrap(), &[AttributeValue::text("ACE2")]);
        assert_eq!(attrs.get("id").unwrap(), &[AttributeValue::numeric(1)]);
        let names: Vec<&str> = attrs.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["protein_name", "source", "id"]);
    }

    #[test]
    fn test_has_many_rejects_malformed_maps() {
        let mut entity = Entity::new("protein", "p");
        entity.has("protein_name", "ACE");

        for bad in [
            json!(["protein_name"]),
            json!({"protein_name": "ACE2"}),
            json!({"protein_name": [{"value": "ACE2"}], "id": {"value": 1}}),
        ] {
            let err = entity.has_many(&bad).unwrap_err();
            assert!(matches!(err, QueryError::Validation(_)), "{bad}");
        }

        // failed calls leave the thing untouched
        assert_eq!(entity.attributes().len(), 1);
        assert_eq!(
            entity.attributes().get("protein_name").unwrap(),
            &[AttributeValue::text("ACE")]
        );
    }

    #[test]
    fn test_relates_many_pairs_each_target_with_role() {
        let mut rel = Relationship::new("complex", "c");
        rel.relates("member", "a").relates_many("member", ["b", "c2"]);

        let roles: Vec<(&str, &str)> = rel
            .related()
            .iter()
            .map(|(role, var)| (role.as_str(), var.name()))
            .collect();
        assert_eq!(roles, vec![("member", "a"), ("member", "b"), ("member", "c2")]);
    }

    #[test]
    fn test_variable_display() {
        assert_eq!(Variable::new("p1").to_string(), "$p1");
    }
}
