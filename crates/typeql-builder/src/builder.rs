//! Registry of things for one query.

use crate::compile::{compile_clause, Category};
use crate::error::QueryError;
use crate::thing::{Entity, Relationship};
use std::collections::HashSet;
use tracing::debug;

/// Builds a single TypeQL statement.
///
/// Things are registered under `match` or `insert`, each as an entity or a
/// relationship. Variable names are unique across all four registries.
///
/// ```
/// use typeql_builder::{QueryBuilder, Thing};
///
/// let mut builder = QueryBuilder::new();
/// builder
///     .match_entity("protein", "p1")?
///     .has("protein_name", "ACE")
///     .has("protein_id", "Q1");
///
/// assert_eq!(
///     builder.compile_query()?,
///     r#"match $p1 isa protein, has protein_name "ACE", has protein_id "Q1"; "#
/// );
/// # Ok::<(), typeql_builder::QueryError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    query: String,
    match_entities: Vec<Entity>,
    match_relationships: Vec<Relationship>,
    insert_entities: Vec<Entity>,
    insert_relationships: Vec<Relationship>,
    variables: HashSet<String>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity to be matched.
    pub fn match_entity(
        &mut self,
        entity_type: &str,
        variable: &str,
    ) -> Result<&mut Entity, QueryError> {
        self.claim_variable(variable)?;
        Ok(push(&mut self.match_entities, Entity::new(entity_type, variable)))
    }

    /// Register a relationship to be matched.
    pub fn match_relationship(
        &mut self,
        relationship_type: &str,
        variable: &str,
    ) -> Result<&mut Relationship, QueryError> {
        self.claim_variable(variable)?;
        Ok(push(
            &mut self.match_relationships,
            Relationship::new(relationship_type, variable),
        ))
    }

    /// Register an entity to be inserted.
    pub fn insert_entity(
        &mut self,
        entity_type: &str,
        variable: &str,
    ) -> Result<&mut Entity, QueryError> {
        self.claim_variable(variable)?;
        Ok(push(&mut self.insert_entities, Entity::new(entity_type, variable)))
    }

    /// Register a relationship to be inserted.
    pub fn insert_relationship(
        &mut self,
        relationship_type: &str,
        variable: &str,
    ) -> Result<&mut Relationship, QueryError> {
        self.claim_variable(variable)?;
        Ok(push(
            &mut self.insert_relationships,
            Relationship::new(relationship_type, variable),
        ))
    }

    /// Compile the registered things into query text.
    ///
    /// Always recomputes from the current registry, so it can be called again
    /// after further changes. On error the previous query text is kept.
    pub fn compile_query(&mut self) -> Result<&str, QueryError> {
        let match_clause = compile_clause(
            Category::Match,
            &self.match_entities,
            &self.match_relationships,
            &self.variables,
        )?;
        let insert_clause = compile_clause(
            Category::Insert,
            &self.insert_entities,
            &self.insert_relationships,
            &self.variables,
        )?;

        self.query = format!("{match_clause}{insert_clause}");
        debug!("Compiled TypeQL query: {}", self.query);
        Ok(&self.query)
    }

    /// The most recently compiled query, empty if never compiled.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Whether a variable name is already registered.
    pub fn contains_variable(&self, variable: &str) -> bool {
        self.variables.contains(variable)
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn match_entities(&self) -> &[Entity] {
        &self.match_entities
    }

    pub fn match_relationships(&self) -> &[Relationship] {
        &self.match_relationships
    }

    pub fn insert_entities(&self) -> &[Entity] {
        &self.insert_entities
    }

    pub fn insert_relationships(&self) -> &[Relationship] {
        &self.insert_relationships
    }

    fn claim_variable(&mut self, variable: &str) -> Result<(), QueryError> {
        if !self.variables.insert(variable.to_string()) {
            return Err(QueryError::DuplicateVariable(variable.to_string()));
        }
        Ok(())
    }
}

fn push<T>(things: &mut Vec<T>, thing: T) -> &mut T {
    let index = things.len();
    things.push(thing);
    // in bounds: just pushed
    &mut things[index]
}
