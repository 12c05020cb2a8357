//! The schema generated operations are written against.
//!
//! Whatever the source, the schema is printed back to SDL in one canonical
//! shape: built-in scalars and directives are dropped, every definition list is
//! sorted by name. The hash of that text identifies the schema, so two schemas
//! that only differ in whitespace, comments or declaration order share a hash.
//! Type and schema extensions are folded into the definitions they extend, so
//! `type Query { a: Int } extend type Query { b: Int }` hashes like
//! `type Query { a: Int b: Int }`.

mod introspection;

use std::{cmp::Ordering, collections::HashSet};

use apollo_compiler::{
    collections::IndexSet,
    schema::{Component, ComponentName, ComponentOrigin, DirectiveList, ExtendedType},
    validation::Valid,
    Schema,
};
use graphql_parser::schema::{Definition, Document, SchemaDefinition, TypeDefinition};
use sha2::{Digest, Sha256};
use url::Url;

use crate::Error;

const BUILTIN_DIRECTIVES: &[&str] = &["deprecated", "include", "skip", "specifiedBy"];
const BUILTIN_SCALARS: &[&str] = &["Boolean", "Float", "ID", "Int", "String"];

/// A schema in canonical form, with its hash.
#[derive(Debug, Clone)]
pub struct NormalizedSchema {
    sdl: String,
    hash: String,
    schema: Valid<Schema>,
}

impl NormalizedSchema {
    /// Normalizes inline type definitions.
    ///
    /// # Errors
    ///
    /// [`Error::SchemaParse`] when the text is not a valid schema.
    pub fn from_sdl(type_defs: &str) -> Result<Self, Error> {
        let schema = parse_and_validate(type_defs)?;
        let sdl = print_normalized(&schema)?;
        let hash = hash_sdl(&sdl);

        Ok(Self { sdl, hash, schema })
    }

    /// Fetches the schema of a live endpoint with the standard introspection query.
    ///
    /// # Errors
    ///
    /// [`Error::Introspection`] when the endpoint cannot be reached, answers
    /// with an error status or with GraphQL errors.
    pub async fn from_url(url: &Url, headers: &[(String, String)]) -> Result<Self, Error> {
        let sdl = introspection::introspect(url, headers).await?;
        Self::from_sdl(&sdl)
    }

    /// Normalizes a schema that was built in process.
    pub fn from_schema(schema: &Schema) -> Result<Self, Error> {
        Self::from_sdl(&schema.to_string())
    }

    /// The canonical SDL.
    pub fn sdl(&self) -> &str {
        &self.sdl
    }

    /// Hex encoded SHA-256 of the canonical SDL.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// The validated schema, for validating operations against.
    pub fn schema(&self) -> &Valid<Schema> {
        &self.schema
    }
}

/// Parses and validates `type_defs` and prints it in canonical form.
pub fn normalize_sdl(type_defs: &str) -> Result<String, Error> {
    let schema = parse_and_validate(type_defs)?;
    print_normalized(&schema)
}

// built-in scalars are allowed to be spelled out, introspection output often does
fn parse_and_validate(type_defs: &str) -> Result<Valid<Schema>, Error> {
    Schema::builder()
        .ignore_builtin_redefinitions()
        .parse(type_defs, "schema.graphql")
        .build()
        .and_then(Schema::validate)
        .map_err(|invalid| Error::SchemaParse(invalid.errors.to_string()))
}

fn print_normalized(schema: &Schema) -> Result<String, Error> {
    let mut merged = schema.clone();
    fold_extensions(&mut merged);

    let printed = merged.to_string();
    let mut document =
        graphql_parser::parse_schema::<&str>(&printed).map_err(|err| Error::SchemaParse(err.to_string()))?;
    normalize(&mut document);

    Ok(document.to_string())
}

/// Marks every component as coming from the main definition. The printer then
/// writes one definition per type instead of a definition and its `extend` blocks.
fn fold_extensions(schema: &mut Schema) {
    let definition = schema.schema_definition.make_mut();
    fold_directives(&mut definition.directives);

    for root in [&mut definition.query, &mut definition.mutation, &mut definition.subscription]
        .into_iter()
        .flatten()
    {
        root.origin = ComponentOrigin::Definition;
    }

    for ty in schema.types.values_mut().filter(|ty| !ty.is_built_in()) {
        match ty {
            ExtendedType::Scalar(scalar) => fold_directives(&mut scalar.make_mut().directives),
            ExtendedType::Object(object) => {
                let object = object.make_mut();

                object.implements_interfaces = fold_names(&object.implements_interfaces);
                fold_directives(&mut object.directives);
                fold_components(object.fields.values_mut());
            }
            ExtendedType::Interface(interface) => {
                let interface = interface.make_mut();

                interface.implements_interfaces = fold_names(&interface.implements_interfaces);
                fold_directives(&mut interface.directives);
                fold_components(interface.fields.values_mut());
            }
            ExtendedType::Union(union) => {
                let union = union.make_mut();

                union.members = fold_names(&union.members);
                fold_directives(&mut union.directives);
            }
            ExtendedType::Enum(enumeration) => {
                let enumeration = enumeration.make_mut();

                fold_directives(&mut enumeration.directives);
                fold_components(enumeration.values.values_mut());
            }
            ExtendedType::InputObject(input) => {
                let input = input.make_mut();

                fold_directives(&mut input.directives);
                fold_components(input.fields.values_mut());
            }
        }
    }
}

fn fold_directives(directives: &mut DirectiveList) {
    fold_components(directives.0.iter_mut());
}

fn fold_components<'a, T: 'a>(components: impl Iterator<Item = &'a mut Component<T>>) {
    for component in components {
        component.origin = ComponentOrigin::Definition;
    }
}

fn fold_names(names: &IndexSet<ComponentName>) -> IndexSet<ComponentName> {
    names.iter().map(|name| ComponentName::from(&name.name)).collect()
}

fn hash_sdl(sdl: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(sdl.as_bytes());

    hex::encode(hasher.finalize())
}

fn normalize<'a>(document: &mut Document<'a, &'a str>) {
    let type_names: HashSet<&str> = document
        .definitions
        .iter()
        .filter_map(|definition| match definition {
            Definition::TypeDefinition(definition) => Some(type_name(definition)),
            _ => None,
        })
        .collect();

    document.definitions.retain(|definition| match definition {
        Definition::SchemaDefinition(schema) => !is_implicit(schema, &type_names),
        _ => true,
    });

    for definition in &mut document.definitions {
        match definition {
            Definition::SchemaDefinition(_) => (),
            Definition::DirectiveDefinition(directive) => {
                directive.arguments.sort_by(|a, b| a.name.cmp(b.name));
            }
            Definition::TypeDefinition(definition) => normalize_type(definition),
            // extensions are folded into their types before printing
            Definition::TypeExtension(_) => (),
        }
    }

    document.definitions.sort_by(sort_definition);
}

// a schema definition that only spells out the default root types says nothing
fn is_implicit<'a>(schema: &SchemaDefinition<'a, &'a str>, type_names: &HashSet<&str>) -> bool {
    let roots = [
        (schema.query, "Query"),
        (schema.mutation, "Mutation"),
        (schema.subscription, "Subscription"),
    ];

    schema.directives.is_empty()
        && roots.iter().all(|(root, default)| match root {
            Some(name) => name == default,
            None => !type_names.contains(default),
        })
}

fn normalize_type<'a>(definition: &mut TypeDefinition<'a, &'a str>) {
    match definition {
        TypeDefinition::Scalar(_) => (),
        TypeDefinition::Object(object) => {
            object.implements_interfaces.sort_unstable();
            object.fields.sort_by(|a, b| a.name.cmp(b.name));

            for field in &mut object.fields {
                field.arguments.sort_by(|a, b| a.name.cmp(b.name));
            }
        }
        TypeDefinition::Interface(interface) => {
            interface.implements_interfaces.sort_unstable();
            interface.fields.sort_by(|a, b| a.name.cmp(b.name));

            for field in &mut interface.fields {
                field.arguments.sort_by(|a, b| a.name.cmp(b.name));
            }
        }
        TypeDefinition::Union(union) => union.types.sort_unstable(),
        TypeDefinition::Enum(enumeration) => enumeration.values.sort_by(|a, b| a.name.cmp(b.name)),
        TypeDefinition::InputObject(input) => input.fields.sort_by(|a, b| a.name.cmp(b.name)),
    }
}

// schema definition, then directives, then types; by name within each group
fn sort_definition<'a>(a: &Definition<'a, &'a str>, b: &Definition<'a, &'a str>) -> Ordering {
    fn key<'a>(definition: &Definition<'a, &'a str>) -> (u8, &'a str) {
        match definition {
            Definition::SchemaDefinition(_) => (0, ""),
            Definition::DirectiveDefinition(directive) => (1, directive.name),
            Definition::TypeDefinition(definition) => (2, type_name(definition)),
            Definition::TypeExtension(_) => (3, ""),
        }
    }

    key(a).cmp(&key(b))
}

fn type_name<'a>(definition: &TypeDefinition<'a, &'a str>) -> &'a str {
    match definition {
        TypeDefinition::Scalar(scalar) => scalar.name,
        TypeDefinition::Object(object) => object.name,
        TypeDefinition::Interface(interface) => interface.name,
        TypeDefinition::Union(union) => union.name,
        TypeDefinition::Enum(enumeration) => enumeration.name,
        TypeDefinition::InputObject(input) => input.name,
    }
}
