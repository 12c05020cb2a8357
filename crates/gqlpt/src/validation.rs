//! Checks a generated operation has to pass before it is handed to the caller.

use std::collections::{BTreeSet, HashMap, HashSet};

use apollo_compiler::{validation::Valid, ExecutableDocument, Schema};
use graphql_parser::query::{Definition, Document, FragmentDefinition, OperationDefinition, Selection, SelectionSet};

/// Validates `query` against `schema`, returning every message that rejects it.
///
/// An empty list means the operation is valid. A query that does not even parse
/// is reported as messages too.
pub fn validate_against_schema(schema: &Valid<Schema>, query: &str) -> Vec<String> {
    match ExecutableDocument::parse_and_validate(schema, query, "query.graphql") {
        Ok(_) => Vec::new(),
        Err(invalid) => invalid
            .errors
            .iter()
            .map(|diagnostic| diagnostic.error.to_string())
            .collect(),
    }
}

/// Finds every selection of a field from `excluded_field_names`, at any depth,
/// in every operation of the document.
///
/// Fragment spreads are followed into their definitions, so hiding a field in
/// a fragment does not get it past the check.
pub fn validate_excluded_fields<'a>(
    document: &Document<'a, &'a str>,
    excluded_field_names: &BTreeSet<String>,
) -> Vec<String> {
    if excluded_field_names.is_empty() {
        return Vec::new();
    }

    let fragments: HashMap<&str, &FragmentDefinition<'a, &'a str>> = document
        .definitions
        .iter()
        .filter_map(|definition| match definition {
            Definition::Fragment(fragment) => Some((fragment.name, fragment)),
            Definition::Operation(_) => None,
        })
        .collect();

    let mut errors = Vec::new();

    for definition in &document.definitions {
        let Definition::Operation(operation) = definition else {
            continue;
        };

        let (operation_type, selection_set) = match operation {
            OperationDefinition::SelectionSet(selection_set) => ("query", selection_set),
            OperationDefinition::Query(query) => ("query", &query.selection_set),
            OperationDefinition::Mutation(mutation) => ("mutation", &mutation.selection_set),
            OperationDefinition::Subscription(subscription) => ("subscription", &subscription.selection_set),
        };

        let mut walker = ExclusionWalker {
            operation_type,
            excluded_field_names,
            fragments: &fragments,
            visited_fragments: HashSet::new(),
            errors: &mut errors,
        };

        walker.walk(selection_set);
    }

    errors
}

struct ExclusionWalker<'w, 'a> {
    operation_type: &'static str,
    excluded_field_names: &'w BTreeSet<String>,
    fragments: &'w HashMap<&'a str, &'w FragmentDefinition<'a, &'a str>>,
    visited_fragments: HashSet<&'a str>,
    errors: &'w mut Vec<String>,
}

impl<'w, 'a> ExclusionWalker<'w, 'a> {
    fn walk(&mut self, selection_set: &SelectionSet<'a, &'a str>) {
        for selection in &selection_set.items {
            match selection {
                Selection::Field(field) => {
                    if self.excluded_field_names.contains(field.name) {
                        self.errors.push(format!(
                            "Field \"{}\" is excluded and cannot be used in a {}",
                            field.name, self.operation_type
                        ));
                    }

                    // keep going, every violation is reported in one pass
                    self.walk(&field.selection_set);
                }
                Selection::FragmentSpread(spread) => {
                    if !self.visited_fragments.insert(spread.fragment_name) {
                        continue;
                    }

                    if let Some(fragment) = self.fragments.get(spread.fragment_name) {
                        self.walk(&fragment.selection_set);
                    }
                }
                Selection::InlineFragment(fragment) => self.walk(&fragment.selection_set),
            }
        }
    }
}
