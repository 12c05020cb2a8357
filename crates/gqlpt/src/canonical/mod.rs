//! Canonical rendering of generated operations.
//!
//! Models emit the same operation in many textual shapes. To make generated
//! queries reproducible and diffable, every document goes through these steps
//! before it is printed:
//!
//! - Removal of operation names
//! - Anonymous queries without variables or directives use the `{ ... }` shorthand
//! - Reorder fields, arguments, variables and selections in alphabetic order
//! - Fragment definitions are ordered by name and placed before the operations
//! - Parse and render, removing comments, extra whitespace and other stylistic things
//!
//! Aliases and argument values are kept as-is; they change what the operation means.
//! Float literals keep their fraction or exponent, `2.0` does not turn into `2`.

mod arguments;
mod selection_set;


use std::{cmp::Ordering, mem};

use graphql_parser::query::{Definition, Document, OperationDefinition, ParseError, SelectionSet, VariableDefinition};

/// Parses `source_text` and renders it in canonical form.
pub fn canonicalize(source_text: &str) -> Result<String, ParseError> {
    let mut document = graphql_parser::parse_query::<String>(source_text)?.into_static();
    normalize(&mut document);

    Ok(document.to_string())
}

fn normalize(document: &mut Document<'static, String>) {
    for definition in &mut document.definitions {
        match definition {
            Definition::Operation(operation) => normalize_operation(operation),
            Definition::Fragment(fragment) => {
                arguments::normalize_directives(&mut fragment.directives);
                selection_set::normalize(&mut fragment.selection_set);
            }
        }
    }

    document.definitions.sort_by(|a, b| match (a, b) {
        (Definition::Operation(_), Definition::Fragment(_)) => Ordering::Greater,
        (Definition::Fragment(_), Definition::Operation(_)) => Ordering::Less,
        (Definition::Fragment(a), Definition::Fragment(b)) => a.name.cmp(&b.name),
        // operations keep the order the model wrote them in, validation rejects more than one
        (Definition::Operation(_), Definition::Operation(_)) => Ordering::Equal,
    });
}

fn normalize_operation(operation: &mut OperationDefinition<'static, String>) {
    let shorthand = match operation {
        OperationDefinition::SelectionSet(selection_set) => {
            selection_set::normalize(selection_set);
            None
        }
        OperationDefinition::Query(query) => {
            query.name = None;

            normalize_variables(&mut query.variable_definitions);
            arguments::normalize_directives(&mut query.directives);
            selection_set::normalize(&mut query.selection_set);

            if query.variable_definitions.is_empty() && query.directives.is_empty() {
                Some(SelectionSet {
                    span: query.selection_set.span,
                    items: mem::take(&mut query.selection_set.items),
                })
            } else {
                None
            }
        }
        OperationDefinition::Mutation(mutation) => {
            mutation.name = None;

            normalize_variables(&mut mutation.variable_definitions);
            arguments::normalize_directives(&mut mutation.directives);
            selection_set::normalize(&mut mutation.selection_set);
            None
        }
        OperationDefinition::Subscription(subscription) => {
            subscription.name = None;

            normalize_variables(&mut subscription.variable_definitions);
            arguments::normalize_directives(&mut subscription.directives);
            selection_set::normalize(&mut subscription.selection_set);
            None
        }
    };

    if let Some(selection_set) = shorthand {
        *operation = OperationDefinition::SelectionSet(selection_set);
    }
}

fn normalize_variables(variables: &mut [VariableDefinition<'static, String>]) {
    variables.sort_by(|a, b| a.name.cmp(&b.name));

    for default_value in variables.iter_mut().filter_map(|variable| variable.default_value.as_mut()) {
        arguments::keep_float_literals(default_value);
    }
}
