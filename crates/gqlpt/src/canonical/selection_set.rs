use super::arguments;
use graphql_parser::query::{Field, Selection, SelectionSet, TypeCondition};
use std::cmp::Ordering;

pub(super) fn normalize(selection_set: &mut SelectionSet<'static, String>) {
    for selection in &mut selection_set.items {
        normalize_selection(selection);
    }

    selection_set
        .items
        .sort_by(|a, b| sort_selection(a, b).then_with(|| printed(a).cmp(&printed(b))));
}

fn normalize_selection(selection: &mut Selection<'static, String>) {
    match selection {
        Selection::Field(field) => {
            arguments::normalize(&mut field.arguments);
            arguments::normalize_directives(&mut field.directives);

            normalize(&mut field.selection_set);
        }
        Selection::FragmentSpread(fragment) => {
            arguments::normalize_directives(&mut fragment.directives);
        }
        Selection::InlineFragment(fragment) => {
            arguments::normalize_directives(&mut fragment.directives);
            normalize(&mut fragment.selection_set);
        }
    }
}

fn sort_selection(a: &Selection<'static, String>, b: &Selection<'static, String>) -> Ordering {
    match (a, b) {
        (Selection::Field(a), Selection::Field(b)) => sort_field(a, b),
        (Selection::Field(_), Selection::FragmentSpread(_)) => Ordering::Less,
        (Selection::Field(_), Selection::InlineFragment(_)) => Ordering::Less,
        (Selection::FragmentSpread(_), Selection::Field(_)) => Ordering::Greater,
        (Selection::FragmentSpread(a), Selection::FragmentSpread(b)) => a.fragment_name.cmp(&b.fragment_name),
        (Selection::FragmentSpread(_), Selection::InlineFragment(_)) => Ordering::Less,
        (Selection::InlineFragment(_), Selection::Field(_)) => Ordering::Greater,
        (Selection::InlineFragment(_), Selection::FragmentSpread(_)) => Ordering::Greater,
        (Selection::InlineFragment(a), Selection::InlineFragment(b)) => match (&a.type_condition, &b.type_condition) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => match (a, b) {
                (TypeCondition::On(a), TypeCondition::On(b)) => a.cmp(b),
            },
        },
    }
}

// selections with the same key, such as two inline fragments on one type, fall back to their text
fn printed(selection: &Selection<'static, String>) -> String {
    match selection {
        Selection::Field(field) => field.to_string(),
        Selection::FragmentSpread(fragment) => fragment.to_string(),
        Selection::InlineFragment(fragment) => fragment.to_string(),
    }
}

// the same field selected twice under different aliases is ordered by alias
fn sort_field(a: &Field<'static, String>, b: &Field<'static, String>) -> Ordering {
    a.name.cmp(&b.name).then_with(|| {
        let a_alias = a.alias.as_ref().unwrap_or(&a.name);
        let b_alias = b.alias.as_ref().unwrap_or(&b.name);

        a_alias.cmp(b_alias)
    })
}
