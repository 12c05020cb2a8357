use graphql_parser::query::{Directive, Value};

pub(super) fn normalize(arguments: &mut [(String, Value<'static, String>)]) {
    arguments.sort_by(|(a, _), (b, _)| a.cmp(b));

    for (_, value) in arguments {
        keep_float_literals(value);
    }
}

pub(super) fn normalize_directives(directives: &mut [Directive<'static, String>]) {
    for directive in directives {
        normalize(&mut directive.arguments);
    }
}

/// The printer writes floats with `{}`, so `2.0` becomes the integer `2` and
/// `1e100` a hundred digit integer. The literal is kept in its `{:?}` form,
/// which always has a fraction or an exponent, as a raw token.
pub(super) fn keep_float_literals(value: &mut Value<'static, String>) {
    match value {
        Value::Float(float) => *value = Value::Enum(format!("{float:?}")),
        Value::List(values) => values.iter_mut().for_each(keep_float_literals),
        Value::Object(fields) => fields.values_mut().for_each(keep_float_literals),
        _ => (),
    }
}
