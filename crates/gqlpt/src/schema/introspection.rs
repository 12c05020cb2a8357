use cynic::{http::ReqwestExt, QueryBuilder};
use cynic_introspection::{query::IntrospectionQuery, Schema, Type};
use reqwest::header::USER_AGENT;
use url::Url;

use super::{BUILTIN_DIRECTIVES, BUILTIN_SCALARS};
use crate::Error;

/// Runs the standard introspection query against `url` and prints the result as SDL.
pub(super) async fn introspect(url: &Url, headers: &[(String, String)]) -> Result<String, Error> {
    let mut builder = reqwest::Client::new()
        .post(url.clone())
        .header(USER_AGENT, "gqlpt")
        .header("Accept", "application/json");

    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }

    let response = builder
        .run_graphql(IntrospectionQuery::build(()))
        .await
        .map_err(|err| Error::Introspection(err.to_string()))?;

    if let Some(errors) = response.errors.filter(|errors| !errors.is_empty()) {
        let messages = errors.into_iter().map(|error| error.message).collect::<Vec<_>>();
        return Err(Error::Introspection(messages.join("; ")));
    }

    let Some(data) = response.data else {
        return Err(Error::Introspection(String::from("no data in the introspection response")));
    };

    let mut schema = data
        .into_schema()
        .map_err(|err| Error::Introspection(err.to_string()))?;

    filter_builtins(&mut schema);

    tracing::debug!(%url, types = schema.types.len(), "introspected schema");

    Ok(schema.to_sdl())
}

fn filter_builtins(schema: &mut Schema) {
    schema
        .directives
        .retain(|directive| !BUILTIN_DIRECTIVES.contains(&directive.name.as_str()));

    schema.types.retain(|ty| {
        if let Type::Scalar(scalar) = ty {
            if BUILTIN_SCALARS.contains(&scalar.name.as_str()) {
                return false;
            }
        }

        !ty.name().starts_with("__")
    });
}
