use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
    sync::Arc,
};

use apollo_compiler::Schema;
use url::Url;

use crate::{
    adapter::Adapter,
    execute::{Executor, GraphqlRequest, GraphqlResponse, HttpExecutor},
    lookup::{GeneratedAnswer, LookupTable},
    prompt::{compress_type_defs, ResponseFormat},
    response::Variables,
    retry::RetryController,
    schema::NormalizedSchema,
    Error,
};

/// How many times a rejected answer is sent back to the model by default.
pub const DEFAULT_MAX_RETRIES: usize = 5;

/// Where the schema comes from.
#[derive(Debug, Clone)]
pub enum SchemaSource {
    /// Inline type definitions, already normalized.
    TypeDefs(NormalizedSchema),
    /// A live endpoint to introspect.
    Url { url: Url, headers: Vec<(String, String)> },
    /// A schema built in process.
    Schema(Box<Schema>),
}

/// Configuration of a [`GqlptClient`].
///
/// ```no_run
/// # use std::sync::Arc;
/// # fn adapter() -> Arc<dyn gqlpt::Adapter> { unimplemented!() }
/// let options = gqlpt::ClientOptions::new(adapter())
///     .with_type_defs("type Query { hello: String }")
///     .with_max_retries(2);
/// ```
#[derive(Clone)]
pub struct ClientOptions {
    adapter: Arc<dyn Adapter>,
    type_defs: Option<String>,
    url: Option<Url>,
    headers: Vec<(String, String)>,
    schema: Option<Schema>,
    generated_path: Option<PathBuf>,
    max_retries: usize,
    excluded_field_names: BTreeSet<String>,
    executor: Option<Arc<dyn Executor>>,
}

impl ClientOptions {
    pub fn new(adapter: Arc<dyn Adapter>) -> Self {
        Self {
            adapter,
            type_defs: None,
            url: None,
            headers: Vec::new(),
            schema: None,
            generated_path: None,
            max_retries: DEFAULT_MAX_RETRIES,
            excluded_field_names: BTreeSet::new(),
            executor: None,
        }
    }

    #[must_use]
    pub fn with_type_defs(mut self, type_defs: impl Into<String>) -> Self {
        self.type_defs = Some(type_defs.into());
        self
    }

    /// A GraphQL endpoint to introspect the schema from. Also the default
    /// target of [`GqlptClient::generate_and_send`].
    #[must_use]
    pub fn with_url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }

    /// Headers sent with introspection and with generated operations.
    #[must_use]
    pub fn with_headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers = headers.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// A lookup file with answers generated ahead of time.
    #[must_use]
    pub fn with_generated_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.generated_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Fields that must never appear in a generated operation.
    #[must_use]
    pub fn with_excluded_field_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_field_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Runs generated operations in process instead of over HTTP.
    #[must_use]
    pub fn with_executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = Some(executor);
        self
    }
}

/// Per call overrides of [`GqlptClient::generate_and_send`].
#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    pub url: Option<Url>,
    pub headers: Option<Vec<(String, String)>>,
}

impl SendOptions {
    #[must_use]
    pub fn with_url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }

    #[must_use]
    pub fn with_headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers = Some(headers.into_iter().collect());
        self
    }
}

/// A generated operation together with the TypeScript type of its result.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedBuildAnswer {
    pub query: String,
    pub variables: Variables,
    pub type_definition: String,
}

struct Connected {
    schema: NormalizedSchema,
    compressed_schema: String,
    lookup: LookupTable,
}

/// Translates plain text questions into GraphQL operations for one schema.
pub struct GqlptClient {
    adapter: Arc<dyn Adapter>,
    source: SchemaSource,
    headers: Vec<(String, String)>,
    generated_path: Option<PathBuf>,
    max_retries: usize,
    excluded_field_names: BTreeSet<String>,
    executor: Option<Arc<dyn Executor>>,
    connected: Option<Connected>,
}

impl GqlptClient {
    /// Checks the options. Inline type definitions are parsed here, before
    /// anything talks to the network.
    ///
    /// # Errors
    ///
    /// When not exactly one schema source is configured, or the type
    /// definitions are not a valid schema.
    pub fn new(options: ClientOptions) -> Result<Self, Error> {
        let ClientOptions {
            adapter,
            type_defs,
            url,
            headers,
            schema,
            generated_path,
            max_retries,
            excluded_field_names,
            executor,
        } = options;

        let source = match (type_defs, url, schema) {
            (Some(type_defs), None, None) => SchemaSource::TypeDefs(NormalizedSchema::from_sdl(&type_defs)?),
            (None, Some(url), None) => SchemaSource::Url {
                url,
                headers: headers.clone(),
            },
            (None, None, Some(schema)) => SchemaSource::Schema(Box::new(schema)),
            (None, None, None) => return Err(Error::MissingSchemaSource),
            (type_defs, url, schema) => {
                let count = usize::from(type_defs.is_some()) + usize::from(url.is_some()) + usize::from(schema.is_some());
                return Err(Error::MultipleSchemaSources(count));
            }
        };

        Ok(Self {
            adapter,
            source,
            headers,
            generated_path,
            max_retries,
            excluded_field_names,
            executor,
            connected: None,
        })
    }

    /// Loads the schema, the generated answers for it and checks the adapter can reach its model.
    pub async fn connect(&mut self) -> Result<(), Error> {
        let schema = match &self.source {
            SchemaSource::TypeDefs(schema) => schema.clone(),
            SchemaSource::Url { url, headers } => NormalizedSchema::from_url(url, headers).await?,
            SchemaSource::Schema(schema) => NormalizedSchema::from_schema(schema)?,
        };

        tracing::info!(schema_hash = schema.hash(), "schema loaded");

        let lookup = match &self.generated_path {
            Some(path) => LookupTable::load(path, schema.hash()),
            None => LookupTable::default(),
        };

        self.adapter.connect().await?;

        self.connected = Some(Connected {
            compressed_schema: compress_type_defs(schema.sdl()),
            schema,
            lookup,
        });

        Ok(())
    }

    /// The canonical SDL of the schema, once connected.
    pub fn type_defs(&self) -> Option<&str> {
        self.connected.as_ref().map(|connected| connected.schema.sdl())
    }

    pub fn schema_hash(&self) -> Option<&str> {
        self.connected.as_ref().map(|connected| connected.schema.hash())
    }

    pub fn adapter(&self) -> &dyn Adapter {
        self.adapter.as_ref()
    }

    pub fn generated_path(&self) -> Option<&Path> {
        self.generated_path.as_deref()
    }

    /// Generates a schema valid operation answering `question`, with its variables.
    ///
    /// Answers from the lookup file are returned as they are, without asking the model.
    pub async fn generate_query_and_variables(&self, question: &str) -> Result<GeneratedAnswer, Error> {
        let connected = self.connected()?;

        if let Some(answer) = connected.lookup.get(question) {
            tracing::debug!(question, "answered from generated queries");
            return Ok(answer.clone());
        }

        let accepted = self.controller(connected).run(question, ResponseFormat::Query).await?;

        Ok(accepted.answer)
    }

    /// Like [`Self::generate_query_and_variables`], but also asks for the
    /// TypeScript type of the result. The lookup file is not consulted.
    pub async fn generate_query_and_type_for_build(&self, question: &str) -> Result<GeneratedBuildAnswer, Error> {
        let connected = self.connected()?;

        let accepted = self
            .controller(connected)
            .run(question, ResponseFormat::QueryWithType)
            .await?;

        let type_definition = accepted
            .type_definition
            .ok_or_else(|| Error::MalformedResponse(String::from("missing field `typeDefinition`")))?;

        Ok(GeneratedBuildAnswer {
            query: accepted.answer.query,
            variables: accepted.answer.variables,
            type_definition,
        })
    }

    /// Generates an operation for `question` and runs it.
    ///
    /// The operation goes to the url of `options` if there is one, else to the
    /// configured executor, else to the url the schema was introspected from.
    /// Without any of these, this fails before the model is asked anything.
    pub async fn generate_and_send(&self, question: &str, options: SendOptions) -> Result<GraphqlResponse, Error> {
        let SendOptions { url, headers } = options;
        let headers = headers.unwrap_or_else(|| self.headers.clone());

        let http_executor;
        let executor: &dyn Executor = match (url, &self.executor, &self.source) {
            (Some(url), _, _) => {
                http_executor = HttpExecutor::new(url, headers);
                &http_executor
            }
            (None, Some(executor), _) => executor.as_ref(),
            (None, None, SchemaSource::Url { url, .. }) => {
                http_executor = HttpExecutor::new(url.clone(), headers);
                &http_executor
            }
            (None, None, _) => return Err(Error::MissingExecutionTarget),
        };

        let GeneratedAnswer { query, variables } = self.generate_query_and_variables(question).await?;

        executor.execute(GraphqlRequest { query, variables }).await
    }

    fn connected(&self) -> Result<&Connected, Error> {
        self.connected.as_ref().ok_or(Error::NotConnected)
    }

    fn controller<'c>(&'c self, connected: &'c Connected) -> RetryController<'c> {
        RetryController {
            adapter: self.adapter.as_ref(),
            schema: &connected.schema,
            compressed_schema: &connected.compressed_schema,
            max_retries: self.max_retries,
            excluded_field_names: &self.excluded_field_names,
        }
    }
}
