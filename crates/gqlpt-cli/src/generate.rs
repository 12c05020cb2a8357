use std::sync::Arc;

use anyhow::{anyhow, Context};
use gqlpt::{Adapter, ClientOptions, GeneratedAnswer, GqlptClient};
use gqlpt_adapters::{AnthropicAdapter, AnthropicOptions, OllamaAdapter, OllamaOptions, OpenAiAdapter, OpenAiOptions};

use crate::{
    args::{AdapterKind, GenerateCommand},
    output::{self, TypeMap},
    scan,
};

pub(crate) async fn run(command: GenerateCommand) -> anyhow::Result<()> {
    let adapter = adapter(&command)?;
    let options = ClientOptions::new(adapter).with_max_retries(command.max_retries);

    let options = match &command.url {
        Some(url) => options.with_url(url.clone()).with_headers(command.headers.clone()),
        None => {
            let type_defs = std::fs::read_to_string(&command.type_defs)
                .with_context(|| format!("cannot read type definitions from {}", command.type_defs.display()))?;

            options.with_type_defs(type_defs)
        }
    };

    let mut client = GqlptClient::new(options)?;
    client.connect().await?;

    let schema_hash = client
        .schema_hash()
        .ok_or_else(|| anyhow!("the schema hash is known after connecting"))?
        .to_owned();

    tracing::info!("Scanning {}", command.source.display());
    let files = scan::source_files(&command.source)?;
    tracing::info!("Found {} source files", files.len());

    let questions = scan::collect_questions(&files)?;
    tracing::info!("Generating {} queries", questions.len());

    let mut types = TypeMap::default();
    let mut cache = output::load_query_cache(&command.generated_path)?;

    for question in questions {
        let answer = client
            .generate_query_and_type_for_build(&question)
            .await
            .with_context(|| format!("cannot generate a query for \"{question}\""))?;

        tracing::debug!(question = %question, "generated");

        types.insert(question.clone(), answer.type_definition);
        cache.insert(
            &schema_hash,
            question,
            GeneratedAnswer {
                query: answer.query,
                variables: answer.variables,
            },
        );
    }

    let types = types.render()?;
    let queries = cache.to_json()?;

    if command.raw {
        println!("{types}");
    } else {
        output::write(&command.output, &types)?;
        tracing::info!("Wrote type definitions to {}", command.output.display());
    }

    if command.raw_queries {
        println!("{queries}");
    } else {
        output::write(&command.generated_path, &queries)?;
        tracing::info!("Wrote generated queries to {}", command.generated_path.display());
    }

    Ok(())
}

fn adapter(command: &GenerateCommand) -> anyhow::Result<Arc<dyn Adapter>> {
    let adapter: Arc<dyn Adapter> = match command.adapter {
        AdapterKind::OpenAi => {
            let mut options = OpenAiOptions::new(api_key(command)?);

            if let Some(model) = &command.model {
                options = options.with_model(model);
            }

            Arc::new(OpenAiAdapter::new(options)?)
        }
        AdapterKind::Anthropic => {
            let mut options = AnthropicOptions::new(api_key(command)?);

            if let Some(model) = &command.model {
                options = options.with_model(model);
            }

            Arc::new(AnthropicAdapter::new(options)?)
        }
        AdapterKind::Ollama => {
            let mut options = OllamaOptions::default().with_base_url(&command.ollama_url);

            if let Some(model) = &command.model {
                options = options.with_model(model);
            }

            Arc::new(OllamaAdapter::new(options)?)
        }
    };

    Ok(adapter)
}

fn api_key(command: &GenerateCommand) -> anyhow::Result<String> {
    if let Some(key) = &command.key {
        return Ok(key.clone());
    }

    let Some(variable) = command.adapter.key_variable() else {
        return Ok(String::new());
    };

    std::env::var(variable).map_err(|_| anyhow!("{variable} is required, set it or pass --key"))
}
