use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use judgment_prompt_proxy::judge::validation::{validate_prompt_gated, ValidatePromptParams};
use judgment_prompt_proxy::relevance::client::JudgeTransport;
use judgment_prompt_proxy::relevance::fields::{known_fields_from_query_set, load_known_fields};
use judgment_prompt_proxy::{
    build_full_prompt, extract_placeholders, get_prompt_template, validate_placeholders, Config, OutputSchema,
    PromptConstructor, RelevanceClient,
};

#[derive(Parser, Debug)]
#[command(name = "judgectl", about = "CLI for LLM judgment prompt templates", version)]
struct Cli {
    /// Override RELEVANCE_URL
    #[arg(global = true, long)]
    relevance_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct Instructions {
    /// User instructions inline
    #[arg(long, conflicts_with = "file")]
    text: Option<String>,
    /// Read user instructions from a file
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,
}

impl Instructions {
    async fn load(&self) -> Result<String, Box<dyn std::error::Error>> {
        match (&self.text, &self.file) {
            (Some(t), _) => Ok(t.clone()),
            (None, Some(path)) => Ok(tokio::fs::read_to_string(path).await?),
            (None, None) => Ok(String::new()),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List output schemas
    Schemas,
    /// Extract placeholders and check them against a query set's fields
    Placeholders {
        #[command(flatten)]
        instructions: Instructions,
        /// Known field (repeatable); overrides --query-set
        #[arg(long = "field", value_name = "NAME")]
        fields: Vec<String>,
        /// Query set whose first record supplies the known fields
        #[arg(long)]
        query_set: Option<String>,
    },
    /// Print the full prompt sent to the judge model
    Build {
        #[arg(long, default_value = "SCORE_0_1")]
        schema: OutputSchema,
        #[command(flatten)]
        instructions: Instructions,
        /// Substitute sample values as KEY=VALUE (repeatable)
        #[arg(long = "value", value_name = "KEY=VALUE")]
        values: Vec<String>,
    },
    /// Print the persistable template record as JSON
    Template {
        #[arg(long, default_value = "SCORE_0_1")]
        schema: OutputSchema,
        #[command(flatten)]
        instructions: Instructions,
    },
    /// Show the known fields of a query set
    Fields {
        query_set: String,
    },
    /// Try a template against a judge model
    Validate {
        #[arg(long, default_value = "SCORE_0_1")]
        schema: OutputSchema,
        #[command(flatten)]
        instructions: Instructions,
        /// Model id registered with the judgment service
        #[arg(long)]
        model_id: Option<String>,
        /// Search configuration id (repeatable)
        #[arg(long = "search-configuration", value_name = "ID")]
        search_configurations: Vec<String>,
        /// Context field (repeatable)
        #[arg(long = "context-field", value_name = "NAME")]
        context_fields: Vec<String>,
        /// Sample placeholder value as KEY=VALUE (repeatable)
        #[arg(long = "value", value_name = "KEY=VALUE")]
        values: Vec<String>,
        #[arg(long)]
        size: Option<u32>,
        #[arg(long)]
        token_limit: Option<u32>,
        #[arg(long)]
        ignore_failure: bool,
        /// Known field (repeatable); unknown placeholders block the call
        #[arg(long = "field", value_name = "NAME")]
        fields: Vec<String>,
        /// Query set whose first record supplies the known fields
        #[arg(long)]
        query_set: Option<String>,
    },
}

/// Explicit `--field`s win; otherwise the query set's fields, if one is given.
async fn resolve_known_fields(client: &RelevanceClient, fields: Vec<String>, query_set: Option<&str>) -> Vec<String> {
    match (fields.is_empty(), query_set) {
        (true, Some(id)) => load_known_fields(client, id).await,
        _ => fields,
    }
}

fn parse_values(items: &[String]) -> Result<BTreeMap<String, String>, String> {
    let mut out = BTreeMap::new();
    for s in items {
        let Some((k, v)) = s.split_once('=') else {
            return Err(format!("Invalid --value '{}', expected KEY=VALUE", s));
        };
        out.insert(k.trim().to_string(), v.to_string());
    }
    Ok(out)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    Config::dotenv_load();
    let cli = Cli::parse();

    let mut conf = Config::from_env();
    if let Some(url) = cli.relevance_url {
        conf.relevance_url = url;
    }
    let client = RelevanceClient::with_timeout(conf.relevance_url.clone(), conf.request_timeout())?;

    match cli.command {
        Commands::Schemas => {
            for schema in OutputSchema::ALL {
                println!("{:<20} {:<22} {}", schema.as_str(), schema.label(), schema.description());
            }
        }
        Commands::Placeholders { instructions, fields, query_set } => {
            let text = instructions.load().await?;
            let known = resolve_known_fields(&client, fields, query_set.as_deref()).await;
            let placeholders = extract_placeholders(&text);
            let partition = validate_placeholders(&placeholders, &known);
            let out = serde_json::json!({
                "placeholders": placeholders,
                "knownFields": known,
                "validPlaceholders": partition.valid_placeholders,
                "invalidPlaceholders": partition.invalid_placeholders,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
            if !partition.is_ready() {
                std::process::exit(1);
            }
        }
        Commands::Build { schema, instructions, values } => {
            let text = instructions.load().await?;
            let prompt = build_full_prompt(schema, &text);
            if values.is_empty() {
                println!("{}", prompt);
            } else {
                let values = parse_values(&values)?;
                println!("{}", PromptConstructor::new().render(&prompt, &values)?);
            }
        }
        Commands::Template { schema, instructions } => {
            let text = instructions.load().await?;
            println!("{}", serde_json::to_string_pretty(&get_prompt_template(schema, &text))?);
        }
        Commands::Fields { query_set } => {
            let qs = client.get_query_set(&query_set).await.map_err(|e| {
                eprintln!("Error: {}", e);
                e
            })?;
            let fields = known_fields_from_query_set(&qs)?;
            for f in fields {
                println!("{}", f);
            }
        }
        Commands::Validate {
            schema, instructions, model_id, search_configurations, context_fields,
            values, size, token_limit, ignore_failure, fields, query_set,
        } => {
            let known = resolve_known_fields(&client, fields, query_set.as_deref()).await;
            let params = ValidatePromptParams {
                model_id,
                placeholder_values: parse_values(&values)?,
                search_configuration_list: search_configurations,
                context_fields,
                size,
                token_limit,
                ignore_failure: Some(ignore_failure),
                output_schema: schema,
                user_instructions: instructions.load().await?,
            };
            let transport: &dyn JudgeTransport = &client;
            let res = validate_prompt_gated(Some(transport), &params, &known).await;
            if res.success {
                println!("{}", res.raw_response.unwrap_or_default());
            } else {
                eprintln!("Error: {}", res.error.unwrap_or_default());
                std::process::exit(1);
            }
        }
    }
    Ok(())
}
