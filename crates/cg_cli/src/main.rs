use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::info;

use cg_collect::{FileCollector, SerpCollector, UrlCollector};
use cg_core::config::{Config, Provider};
use cg_core::AnswerProvider;
use cg_inference::create_models;
use cg_pipeline::{load_research, save_research, Draft, FileAnswers, Pipeline};

mod interactive;
mod logging;
mod sources;

use interactive::PromptAnswers;
use sources::Sources;

#[derive(Parser, Debug)]
#[command(name = "cg", author, version, about = "Research a topic, interview the author and write the article")]
pub struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true, env = "CG_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Model backend. Available: openai (default), deepseek, dummy")]
    model: Option<Provider>,
    #[arg(long, global = true, env = "CG_BASE_URL")]
    base_url: Option<String>,
    #[arg(long, global = true, env = "CG_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    #[arg(long, global = true)]
    chat_model: Option<String>,
    #[arg(long, global = true)]
    embedding_model: Option<String>,
    #[arg(long, global = true, env = "SERPAPI_API_KEY", hide_env_values = true)]
    serp_api_key: Option<String>,
    /// Qdrant URL; the retrieval index stays in memory when unset.
    #[cfg(feature = "qdrant")]
    #[arg(long, global = true, env = "QDRANT_URL")]
    qdrant_url: Option<String>,
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Default)]
struct SourceArgs {
    /// Page to use as a source. Repeatable.
    #[arg(long = "url")]
    urls: Vec<String>,
    /// Local text, markdown or HTML file to use as a source. Repeatable.
    #[arg(long = "file")]
    files: Vec<PathBuf>,
    /// Search the web for the topic and use the top results.
    #[arg(long)]
    serp: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Collect and summarize sources, then save the interview questions.
    Research {
        topic: String,
        #[command(flatten)]
        sources: SourceArgs,
        #[arg(long, default_value = "research.json")]
        state: PathBuf,
    },
    /// Answer the saved questions and write the article.
    Write {
        #[arg(long, default_value = "research.json")]
        state: PathBuf,
        /// JSON list of answers, or an object keyed by question. Asks on stdin when omitted.
        #[arg(long)]
        answers: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Research, interview and write in one go.
    Generate {
        topic: String,
        #[command(flatten)]
        sources: SourceArgs,
        #[arg(long)]
        answers: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
            None => Config::default(),
        };

        if let Some(provider) = self.model {
            config.model.provider = provider;
        }
        if let Some(base_url) = &self.base_url {
            config.model.base_url = base_url.clone();
        }
        if let Some(api_key) = &self.api_key {
            config.model.api_key = Some(api_key.clone());
        }
        if let Some(chat_model) = &self.chat_model {
            config.model.chat_model = chat_model.clone();
        }
        if let Some(embedding_model) = &self.embedding_model {
            config.model.embedding_model = embedding_model.clone();
        }
        if let Some(serp_api_key) = &self.serp_api_key {
            config.collection.serp_api_key = Some(serp_api_key.clone());
        }

        config.validate()?;
        Ok(config)
    }

    fn build_pipeline(&self, config: &Config, sources: Sources) -> anyhow::Result<Pipeline> {
        let models = create_models(&config.model)?;
        let pipeline = Pipeline::new(config, models, Arc::new(sources))?;

        #[cfg(feature = "qdrant")]
        let pipeline = match &self.qdrant_url {
            Some(url) => pipeline.with_index_backend(cg_storage::IndexBackend::Qdrant { url: url.clone() }),
            None => pipeline,
        };

        Ok(pipeline)
    }
}

fn build_sources(args: &SourceArgs, config: &Config) -> anyhow::Result<Sources> {
    let client = reqwest::Client::builder()
        .timeout(config.model.request_timeout())
        .build()?;

    let mut sources = Sources::default();
    if args.serp {
        sources.push(Arc::new(SerpCollector::new(client.clone(), &config.collection)?));
    }
    if !args.urls.is_empty() {
        sources.push(Arc::new(UrlCollector::new(client, args.urls.clone())));
    }
    if !args.files.is_empty() {
        sources.push(Arc::new(FileCollector::new(args.files.clone())));
    }

    if sources.is_empty() {
        anyhow::bail!("No sources given. Use --url, --file or --serp");
    }
    Ok(sources)
}

fn answer_provider(answers: Option<&Path>) -> Box<dyn AnswerProvider> {
    match answers {
        Some(path) => Box::new(FileAnswers::new(path)),
        None => Box::new(PromptAnswers::stdin()),
    }
}

fn emit(draft: &Draft, output: Option<&Path>) -> anyhow::Result<()> {
    let markdown = draft.to_markdown();
    match output {
        Some(path) => {
            std::fs::write(path, markdown).with_context(|| format!("Failed to write {}", path.display()))?;
            info!("📄 Article written to {}", path.display());
        }
        None => print!("{}", markdown),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);
    let config = cli.load_config()?;

    match &cli.command {
        Commands::Research { topic, sources, state } => {
            let pipeline = cli.build_pipeline(&config, build_sources(sources, &config)?)?;
            let research = pipeline.research(topic).await?;
            save_research(&research, state)?;

            eprintln!("\nAnswer these questions, then run `cg write --state {}`:", state.display());
            for (i, question) in research.questions.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, question.question);
            }
        }
        Commands::Write { state, answers, output } => {
            let research = load_research(state)?;
            let interview = research
                .answer_with(answer_provider(answers.as_deref()).as_ref())
                .await?;
            let pipeline = cli.build_pipeline(&config, Sources::default())?;
            let draft = pipeline.write(&interview).await?;
            emit(&draft, output.as_deref())?;
        }
        Commands::Generate {
            topic,
            sources,
            answers,
            output,
        } => {
            let pipeline = cli.build_pipeline(&config, build_sources(sources, &config)?)?;
            let draft = pipeline
                .run(topic, answer_provider(answers.as_deref()).as_ref())
                .await?;
            emit(&draft, output.as_deref())?;
        }
    }

    Ok(())
}
