use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::builder::RangedU64ValueParser;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::info;

use paper_agents::agents::{
    run_search_and_extract, task_input, Agent, ExtractionAgent, PipelineOptions, SearchAgent,
};
use paper_agents::utils::init_logger;
use paper_agents::{config::Config, create_router, AppState};

#[derive(Parser, Debug)]
#[command(name = "paper-agents", version, about = "arXiv search and PDF text extraction agents")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search arXiv and print the paper records.
    Search(SearchArgs),
    /// Download a PDF and print its text.
    Extract(ExtractArgs),
    /// Search each query, then extract every paper found.
    Pipeline(PipelineArgs),
    /// Serve the agents over HTTP.
    Serve,
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// Keyword query.
    query: String,

    /// Result cap (defaults to ARXIV_MAX_RESULTS).
    #[arg(long, value_parser = positive_count())]
    max_results: Option<usize>,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// URL of the PDF to download.
    pdf_url: String,
}

#[derive(Args, Debug)]
struct PipelineArgs {
    /// One or more keyword queries.
    #[arg(required = true)]
    queries: Vec<String>,

    /// Papers to process per query (defaults to PIPELINE_MAX_PAPERS).
    #[arg(long, value_parser = positive_count())]
    max_papers: Option<usize>,

    /// Include the extracted text in the report.
    #[arg(long)]
    include_text: bool,
}

fn positive_count() -> RangedU64ValueParser<usize> {
    RangedU64ValueParser::<usize>::new().range(1..)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    init_logger();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Command::Search(args) => {
            let agent = SearchAgent::from_config(&config).context("Failed to build arXiv client")?;
            let mut input = task_input(serde_json::json!({ "query": args.query }));
            if let Some(max) = args.max_results {
                input.insert("max_results".to_string(), max.into());
            }
            let output = agent.execute(&input).await;
            print_json(&output)?;
            Ok(exit_code(output.success))
        }
        Command::Extract(args) => {
            let agent = ExtractionAgent::from_config(&config);
            let output = agent
                .execute(&task_input(serde_json::json!({ "pdf_url": args.pdf_url })))
                .await;
            print_json(&output)?;
            Ok(exit_code(output.success))
        }
        Command::Pipeline(args) => {
            let search = SearchAgent::from_config(&config).context("Failed to build arXiv client")?;
            let extraction = ExtractionAgent::from_config(&config);

            let mut options = PipelineOptions::from(&config.pipeline);
            if let Some(max) = args.max_papers {
                options.max_papers_per_query = max;
            }
            options.include_text = args.include_text;

            let report = run_search_and_extract(&search, &extraction, &args.queries, &options).await;
            print_json(&report)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Serve => serve(config).await.map(|_| ExitCode::SUCCESS),
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    info!("Configuration loaded: {:?}", config.server);

    let search: Arc<dyn Agent> =
        Arc::new(SearchAgent::from_config(&config).context("Failed to build arXiv client")?);
    let extraction: Arc<dyn Agent> = Arc::new(ExtractionAgent::from_config(&config));

    let host: std::net::IpAddr = config
        .server
        .host
        .parse()
        .with_context(|| format!("Invalid HOST: {}", config.server.host))?;
    let addr = SocketAddr::new(host, config.server.port);

    let state = AppState { config, search, extraction };
    let app = create_router(state);

    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
