use anyhow::Context;
use article_rewriter::{
    BatchRunner, Config, FailurePolicy, LogSink, RetryPolicy, RewriteClient,
};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "article-rewriter",
    version,
    author,
    about = "Batch-rewrite Word documents with the OpenAI API",
    long_about = "Batch-rewrite a folder of Word documents with the OpenAI chat API.\n\n\
    This tool walks an input directory, extracts the text of every .docx file, \
    asks the model to rewrite the article at greater length, and writes the \
    result to the output directory under the same filename. Files are processed \
    strictly one at a time; failed API calls are retried on a fixed schedule.\n\n\
    The API key is read from the OPENAI_API_KEY environment variable (a .env \
    file in the working directory is honored).\n\n\
    USAGE EXAMPLES:\n  \
      # Rewrite every document in ./articles into ./rewritten\n  \
      article-rewriter --input ./articles --output ./rewritten\n\n  \
      # Keep going when a single document fails\n  \
      article-rewriter --input ./articles --on-error skip\n\n  \
      # Use a different model and fewer retries\n  \
      article-rewriter --input ./articles --model gpt-4o-mini --max-attempts 3"
)]
struct Cli {
    /// Directory containing the source .docx documents
    #[arg(short, long, value_name = "PATH")]
    input: PathBuf,

    /// Output directory for rewritten documents (created if absent)
    #[arg(short, long, default_value = "rewritten", value_name = "PATH")]
    output: PathBuf,

    /// OpenAI model to use
    #[arg(long, default_value = "gpt-3.5-turbo")]
    model: String,

    /// Maximum attempts per document, including the first one
    #[arg(long, default_value_t = 10)]
    max_attempts: usize,

    /// Seconds to wait between failed attempts
    #[arg(long, default_value_t = 15)]
    retry_delay: u64,

    /// What to do when a single document fails
    #[arg(long, value_enum, default_value = "abort")]
    on_error: CliFailurePolicy,

    /// Print the run report as JSON instead of the summary box
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliFailurePolicy {
    /// Stop the run on the first failure
    Abort,
    /// Log the failure and continue with the next document
    Skip,
}

impl From<CliFailurePolicy> for FailurePolicy {
    fn from(p: CliFailurePolicy) -> Self {
        match p {
            CliFailurePolicy::Abort => Self::Abort,
            CliFailurePolicy::Skip => Self::Skip,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_tracing(cli.verbose)?;

    // .env files are honored the way the desktop original honored them;
    // a missing file is not an error.
    let _ = dotenvy::dotenv();

    let config = Config::builder()
        .input_dir(cli.input)
        .output_dir(cli.output)
        .model(cli.model)
        .retry(RetryPolicy {
            max_attempts: cli.max_attempts,
            retry_delay: Duration::from_secs(cli.retry_delay),
            ..RetryPolicy::default()
        })
        .failure_policy(cli.on_error.into())
        .api_key(std::env::var("OPENAI_API_KEY").unwrap_or_default())
        .build();

    let client = RewriteClient::from_config(&config)
        .context("Failed to create OpenAI client")?;

    let report = BatchRunner::new(config, client)
        .context("Failed to create batch runner")?
        .run(&LogSink)
        .context("Rewrite run failed")?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report.print_summary();
    }

    Ok(())
}

fn setup_tracing(verbosity: u8) -> anyhow::Result<()> {
    let filter = match verbosity {
        0 => EnvFilter::new("article_rewriter=info"),
        1 => EnvFilter::new("article_rewriter=debug"),
        _ => EnvFilter::new("article_rewriter=trace"),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_thread_ids(false))
        .init();

    Ok(())
}
