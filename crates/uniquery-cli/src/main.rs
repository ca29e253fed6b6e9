//! uniquery CLI: quizzes and study material from an LLM, on the command line.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use uniquery_core::model::{ExtractionMode, DEFAULT_OPTION_COUNT};
use uniquery_core::prompts::{DetailLevel, Difficulty, MaterialKind};

mod commands;

#[derive(Parser)]
#[command(name = "uniquery", version, about = "AI learning assistant: quizzes and study material")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter uniquery.toml
    Init,

    /// Extract validated questions from a saved model response
    Extract {
        /// File holding the raw response ("-" for stdin)
        #[arg(long)]
        input: PathBuf,

        /// strict rejects the batch on any invalid question, lenient drops it
        #[arg(long, default_value = "strict")]
        mode: ExtractionMode,

        /// Required number of options per question
        #[arg(long, default_value_t = DEFAULT_OPTION_COUNT)]
        options: usize,
    },

    /// Take a graded quiz
    Quiz {
        /// Quiz topic (required unless --questions is given)
        #[arg(long)]
        topic: Option<String>,

        /// Number of questions (1-20)
        #[arg(long, default_value = "5")]
        count: usize,

        /// beginner, intermediate or advanced
        #[arg(long, default_value = "intermediate")]
        difficulty: Difficulty,

        /// Question types, comma-separated (e.g. "Multiple Choice,True/False").
        /// Every type is asked with four options so it can be graded by exact match
        #[arg(long)]
        types: Option<String>,

        /// Use a saved model response instead of generating one
        #[arg(long)]
        questions: Option<PathBuf>,

        /// Answers as "0=Paris,1=4" (option text or 1-based option number); prompts on stdin if omitted
        #[arg(long)]
        answers: Option<String>,

        /// Save the finished session as JSON (file, or directory for the default name)
        #[arg(long)]
        export: Option<PathBuf>,

        /// Ask the model for study recommendations on missed questions
        #[arg(long)]
        recommend: bool,

        /// Provider name from the config
        #[arg(long)]
        provider: Option<String>,

        /// Model to use
        #[arg(long)]
        model: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Generate study material and render it to pages
    Study {
        /// Topic to study
        #[arg(long)]
        topic: String,

        /// Study Guide, Summary, Key Concepts, Flashcards or Cheat Sheet
        #[arg(long, default_value = "study guide")]
        kind: MaterialKind,

        /// concise, moderate, detailed or comprehensive
        #[arg(long, default_value = "moderate")]
        detail: DetailLevel,

        /// Leave out practical examples
        #[arg(long)]
        no_examples: bool,

        /// Ask for diagram suggestions
        #[arg(long)]
        diagrams: bool,

        /// Also derive a practice quiz from the material
        #[arg(long)]
        quiz: bool,

        /// Output directory
        #[arg(long, default_value = "./uniquery-output")]
        output: PathBuf,

        /// Output format: text, html, json, all
        #[arg(long, default_value = "all")]
        format: String,

        /// Provider name from the config
        #[arg(long)]
        provider: Option<String>,

        /// Model to use
        #[arg(long)]
        model: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Render a markup file to paginated text, HTML or JSON
    Render {
        /// Markup file ("-" for stdin)
        #[arg(long)]
        input: PathBuf,

        /// Title block placed before the body
        #[arg(long)]
        title: Option<String>,

        /// Output file; prints to stdout if omitted
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: text, html, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Chat with the assistant; reads questions from stdin unless --message is given
    Chat {
        /// Question to send (repeat for several turns)
        #[arg(long = "message", short = 'm')]
        messages: Vec<String>,

        /// Continue a conversation saved with --export
        #[arg(long)]
        history: Option<PathBuf>,

        /// Append a summary of the conversation
        #[arg(long)]
        summarize: bool,

        /// Save the conversation as JSON (file, or directory for the default name)
        #[arg(long)]
        export: Option<PathBuf>,

        /// Provider name from the config
        #[arg(long)]
        provider: Option<String>,

        /// Model to use
        #[arg(long)]
        model: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List available models
    ListModels {
        /// Filter to specific provider
        #[arg(long)]
        provider: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("uniquery=info".parse().expect("static directive")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Extract {
            input,
            mode,
            options,
        } => commands::extract::execute(input, mode, options),
        Commands::Quiz {
            topic,
            count,
            difficulty,
            types,
            questions,
            answers,
            export,
            recommend,
            provider,
            model,
            config,
        } => {
            commands::quiz::execute(commands::quiz::QuizArgs {
                topic,
                count,
                difficulty,
                types,
                questions,
                answers,
                export,
                recommend,
                provider,
                model,
                config,
            })
            .await
        }
        Commands::Study {
            topic,
            kind,
            detail,
            no_examples,
            diagrams,
            quiz,
            output,
            format,
            provider,
            model,
            config,
        } => {
            commands::study::execute(commands::study::StudyArgs {
                topic,
                kind,
                detail,
                include_examples: !no_examples,
                suggest_diagrams: diagrams,
                quiz,
                output,
                format,
                provider,
                model,
                config,
            })
            .await
        }
        Commands::Render {
            input,
            title,
            output,
            format,
            config,
        } => commands::render::execute(input, title, output, format, config),
        Commands::Chat {
            messages,
            history,
            summarize,
            export,
            provider,
            model,
            config,
        } => {
            commands::chat::execute(commands::chat::ChatArgs {
                messages,
                history,
                summarize,
                export,
                provider,
                model,
                config,
            })
            .await
        }
        Commands::ListModels { provider, config } => {
            commands::list_models::execute(provider, config)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
