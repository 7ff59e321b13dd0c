use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use paramsync::config::{self, Config};
use paramsync::logging::{self, SessionSink};
use paramsync::prompt::Prompter;
use paramsync::{app, scaffold};

#[derive(Parser)]
#[command(name = "paramsync")]
#[command(about = "Sync per-project, per-environment .env files into AWS SSM Parameter Store")]
struct Cli {
    #[command(flatten)]
    options: GlobalOptions,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct GlobalOptions {
    /// Config file (default: <config dir>/paramsync/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Folder holding one sub-folder per project
    #[arg(long, global = true)]
    environments_dir: Option<PathBuf>,

    /// Folder for session logs
    #[arg(long, global = true)]
    logs_dir: Option<PathBuf>,

    /// AWS region passed to every store call
    #[arg(long, global = true)]
    region: Option<String>,

    /// KMS key for SecureString values
    #[arg(long, global = true)]
    kms_key_id: Option<String>,

    /// Store values as plain String instead of SecureString
    #[arg(long, global = true)]
    plain: bool,

    /// Extra tag applied to every parameter (repeatable)
    #[arg(long = "tag", value_name = "KEY=VALUE", value_parser = config::parse_tag, global = true)]
    tags: Vec<(String, String)>,
}

impl GlobalOptions {
    fn into_config(self) -> anyhow::Result<Config> {
        let mut config = match self.config {
            Some(ref path) => Config::load_from(path)?,
            None => Config::load(),
        };

        if let Some(dir) = self.environments_dir {
            config.environments_dir = dir;
        }
        if let Some(dir) = self.logs_dir {
            config.logs_dir = dir;
        }
        if self.region.is_some() {
            config.region = self.region;
        }
        if self.kms_key_id.is_some() {
            config.kms_key_id = self.kms_key_id;
        }
        if self.plain {
            config.secure = false;
        }
        config.tags.extend(self.tags);
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Interactively sync an environment's .env file (default)
    Sync,
    /// Create a project folder with environment sub-folders
    NewProject {
        name: String,

        /// Comma-separated environment names, e.g. dev,stg,prod
        #[arg(short, long, default_value = "")]
        environments: String,
    },
    /// Add an environment folder to an existing project
    AddEnvironment { project: String, environment: String },
    /// List projects and their environments
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let sink = SessionSink::new();
    logging::init_tracing(sink.clone());

    let config = cli.options.into_config()?;

    match cli.command.unwrap_or(Commands::Sync) {
        Commands::Sync => {
            let mut prompter = Prompter::stdio();
            if let Err(e) = app::run_sync(&config, &mut prompter, &sink).await {
                tracing::error!("An unexpected error occurred: {:#}", e);
                eprintln!("An unexpected error occurred: {:#}", e);
            }
            tracing::info!("Script execution finished.");
        }
        Commands::NewProject { name, environments } => {
            let created = scaffold::create_project(&config.environments_dir, &name, &environments)?;
            println!("Project '{}' created at {}", name, created.path.display());
            for env in &created.environments {
                println!("  {}", env);
            }
        }
        Commands::AddEnvironment {
            project,
            environment,
        } => {
            let path =
                scaffold::create_environment(&config.environments_dir, &project, &environment)?;
            println!("Environment folder created at {}", path.display());
        }
        Commands::List => {
            let projects = scaffold::list_subfolders(&config.environments_dir)?;
            if projects.is_empty() {
                println!("No projects found in {}", config.environments_dir.display());
            }
            for project in projects {
                println!("{}", project);
                for env in scaffold::list_subfolders(&config.project_dir(&project))? {
                    println!("  {}", env);
                }
            }
        }
    }

    Ok(())
}
