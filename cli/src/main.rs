//! CLI entrypoint for roundtable
//!
//! This is the main binary that wires together all layers using
//! dependency injection. All engine logic lives in the library crates.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use roundtable_application::{
    AgentRouter, ChatOrchestrator, EvidenceEnforcementPipeline, RunDeliberationUseCase,
    assemble_roster,
};
use roundtable_domain::{DeliberationResult, Task};
use roundtable_infrastructure::{
    AgentRegistry, ConfigLoader, FileConfig, JsonArtifactStore, OpenAiBackend, RemoteAgentSpec,
    core_agents,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "roundtable", version, about = "Multi-agent deliberation engine")]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Explicit config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Skip config file discovery and use built-in defaults
    #[arg(long, global = true)]
    no_config: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full deliberation round on a task
    Run {
        /// Task content to deliberate on
        content: String,

        /// Task identifier (defaults to a timestamp)
        #[arg(long)]
        task_id: Option<String>,

        /// Skip the strategy phase
        #[arg(long)]
        no_strategy: bool,

        /// Skip the challenge phase
        #[arg(long)]
        no_challenge: bool,

        /// Print the full result as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Ask one question through the chat orchestrator
    Chat {
        /// The message to route to specialists
        message: String,

        /// Session identifier for conversation history
        #[arg(long, default_value = "cli")]
        session: String,
    },

    /// Manage registered agents
    Agents {
        #[command(subcommand)]
        command: AgentCommands,
    },

    /// Health-check every registered remote agent
    Health,
}

#[derive(Subcommand)]
enum AgentCommands {
    /// List all registered agents
    List,

    /// Register a remote agent
    Register {
        name: String,

        /// What the agent is expert in, used for routing
        #[arg(long)]
        domain: String,

        /// Base URL of the agent's HTTP endpoint
        #[arg(long)]
        url: String,

        /// Bearer token for the agent's API
        #[arg(long)]
        api_key: Option<String>,

        /// Request timeout in seconds
        #[arg(long, default_value_t = 120)]
        timeout: u64,

        /// Comma-separated capability tags
        #[arg(long, value_delimiter = ',')]
        capabilities: Vec<String>,
    },

    /// Remove a registered agent
    Unregister { name: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).context("failed to load configuration")?
    };

    match cli.command {
        Commands::Run {
            content,
            task_id,
            no_strategy,
            no_challenge,
            json,
        } => run_round(&config, content, task_id, no_strategy, no_challenge, json).await,
        Commands::Chat { message, session } => run_chat(&config, &session, &message).await,
        Commands::Agents { command } => manage_agents(&config, command).await,
        Commands::Health => health_check(&config).await,
    }
}

fn open_registry(config: &FileConfig) -> Arc<AgentRegistry> {
    Arc::new(AgentRegistry::new(config.registry.persist_path.clone()))
}

fn open_backend(config: &FileConfig) -> Result<Option<Arc<OpenAiBackend>>> {
    if !config.backend.is_configured() {
        return Ok(None);
    }
    let backend =
        OpenAiBackend::from_config(&config.backend).context("failed to build text backend")?;
    Ok(Some(Arc::new(backend)))
}

async fn run_round(
    config: &FileConfig,
    content: String,
    task_id: Option<String>,
    no_strategy: bool,
    no_challenge: bool,
    json: bool,
) -> Result<()> {
    let registry = open_registry(config);
    let backend = open_backend(config)?;

    let mut deliberation = config.to_deliberation_config();
    if no_strategy {
        deliberation = deliberation.without_strategy();
    }
    if no_challenge {
        deliberation = deliberation.without_challenge();
    }

    let specialists = registry.agents();
    let roster = if config.registry.include_core_agents {
        let core = core_agents(
            backend
                .clone()
                .map(|b| b as Arc<dyn roundtable_application::TextGenBackend>),
        );
        assemble_roster(core, specialists)
    } else {
        specialists
    };
    if roster.is_empty() {
        bail!("no agents available; register one with `roundtable agents register`");
    }
    info!(agents = roster.len(), "roster assembled");

    let artifacts = Arc::new(JsonArtifactStore::new(deliberation.artifacts_dir.clone()));
    let mut use_case =
        RunDeliberationUseCase::new(roster, deliberation).with_artifacts(artifacts);

    if let Some(backend) = backend {
        let mut pipeline = EvidenceEnforcementPipeline::new(config.to_enforcement_config());
        if config.enforcement.enabled {
            pipeline = pipeline.with_backend(backend.clone());
            use_case = use_case.with_enforcement(Arc::new(pipeline));
        }
        use_case = use_case.with_backend(backend);
    } else if config.enforcement.enabled {
        let pipeline = EvidenceEnforcementPipeline::new(config.to_enforcement_config());
        use_case = use_case.with_enforcement(Arc::new(pipeline));
    }

    let task_id = task_id
        .unwrap_or_else(|| format!("task_{}", chrono::Utc::now().format("%Y%m%d_%H%M%S")));
    let task = Task::new(task_id, content);

    let result = use_case.execute(task).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&result);
    }
    Ok(())
}

fn print_summary(result: &DeliberationResult) {
    println!("Task:      {}", result.task_id);
    println!(
        "Agents:    {} analyzed, {} challenged, {} voted",
        result.analyses.len(),
        result.challenges.len(),
        result.votes.len()
    );
    println!(
        "Consensus: {} (approval {:.0}%)",
        if result.consensus_reached { "yes" } else { "no" },
        result.approval_rate * 100.0
    );
    println!("Duration:  {:.1}s", result.duration_seconds);

    if let Some(synthesis) = &result.synthesis {
        println!("\nRecommendation:\n{}", synthesis.recommended_direction);
        if !synthesis.key_findings.is_empty() {
            println!("\nKey findings:");
            for finding in &synthesis.key_findings {
                println!("  - [{}] {}", finding.agent_name, finding.finding);
                if !finding.evidence.is_empty() {
                    println!("    evidence: {}", finding.evidence);
                }
            }
        }
    }

    let dissents: Vec<_> = result
        .votes
        .iter()
        .filter(|v| !v.approve && v.dissent_reason.is_some())
        .collect();
    if !dissents.is_empty() {
        println!("\nDissents:");
        for vote in dissents {
            println!(
                "  - {}: {}",
                vote.agent_name,
                vote.dissent_reason.as_deref().unwrap_or_default()
            );
        }
    }
}

async fn run_chat(config: &FileConfig, session: &str, message: &str) -> Result<()> {
    let Some(backend) = open_backend(config)? else {
        bail!("chat requires a configured backend; set [backend] model in roundtable.toml");
    };
    let registry = open_registry(config);
    if registry.count() == 0 {
        bail!("no agents registered; register one with `roundtable agents register`");
    }
    registry.health_check_all().await;

    let router = AgentRouter::new(registry.clone(), config.to_router_config());
    let orchestrator = ChatOrchestrator::new(
        backend,
        registry,
        router,
        config.to_chat_config(),
    );

    let response = orchestrator
        .chat(session, message, &Default::default())
        .await;

    println!("{}", response.content);
    if !response.agents_consulted.is_empty() {
        println!("\n(consulted: {})", response.agents_consulted.join(", "));
    }
    if response.escalation_suggested {
        println!("\nNote: {}", response.escalation_reason);
    }
    Ok(())
}

async fn manage_agents(config: &FileConfig, command: AgentCommands) -> Result<()> {
    let registry = open_registry(config);

    match command {
        AgentCommands::List => {
            let infos = registry.list_info();
            if infos.is_empty() {
                println!("No agents registered.");
                return Ok(());
            }
            for info in infos {
                let capabilities = if info.capabilities.is_empty() {
                    String::new()
                } else {
                    format!(" [{}]", info.capabilities.join(", "))
                };
                println!(
                    "{:<20} {:<8} {}{}",
                    info.name, info.transport, info.domain, capabilities
                );
            }
        }
        AgentCommands::Register {
            name,
            domain,
            url,
            api_key,
            timeout,
            capabilities,
        } => {
            let mut spec = RemoteAgentSpec::new(&name, domain, url);
            spec.api_key = api_key.unwrap_or_default();
            spec.timeout = timeout;
            spec.capabilities = capabilities;

            let agent = registry.register_remote(spec)?;
            let healthy = agent.health_check().await;
            println!(
                "Registered {} ({})",
                name,
                if healthy { "healthy" } else { "unreachable" }
            );
        }
        AgentCommands::Unregister { name } => {
            if registry.unregister(&name)? {
                println!("Unregistered {name}");
            } else {
                bail!("no agent named {name}");
            }
        }
    }
    Ok(())
}

async fn health_check(config: &FileConfig) -> Result<()> {
    let registry = open_registry(config);
    if registry.count() == 0 {
        println!("No agents registered.");
        return Ok(());
    }

    let statuses = registry.health_check_all().await;
    let mut names: Vec<_> = statuses.keys().collect();
    names.sort();
    for name in names {
        let status = if statuses[name] { "ok" } else { "unreachable" };
        println!("{name:<20} {status}");
    }
    Ok(())
}
