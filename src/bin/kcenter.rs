//! kcenter CLI: runs the AI task API and inspects tasks from a shell.

use clap::{Parser, Subcommand};
use kcenter_rs::config::Config;
use kcenter_rs::http::{self, ApiState};
use kcenter_rs::model::{TaskId, TaskInput, TaskKind};
use kcenter_rs::service::TaskService;
use kcenter_rs::telemetry::{TelemetryConfig, init_telemetry};

#[derive(Parser)]
#[command(name = "kcenter", about = "Knowledge-center AI task bridge")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve {
        /// Listen address (overrides HTTP_ADDR)
        #[arg(long)]
        bind: Option<String>,
    },
    /// AI task operations against the configured broker
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },
}

#[derive(Subcommand)]
enum TaskAction {
    /// Submit a task
    Submit {
        /// summarize | keywords | normalize
        kind: TaskKind,
        /// JSON parameters, e.g. '{"text": "..."}'
        #[arg(long)]
        params: String,
    },
    /// Show a task's current result
    Show {
        /// Task ID
        id: String,
    },
    /// Delete a task's result record
    Delete {
        /// Task ID
        id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Command::Serve { bind } => cmd_serve(config, bind).await,
        Command::Task { action } => {
            let service = TaskService::connect(config.broker.as_ref()).await;
            if !service.is_enabled() {
                anyhow::bail!("task broker not configured or unreachable (check REDIS_ADDR)");
            }
            match action {
                TaskAction::Submit { kind, params } => cmd_task_submit(&service, kind, params).await,
                TaskAction::Show { id } => cmd_task_show(&service, id).await,
                TaskAction::Delete { id } => cmd_task_delete(&service, id).await,
            }
        }
    }
}

async fn cmd_serve(config: Config, bind: Option<String>) -> anyhow::Result<()> {
    let _guard = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "kcenter".to_string(),
        log_level: config.log_level.clone(),
    })?;

    let service = TaskService::connect(config.broker.as_ref()).await;
    let addr = bind.unwrap_or(config.http_addr);

    http::serve(ApiState::new(service), &addr).await?;
    Ok(())
}

async fn cmd_task_submit(service: &TaskService, kind: TaskKind, params: String) -> anyhow::Result<()> {
    let params: serde_json::Value = serde_json::from_str(&params)?;
    let input = TaskInput::from_params(kind, &params)?;
    let task_id = service.submit(input).await?;
    println!("Submitted: {task_id} ({})", kind.task_name());
    Ok(())
}

async fn cmd_task_show(service: &TaskService, id: String) -> anyhow::Result<()> {
    let result = service.fetch(&TaskId::from(id)).await?;

    println!("ID:         {}", result.task_id);
    println!("Status:     {}", result.status);
    if let Some(ref completed) = result.completed_at {
        println!("Completed:  {completed}");
    }
    if let Some(ref data) = result.result {
        println!("Result:     {}", serde_json::to_string_pretty(data)?);
    }
    if let Some(ref err) = result.error {
        println!("---");
        println!("{err}");
    }
    Ok(())
}

async fn cmd_task_delete(service: &TaskService, id: String) -> anyhow::Result<()> {
    let id = TaskId::from(id);
    service.delete(&id).await?;
    println!("Deleted: {id}");
    Ok(())
}
