mod document;

use anyhow::{anyhow, Result};
use autocore::{ExecutionEvent, ExecutionStatus, NodeId, Workflow};
use autoruntime::{AutomationRuntime, CapabilityKind, CapabilityRegistry, RuntimeConfig};
use clap::{Parser, Subcommand};
use document::{LoadedWorkflow, WorkflowDocument};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::{error::TryRecvError, Receiver};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "automate")]
#[command(about = "Workflow automation CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a workflow document against a trigger payload
    Run {
        /// Path to workflow JSON document
        #[arg(short, long)]
        file: PathBuf,

        /// Trigger type to report; defaults to the workflow's own
        #[arg(short, long)]
        trigger: Option<String>,

        /// Trigger payload as JSON object
        #[arg(short, long)]
        input: Option<String>,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,

        /// Longest node path a traversal may follow
        #[arg(long)]
        max_depth: Option<usize>,
    },

    /// Check a workflow document for structural problems
    Validate {
        /// Path to workflow JSON document
        file: PathBuf,
    },

    /// List registered triggers and actions
    Capabilities {
        /// Only show this category
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Write an example workflow document
    Init {
        /// Output file path
        #[arg(short, long, default_value = "workflow.json")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            file,
            trigger,
            input,
            verbose,
            max_depth,
        } => {
            init_logging(verbose);
            run_workflow(file, trigger, input, max_depth).await?;
        }

        Commands::Validate { file } => {
            init_logging(false);
            validate_workflow(file).await?;
        }

        Commands::Capabilities { category } => {
            list_capabilities(category.as_deref());
        }

        Commands::Init { output } => {
            create_example_workflow(output)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .init();
}

fn registry() -> CapabilityRegistry {
    let mut registry = CapabilityRegistry::new();
    autonodes::register_all(&mut registry);
    registry
}

fn parse_payload(input: Option<String>) -> Result<Map<String, Value>> {
    match input {
        None => Ok(Map::new()),
        Some(raw) => match serde_json::from_str::<Value>(&raw)? {
            Value::Object(payload) => Ok(payload),
            _ => Err(anyhow!("Input must be a JSON object")),
        },
    }
}

fn describe(loaded: &LoadedWorkflow, workflow: &Workflow) {
    println!("📋 Workflow: {}", workflow.name);
    println!("   Trigger: {}", workflow.trigger_type);
    println!("   Status: {}", workflow.status.as_str());
    println!("   Nodes: {}", loaded.nodes.len());
}

async fn run_workflow(
    file: PathBuf,
    trigger: Option<String>,
    input: Option<String>,
    max_depth: Option<usize>,
) -> Result<()> {
    println!("🚀 Loading workflow from: {}", file.display());

    let document = WorkflowDocument::read(&file)?;
    let payload = parse_payload(input)?;

    let mut config = RuntimeConfig::default();
    if let Some(max_depth) = max_depth {
        config.engine.max_depth = max_depth;
    }
    let runtime = AutomationRuntime::with_store(
        Arc::new(registry()),
        Arc::new(autocore::MemoryStore::new()),
        config,
    );

    let loaded = document
        .author(runtime.workflows(), Uuid::new_v4(), Uuid::new_v4())
        .await?;
    let workflow = &loaded.workflow;
    describe(&loaded, workflow);
    println!();

    let trigger_type = trigger.unwrap_or_else(|| workflow.trigger_type.to_string());
    let mut events = runtime.subscribe_events();
    let execution_id = runtime
        .engine()
        .execute(workflow, &trigger_type, payload)
        .await?;

    let (trace, dropped) = drain_events(&mut events);
    if dropped > 0 {
        println!("  … {} early event(s) dropped", dropped);
    }
    for event in trace {
        print_event(&loaded, event);
    }

    let execution = runtime
        .store()
        .get_execution(execution_id)
        .await?
        .ok_or_else(|| anyhow!("Execution {} vanished", execution_id))?;

    println!();
    println!("📊 Execution Summary:");
    println!("   Execution ID: {}", execution.id);
    println!("   Status: {}", execution.status.as_str());
    if let Some(error) = &execution.error {
        println!("   Error: {}", error);
    }

    if let Some(actions) = execution.actions().filter(|a| !a.is_empty()) {
        println!();
        println!("📤 Action results:");
        for (node_id, result) in actions {
            let label = node_id
                .parse()
                .ok()
                .and_then(|id| loaded.key_of(id))
                .unwrap_or(node_id.as_str());
            println!("   {}: {}", label, result);
        }
    }

    if execution.status == ExecutionStatus::Failed {
        return Err(anyhow!("workflow execution failed"));
    }
    Ok(())
}

/// Buffered events plus the number lost to lagging behind the bus
fn drain_events(events: &mut Receiver<ExecutionEvent>) -> (Vec<ExecutionEvent>, u64) {
    let mut trace = Vec::new();
    let mut dropped = 0;
    loop {
        match events.try_recv() {
            Ok(event) => trace.push(event),
            Err(TryRecvError::Lagged(skipped)) => dropped += skipped,
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
    (trace, dropped)
}

fn print_event(loaded: &LoadedWorkflow, event: ExecutionEvent) {
    let key = |id: NodeId| loaded.key_of(id).unwrap_or("?").to_string();
    match event {
        ExecutionEvent::ExecutionStarted { trigger_type, .. } => {
            println!("▶️  Execution started ({})", trigger_type);
        }
        ExecutionEvent::NodeEntered {
            node_id,
            node_type,
            depth,
            ..
        } => {
            println!("{}⚡ {} ({})", "  ".repeat(depth), key(node_id), node_type);
        }
        ExecutionEvent::ActionCompleted {
            node_id,
            action_type,
            duration_ms,
            ..
        } => {
            println!("  ✅ {} [{}] completed in {}ms", key(node_id), action_type, duration_ms);
        }
        ExecutionEvent::ConditionEvaluated { node_id, result, .. } => {
            println!("  🔀 {} evaluated to {}", key(node_id), result);
        }
        ExecutionEvent::EdgeSkipped {
            from_node, to_node, ..
        } => {
            println!("  ⏭️  skipped {} -> {}", key(from_node), key(to_node));
        }
        ExecutionEvent::ExecutionCompleted { duration_ms, .. } => {
            println!("✨ Execution completed successfully in {}ms", duration_ms);
        }
        ExecutionEvent::ExecutionFailed {
            error, duration_ms, ..
        } => {
            println!("💥 Execution failed after {}ms: {}", duration_ms, error);
        }
    }
}

async fn validate_workflow(file: PathBuf) -> Result<()> {
    println!("🔍 Validating workflow: {}", file.display());

    let document = WorkflowDocument::read(&file)?;
    let runtime = AutomationRuntime::new(registry());
    let loaded = document
        .author(runtime.workflows(), Uuid::new_v4(), Uuid::new_v4())
        .await?;

    let warnings = runtime.workflows().validate_graph(&loaded.workflow).await?;
    if warnings.is_empty() {
        println!("✅ Workflow is valid:");
        describe(&loaded, &loaded.workflow);
        return Ok(());
    }

    println!("⚠️  {} problem(s) found:", warnings.len());
    for warning in &warnings {
        println!("   • {}", warning);
    }
    Err(anyhow!("workflow is not runnable"))
}

fn list_capabilities(category: Option<&str>) {
    println!("📦 Available capabilities:");

    let registry = registry();
    for kind in [CapabilityKind::Trigger, CapabilityKind::Action] {
        let entries = match kind {
            CapabilityKind::Trigger => registry.list_triggers(category),
            CapabilityKind::Action => registry.list_actions(category),
        };
        if entries.is_empty() {
            continue;
        }

        println!();
        println!("{:?}s:", kind);
        for info in entries {
            println!("  • {} ({})", info.id, info.category);
            println!("    {}", info.description);
            for field in &info.config_schema {
                let required = if field.required { ", required" } else { "" };
                println!("      - {}: {}{}", field.name, field.field_type.as_str(), required);
            }
            for variable in &info.variables {
                println!("      $ {}", variable.path);
            }
        }
    }
}

fn create_example_workflow(output: PathBuf) -> Result<()> {
    let json = serde_json::to_string_pretty(&WorkflowDocument::example())?;
    std::fs::write(&output, json)?;

    println!("✨ Created example workflow: {}", output.display());
    println!();
    println!("Run it with:");
    println!(
        "  automate run --file {} --input '{{\"booking\": {{\"id\": 7, \"status\": \"confirmed\"}}}}'",
        output.display()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use autocore::EventBus;

    #[test]
    fn drain_skips_past_lagged_events() {
        let bus = EventBus::new(2);
        let mut events = bus.subscribe();
        let execution_id = Uuid::new_v4();
        for duration_ms in 0..5 {
            bus.emit(ExecutionEvent::ExecutionCompleted {
                execution_id,
                duration_ms,
                timestamp: chrono::Utc::now(),
            });
        }

        let (trace, dropped) = drain_events(&mut events);

        assert_eq!(dropped, 3);
        let durations: Vec<u64> = trace
            .iter()
            .filter_map(|e| match e {
                ExecutionEvent::ExecutionCompleted { duration_ms, .. } => Some(*duration_ms),
                _ => None,
            })
            .collect();
        assert_eq!(durations, vec![3, 4]);
    }
}
