use crate::condition;
use crate::graph::WorkflowGraph;
use crate::registry::CapabilityRegistry;
use autocore::{
    ConditionType, EventBus, ExecutionError, ExecutionEvent, ExecutionId, NodeId, NodeType,
    StoreError, Workflow, WorkflowExecution, WorkflowNode, WorkflowStore, ACTIONS_KEY,
};
use chrono::Utc;
use futures::future::{BoxFuture, FutureExt};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

/// Configuration for the workflow engine
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Longest node path a single traversal may follow
    pub max_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { max_depth: 64 }
    }
}

/// Interprets workflow graphs against trigger firings.
///
/// Traversal is depth-first and sequential. Every failure inside a run is
/// caught once and recorded on the execution row; the caller only learns
/// the outcome by reading that row.
pub struct WorkflowEngine {
    registry: Arc<CapabilityRegistry>,
    store: Arc<dyn WorkflowStore>,
    events: Arc<EventBus>,
    config: EngineConfig,
}

impl WorkflowEngine {
    pub fn new(
        registry: Arc<CapabilityRegistry>,
        store: Arc<dyn WorkflowStore>,
        events: Arc<EventBus>,
        config: EngineConfig,
    ) -> Self {
        Self {
            registry,
            store,
            events,
            config,
        }
    }

    pub fn registry(&self) -> &Arc<CapabilityRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run `workflow` for one trigger firing.
    ///
    /// The only error returned is a failure to create the execution row
    /// itself. Anything after that ends up in the row's status and error.
    pub async fn execute(
        &self,
        workflow: &Workflow,
        trigger_type: &str,
        trigger_data: Map<String, Value>,
    ) -> Result<ExecutionId, StoreError> {
        let execution = self
            .store
            .insert_execution(WorkflowExecution::start(workflow.id, trigger_type, trigger_data))
            .await?;
        let execution_id = execution.id;
        let start_time = Instant::now();

        tracing::info!(
            "Starting execution {} of workflow {} ({})",
            execution_id,
            workflow.id,
            trigger_type
        );
        self.events.emit(ExecutionEvent::ExecutionStarted {
            execution_id,
            workflow_id: workflow.id,
            trigger_type: trigger_type.to_string(),
            timestamp: Utc::now(),
        });

        let mut run = Run {
            engine: self,
            graph: WorkflowGraph::default(),
            execution,
            path: Vec::new(),
        };
        let outcome = AssertUnwindSafe(run.traverse(workflow))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(ExecutionError::Unhandled(panic_message(panic))));

        let mut execution = run.execution;
        let duration_ms = elapsed_ms(start_time);
        match outcome {
            Ok(()) => {
                execution.complete();
                tracing::info!("Execution {} completed in {}ms", execution_id, duration_ms);
                self.events.emit(ExecutionEvent::ExecutionCompleted {
                    execution_id,
                    duration_ms,
                    timestamp: Utc::now(),
                });
            }
            Err(e) => {
                tracing::error!("Execution {} failed: {}", execution_id, e);
                execution.fail(e.to_string());
                self.events.emit(ExecutionEvent::ExecutionFailed {
                    execution_id,
                    error: e.to_string(),
                    duration_ms,
                    timestamp: Utc::now(),
                });
            }
        }

        match self.store.update_execution(&execution).await {
            Ok(()) => {}
            Err(StoreError::Conflict(reason)) => {
                tracing::warn!("Outcome of execution {} not recorded: {}", execution_id, reason);
            }
            Err(e) => {
                tracing::error!(
                    "Failed to record outcome of execution {}: {}",
                    execution_id,
                    e
                );
            }
        }

        Ok(execution_id)
    }
}

/// State of one execution in flight
struct Run<'a> {
    engine: &'a WorkflowEngine,
    graph: WorkflowGraph,
    execution: WorkflowExecution,
    /// Nodes on the current traversal path, root first
    path: Vec<NodeId>,
}

impl Run<'_> {
    async fn traverse(&mut self, workflow: &Workflow) -> Result<(), ExecutionError> {
        // Reserved for action results
        if self.execution.trigger_data.contains_key(ACTIONS_KEY) {
            return Err(ExecutionError::ReservedContextKey(ACTIONS_KEY));
        }
        self.graph = WorkflowGraph::load(self.engine.store.as_ref(), workflow.id).await?;

        let start_edges = self.graph.start_edges().to_vec();
        if start_edges.is_empty() {
            return Err(ExecutionError::NoStartNode);
        }

        for edge in start_edges {
            self.visit(edge.to_node).await?;
        }
        Ok(())
    }

    fn visit(&mut self, node_id: NodeId) -> BoxFuture<'_, Result<(), ExecutionError>> {
        async move {
            if self.path.contains(&node_id) {
                return Err(ExecutionError::CycleDetected(node_id));
            }
            if self.path.len() >= self.engine.config.max_depth {
                return Err(ExecutionError::MaxDepthExceeded(self.engine.config.max_depth));
            }

            let node = self
                .graph
                .node(node_id)
                .cloned()
                .ok_or(ExecutionError::NodeNotFound(node_id))?;

            tracing::debug!("Visiting {:?} node {}", node.node_type, node.label());
            self.engine.events.emit(ExecutionEvent::NodeEntered {
                execution_id: self.execution.id,
                node_id,
                node_type: format!("{:?}", node.node_type).to_lowercase(),
                depth: self.path.len(),
                timestamp: Utc::now(),
            });

            self.path.push(node_id);
            let result = match node.node_type {
                NodeType::Action => match self.run_action(&node).await {
                    Ok(()) => self.follow(node_id, None).await,
                    Err(e) => Err(e),
                },
                NodeType::Condition => {
                    let passed = condition::evaluate(&node.config, &self.execution.context);
                    tracing::debug!("Condition {} evaluated to {}", node.label(), passed);
                    self.engine.events.emit(ExecutionEvent::ConditionEvaluated {
                        execution_id: self.execution.id,
                        node_id,
                        result: passed,
                        timestamp: Utc::now(),
                    });
                    self.follow(node_id, Some(ConditionType::from_bool(passed)))
                        .await
                }
                NodeType::Trigger => self.follow(node_id, None).await,
            };
            self.path.pop();
            result
        }
        .boxed()
    }

    /// Traverse the outgoing edges of `node_id`.
    ///
    /// With a branch, only edges tagged with that branch or untagged are
    /// taken. Without one (action and trigger nodes) every edge is taken.
    async fn follow(
        &mut self,
        node_id: NodeId,
        branch: Option<ConditionType>,
    ) -> Result<(), ExecutionError> {
        let edges = self.graph.outgoing(node_id).to_vec();
        for edge in edges {
            let take = match (branch, edge.condition_type) {
                (Some(taken), Some(tagged)) => taken == tagged,
                _ => true,
            };
            if take {
                self.visit(edge.to_node).await?;
            } else {
                tracing::debug!("Skipping edge {} -> {}", node_id, edge.to_node);
                self.engine.events.emit(ExecutionEvent::EdgeSkipped {
                    execution_id: self.execution.id,
                    from_node: node_id,
                    to_node: edge.to_node,
                    timestamp: Utc::now(),
                });
            }
        }
        Ok(())
    }

    async fn run_action(&mut self, node: &WorkflowNode) -> Result<(), ExecutionError> {
        let action_type = node
            .action_type
            .as_deref()
            .ok_or(ExecutionError::MissingActionType(node.id))?;
        let action = self
            .engine
            .registry
            .action(action_type)
            .ok_or_else(|| ExecutionError::UnknownActionType(action_type.to_string()))?;

        let errors = action.validate(&node.config);
        if !errors.is_empty() {
            return Err(ExecutionError::InvalidActionConfig(errors));
        }

        let start = Instant::now();
        let output = action
            .execute(&node.config, &self.execution.context)
            .await
            .map_err(|source| ExecutionError::ActionExecution {
                node_id: node.id,
                source,
            })?;
        let duration_ms = elapsed_ms(start);

        self.execution.record_action(node.id, output);
        if let Err(e) = self.engine.store.update_execution(&self.execution).await {
            if let StoreError::Conflict(reason) = &e {
                tracing::warn!(
                    "Execution {} was finalized elsewhere, stopping: {}",
                    self.execution.id,
                    reason
                );
            }
            return Err(e.into());
        }

        tracing::info!(
            "Action {} ({}) completed in {}ms",
            node.label(),
            action_type,
            duration_ms
        );
        self.engine.events.emit(ExecutionEvent::ActionCompleted {
            execution_id: self.execution.id,
            node_id: node.id,
            action_type: action_type.to_string(),
            duration_ms,
            timestamp: Utc::now(),
        });
        Ok(())
    }
}

fn elapsed_ms(since: Instant) -> u64 {
    u64::try_from(since.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "Unhandled panic during execution".to_string()
    }
}
