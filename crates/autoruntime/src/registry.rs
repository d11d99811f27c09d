use autocore::{Action, ConfigField, Trigger, TriggerVariable};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// A registrable trigger or action implementation
#[derive(Clone)]
pub enum Capability {
    Trigger(Arc<dyn Trigger>),
    Action(Arc<dyn Action>),
}

impl Capability {
    pub fn id(&self) -> &str {
        match self {
            Capability::Trigger(t) => t.id(),
            Capability::Action(a) => a.id(),
        }
    }

    pub fn category(&self) -> &str {
        match self {
            Capability::Trigger(t) => t.category(),
            Capability::Action(a) => a.category(),
        }
    }

    pub fn info(&self) -> CapabilityInfo {
        match self {
            Capability::Trigger(t) => CapabilityInfo {
                id: t.id().to_string(),
                kind: CapabilityKind::Trigger,
                name: t.name().to_string(),
                description: t.description().to_string(),
                category: t.category().to_string(),
                config_schema: Vec::new(),
                variables: t.variables(),
            },
            Capability::Action(a) => CapabilityInfo {
                id: a.id().to_string(),
                kind: CapabilityKind::Action,
                name: a.name().to_string(),
                description: a.description().to_string(),
                category: a.category().to_string(),
                config_schema: a.config_schema(),
                variables: Vec::new(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityKind {
    Trigger,
    Action,
}

/// Catalogue entry describing a registered capability
#[derive(Debug, Clone, Serialize)]
pub struct CapabilityInfo {
    pub id: String,
    pub kind: CapabilityKind,
    pub name: String,
    pub description: String,
    pub category: String,
    pub config_schema: Vec<ConfigField>,
    pub variables: Vec<TriggerVariable>,
}

/// Static catalogue of triggers and actions, populated at startup.
///
/// Triggers and actions live in separate namespaces; registering an id that
/// already exists in the same namespace replaces the earlier entry.
pub struct CapabilityRegistry {
    triggers: HashMap<String, Arc<dyn Trigger>>,
    actions: HashMap<String, Arc<dyn Action>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self {
            triggers: HashMap::new(),
            actions: HashMap::new(),
        }
    }

    pub fn register(&mut self, capability: Capability) {
        match capability {
            Capability::Trigger(trigger) => self.register_trigger(trigger),
            Capability::Action(action) => self.register_action(action),
        }
    }

    pub fn register_trigger(&mut self, trigger: Arc<dyn Trigger>) {
        let id = trigger.id().to_string();
        tracing::info!("Registering trigger: {}", id);
        self.triggers.insert(id, trigger);
    }

    pub fn register_action(&mut self, action: Arc<dyn Action>) {
        let id = action.id().to_string();
        tracing::info!("Registering action: {}", id);
        self.actions.insert(id, action);
    }

    /// Look up a capability by id, actions first.
    pub fn lookup(&self, id: &str) -> Option<Capability> {
        self.action(id)
            .map(Capability::Action)
            .or_else(|| self.trigger(id).map(Capability::Trigger))
    }

    pub fn action(&self, id: &str) -> Option<Arc<dyn Action>> {
        self.actions.get(id).cloned()
    }

    pub fn trigger(&self, id: &str) -> Option<Arc<dyn Trigger>> {
        self.triggers.get(id).cloned()
    }

    /// All capabilities, optionally restricted to one category, sorted by id.
    pub fn list(&self, category: Option<&str>) -> Vec<CapabilityInfo> {
        let mut all = self.list_triggers(category);
        all.extend(self.list_actions(category));
        all
    }

    pub fn list_actions(&self, category: Option<&str>) -> Vec<CapabilityInfo> {
        Self::collect(
            self.actions.values().cloned().map(Capability::Action),
            category,
        )
    }

    pub fn list_triggers(&self, category: Option<&str>) -> Vec<CapabilityInfo> {
        Self::collect(
            self.triggers.values().cloned().map(Capability::Trigger),
            category,
        )
    }

    pub fn categories(&self) -> Vec<String> {
        let set: BTreeSet<String> = self
            .triggers
            .values()
            .map(|t| t.category().to_string())
            .chain(self.actions.values().map(|a| a.category().to_string()))
            .collect();
        set.into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.triggers.len() + self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn collect(
        capabilities: impl Iterator<Item = Capability>,
        category: Option<&str>,
    ) -> Vec<CapabilityInfo> {
        let mut infos: Vec<CapabilityInfo> = capabilities
            .filter(|c| category.map_or(true, |wanted| c.category() == wanted))
            .map(|c| c.info())
            .collect();
        infos.sort_by(|a, b| a.id.cmp(&b.id));
        infos
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::new()
    }
}
