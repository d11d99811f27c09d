//! Standard capability library
//!
//! Descriptors for the business events that can start a workflow, plus a
//! handful of generic utility actions.

mod log;
mod time;
mod transform;
mod triggers;

pub use log::LogAction;
pub use time::DelayAction;
pub use transform::SetVariablesAction;
pub use triggers::EventTrigger;

use autocore::TriggerType;
use autoruntime::CapabilityRegistry;
use std::sync::Arc;

/// Register all standard triggers and actions with a registry
pub fn register_all(registry: &mut CapabilityRegistry) {
    for trigger_type in TriggerType::ALL {
        registry.register_trigger(Arc::new(EventTrigger::new(trigger_type)));
    }
    registry.register_action(Arc::new(LogAction));
    registry.register_action(Arc::new(SetVariablesAction));
    registry.register_action(Arc::new(DelayAction));
}
