//! The call-graph pipeline: attachment followed by comdat assignment,
//! gated on a single enablement flag.

use cgs_ir::{ConfigError, Module, TargetConfig};
use rayon::prelude::*;

use crate::address_taken::AddressTakenPolicy;
use crate::attach::attach_type_metadata;
use crate::comdat::assign_comdats;

/// Which analyses survive a pipeline run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PreservedAnalyses {
    All,
    None,
}

/// Configuration of the call-graph pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallGraphConfig {
    /// Emit call-graph metadata at all.
    pub enabled: bool,
    pub target: TargetConfig,
    pub address_taken: AddressTakenPolicy,
}

impl CallGraphConfig {
    /// Enabled, with the default address-taken policy.
    pub fn new(target: TargetConfig) -> Self {
        Self {
            enabled: true,
            target,
            address_taken: AddressTakenPolicy::default(),
        }
    }

    /// A configuration under which the pipeline does nothing.
    pub fn disabled(target: TargetConfig) -> Self {
        Self {
            enabled: false,
            ..Self::new(target)
        }
    }

    pub fn from_triple(triple: &str) -> Result<Self, ConfigError> {
        TargetConfig::from_triple(triple).map(Self::new)
    }

    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_address_taken_policy(mut self, policy: AddressTakenPolicy) -> Self {
        self.address_taken = policy;
        self
    }
}

/// Attach type metadata, then assign comdats.
///
/// Does nothing when the configuration is disabled. Attachment only adds
/// metadata, so analyses are invalidated only if a comdat was assigned.
pub fn run_call_graph_pipeline(module: &mut Module, config: &CallGraphConfig) -> PreservedAnalyses {
    if !config.enabled {
        return PreservedAnalyses::All;
    }

    let _span = tracing::debug_span!("call_graph", module = %module.name).entered();
    attach_type_metadata(module, &config.target);
    if assign_comdats(module, &config.target, &config.address_taken) {
        PreservedAnalyses::None
    } else {
        PreservedAnalyses::All
    }
}

/// Run the pipeline over independent modules in parallel, one module per
/// task. Results are in module order.
pub fn run_on_modules(modules: &mut [Module], config: &CallGraphConfig) -> Vec<PreservedAnalyses> {
    modules
        .par_iter_mut()
        .map(|module| run_call_graph_pipeline(module, config))
        .collect()
}
