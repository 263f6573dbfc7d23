use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::error::ValidationError;
use crate::validation::Validate;

/// The bootstrapped demo workspace returned by strategy provisioning.
///
/// Seeds are immutable once returned; a newer seed replaces the old one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategySeed {
    pub strategy_id: String,
    pub name: String,
    pub version_id: String,
    pub version_label: String,
    /// Blocks in canvas order
    pub blocks: Vec<StrategyBlock>,
    /// Directed connections between blocks
    pub edges: Vec<StrategyEdge>,
    /// Onboarding hint cards
    pub callouts: Vec<OnboardingCallout>,
}

/// Category of a configuration block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockKind {
    DataSource,
    Indicator,
    Signal,
    Execution,
    Risk,
}

/// A single node in the strategy graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyBlock {
    pub id: String,
    pub kind: BlockKind,
    pub label: String,
    pub position: Position,
    /// Free-form block configuration
    pub config: Map<String, Value>,
}

/// Canvas coordinates of a block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A directed edge; both ends reference block ids of the same seed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyEdge {
    pub id: String,
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalloutAction {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

/// An onboarding hint card shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingCallout {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_action: Option<CalloutAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_action: Option<CalloutAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_text: Option<String>,
}

impl StrategySeed {
    /// Looks up a block by id.
    pub fn block(&self, id: &str) -> Option<&StrategyBlock> {
        self.blocks.iter().find(|block| block.id == id)
    }

    pub fn callout(&self, id: &str) -> Option<&OnboardingCallout> {
        self.callouts.iter().find(|callout| callout.id == id)
    }

    /// Callouts sorted by `order`; unordered callouts go last in their
    /// original relative order.
    pub fn ordered_callouts(&self) -> Vec<&OnboardingCallout> {
        let mut ordered: Vec<&OnboardingCallout> = self.callouts.iter().collect();
        ordered.sort_by(|a, b| {
            let a = a.order.unwrap_or(f64::MAX);
            let b = b.order.unwrap_or(f64::MAX);
            a.total_cmp(&b)
        });
        ordered
    }
}

impl Validate for StrategySeed {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut block_ids = HashSet::with_capacity(self.blocks.len());
        for block in &self.blocks {
            if !block_ids.insert(block.id.as_str()) {
                return Err(ValidationError::new(format!(
                    "duplicate block id '{}'",
                    block.id
                )));
            }
        }

        for edge in &self.edges {
            for end in [&edge.source, &edge.target] {
                if !block_ids.contains(end.as_str()) {
                    return Err(ValidationError::new(format!(
                        "edge '{}' references unknown block '{}'",
                        edge.id, end
                    )));
                }
            }
        }

        Ok(())
    }
}
