use serde::{Deserialize, Serialize};

/// Identifier of a [`BlockingRule`] in the rule table.
pub type RuleId = u32;

/// A network redirect rule, shaped after the browser's declarative
/// network-request rules so that a browser-side shim can install it
/// without translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockingRule {
    pub id: RuleId,
    pub priority: u32,
    pub action: RuleAction,
    pub condition: RuleCondition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RuleAction {
    Redirect { redirect: Redirect },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redirect {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleCondition {
    pub url_filter: String,
    pub resource_types: Vec<ResourceType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    MainFrame,
}

impl BlockingRule {
    /// Creates a rule redirecting top-level page loads matching `url_filter`
    /// to `redirect_url`.
    pub fn redirect(id: RuleId, url_filter: String, redirect_url: String) -> Self {
        Self {
            id,
            priority: 1,
            action: RuleAction::Redirect {
                redirect: Redirect { url: redirect_url },
            },
            condition: RuleCondition {
                url_filter,
                resource_types: vec![ResourceType::MainFrame],
            },
        }
    }
}
