use std::sync::Arc;

use url::Url;

use crate::domain::daemon::outbound::{RuleTableError, RuleTablePort};
use crate::domain::entity::{BlockedSiteList, BlockingRule, Mode, RuleId, TimerStatus};
use crate::tracing_report;

const BLOCKED_PARAMETER: &str = "blocked";

/// The page a blocked request is redirected to. The blocked domain travels
/// in the `blocked` query parameter so the page can display it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockedPage {
    base: Url,
}

impl BlockedPage {
    /// Creates a new [`BlockedPage`] redirecting to `base`. Any query of
    /// `base` is discarded.
    pub fn new(mut base: Url) -> Self {
        base.set_query(None);
        Self { base }
    }

    /// Returns the redirect target for a request to `domain`.
    pub fn redirect_for(&self, domain: &str) -> Url {
        let mut url = self.base.clone();
        url.query_pairs_mut().append_pair(BLOCKED_PARAMETER, domain);
        url
    }

    /// Read the blocked domain back out of a redirect target.
    pub fn blocked_domain(url: &Url) -> Option<String> {
        url.query_pairs()
            .find(|(key, _)| key == BLOCKED_PARAMETER)
            .map(|(_, value)| value.into_owned())
    }
}

/// Derive the rule set for the given state. Blocking is active only while a
/// focus session is running; each domain expands to four rules covering the
/// bare domain and its subdomains, with and without a path.
pub fn derive_rules(
    mode: Mode,
    status: TimerStatus,
    sites: &BlockedSiteList,
    page: &BlockedPage,
) -> Vec<BlockingRule> {
    if mode != Mode::Focus || status != TimerStatus::Running {
        return Vec::new();
    }

    sites
        .iter()
        .enumerate()
        .flat_map(|(index, site)| {
            let base_id = index as RuleId * 4 + 1;
            let redirect = page.redirect_for(site).to_string();
            [
                format!("*://{site}"),
                format!("*://{site}/*"),
                format!("*://*.{site}"),
                format!("*://*.{site}/*"),
            ]
            .into_iter()
            .zip(base_id..)
            .map(move |(filter, id)| BlockingRule::redirect(id, filter, redirect.clone()))
        })
        .collect()
}

/// Keeps the platform's rule table consistent with the timer state and the
/// blocked site list. A changed rule set replaces the whole table.
pub struct BlockingSynchronizer {
    table: Arc<dyn RuleTablePort>,
    page: BlockedPage,
}

impl BlockingSynchronizer {
    /// Creates a new [`BlockingSynchronizer`].
    pub fn new(table: Arc<dyn RuleTablePort>, page: BlockedPage) -> Self {
        Self { table, page }
    }

    /// Recompute and install the rule set. Failures are logged; the next
    /// update starts from whatever the table contains by then.
    pub async fn update_blocking(&self, mode: Mode, status: TimerStatus, sites: &BlockedSiteList) {
        let rules = derive_rules(mode, status, sites, &self.page);
        if let Err(err) = self.apply(rules).await {
            tracing_report!(err, "Could not update blocking rules");
        }
    }

    async fn apply(&self, rules: Vec<BlockingRule>) -> Result<(), RuleTableError> {
        let installed = self.table.dynamic_rules().await?;
        if installed == rules {
            return Ok(());
        }

        let installed: Vec<RuleId> = installed.into_iter().map(|rule| rule.id).collect();

        tracing::debug!(
            removed = installed.len(),
            added = rules.len(),
            "Replacing blocking rules"
        );
        self.table.update_dynamic_rules(installed, rules).await
    }
}
