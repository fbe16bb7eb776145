use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// The set of domains blocked while concentrating. Entries are normalized to
/// bare lower-case host names, so `"https://YouTube.com/watch"` and
/// `"youtube.com"` are the same site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct BlockedSiteList {
    sites: BTreeSet<String>,
}

impl BlockedSiteList {
    /// Creates an empty [`BlockedSiteList`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a site. Returns `false` if it was already present or is empty
    /// after normalization.
    pub fn insert(&mut self, site: &str) -> bool {
        match normalize(site) {
            Some(site) => self.sites.insert(site),
            None => false,
        }
    }

    /// Remove a site. Returns `true` if it was present.
    pub fn remove(&mut self, site: &str) -> bool {
        match normalize(site) {
            Some(site) => self.sites.remove(&site),
            None => false,
        }
    }

    pub fn contains(&self, site: &str) -> bool {
        normalize(site).is_some_and(|site| self.sites.contains(&site))
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    /// Iterate over the domains in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.sites.iter().map(String::as_str)
    }
}

impl<S: AsRef<str>> FromIterator<S> for BlockedSiteList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut list = Self::new();
        for site in iter {
            list.insert(site.as_ref());
        }
        list
    }
}

impl From<Vec<String>> for BlockedSiteList {
    fn from(value: Vec<String>) -> Self {
        value.into_iter().collect()
    }
}

impl From<BlockedSiteList> for Vec<String> {
    fn from(value: BlockedSiteList) -> Self {
        value.sites.into_iter().collect()
    }
}

fn normalize(site: &str) -> Option<String> {
    let lowered = site.trim().to_lowercase();
    let without_scheme = lowered
        .strip_prefix("https://")
        .or_else(|| lowered.strip_prefix("http://"))
        .unwrap_or(lowered.as_str());
    let host = without_scheme.split('/').next().unwrap_or_default();
    (!host.is_empty()).then(|| host.to_owned())
}
