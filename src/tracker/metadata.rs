//! Repository metadata needed for GraphQL mutations.
//!
//! GitHub's discussion API addresses repositories and categories by opaque node ids. Both are
//! fetched with a single query and kept for the lifetime of the [`Resolver`].

use super::{graphql_data, Error, Result};

use serde::Deserialize;
use serde_json::{json, Value};
use std::cell::OnceCell;
use std::collections::HashMap;

/// Only the first page of categories is fetched. Categories beyond that are not resolvable.
pub const MAX_CATEGORIES: usize = 10;

const REPOSITORY_QUERY: &str = "\
query($owner: String!, $name: String!, $first: Int!) {
  repository(owner: $owner, name: $name) {
    id
    discussionCategories(first: $first) {
      nodes {
        id
        name
      }
    }
  }
}";

#[derive(Debug, Deserialize)]
struct Data {
    repository: Repository,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Repository {
    id: String,
    discussion_categories: Nodes,
}

#[derive(Debug, Deserialize)]
struct Nodes {
    #[serde(default)]
    nodes: Vec<Category>,
}

#[derive(Debug, Deserialize)]
struct Category {
    id: String,
    name: String,
}

/// Repository node id plus discussion category ids keyed by lowercased display name
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Metadata {
    repository_id: String,
    categories: HashMap<String, String>,
}

impl Metadata {
    /// Builds metadata from `(display name, id)` pairs. If two names collide after lowercasing,
    /// the later one wins.
    pub fn new<I, N, C>(repository_id: &str, categories: I) -> Self
    where
        I: IntoIterator<Item = (N, C)>,
        N: AsRef<str>,
        C: Into<String>,
    {
        Self {
            repository_id: repository_id.to_owned(),
            categories: categories
                .into_iter()
                .map(|(name, id)| (name.as_ref().to_lowercase(), id.into()))
                .collect(),
        }
    }

    fn from_response(res: Value) -> Result<Self> {
        let data: Data = graphql_data(res)?;
        let repo = data.repository;
        Ok(Self::new(
            &repo.id,
            repo.discussion_categories
                .nodes
                .into_iter()
                .map(|c| (c.name, c.id)),
        ))
    }

    pub fn repository_id(&self) -> &str {
        &self.repository_id
    }

    /// Looks up a category id by display name, ignoring case
    pub fn category_id(&self, name: &str) -> Result<&str> {
        self.categories
            .get(&name.to_lowercase())
            .map(String::as_str)
            .ok_or_else(|| Error::UnknownCategory {
                name: name.to_owned(),
            })
    }
}

/// Fetches [`Metadata`] at most once.
///
/// The cache is filled only after a successful fetch, so a failed lookup may be retried.
#[derive(Debug, Default)]
pub struct Resolver {
    cache: OnceCell<Metadata>,
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// GraphQL request body for the metadata lookup
    pub fn query(owner: &str, name: &str) -> Value {
        json!({
            "query": REPOSITORY_QUERY,
            "variables": {
                "owner": owner,
                "name": name,
                "first": MAX_CATEGORIES,
            }
        })
    }

    /// Returns cached metadata or calls `fetch` to get the raw GraphQL response.
    pub fn get<F>(&self, fetch: F) -> Result<&Metadata>
    where
        F: FnOnce() -> Result<Value>,
    {
        if let Some(m) = self.cache.get() {
            return Ok(m);
        }
        let m = Metadata::from_response(fetch()?)?;
        debug!("Resolved {} discussion categories", m.categories.len());
        Ok(self.cache.get_or_init(|| m))
    }
}
