use super::{decode, graphql_data, Created, Executor, Kind, Request, Resolver, Result};
use crate::browser::{self, Browser};
use crate::config::Target;

use colored::*;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};

const CREATE_DISCUSSION: &str = "\
mutation($input: CreateDiscussionInput!) {
  createDiscussion(input: $input) {
    discussion {
      id
      url
    }
  }
}";

#[derive(Debug, Clone)]
struct UrlFor {
    repo: String,
    issues: String,
    graphql: String,
}

impl UrlFor {
    fn new(api: &str, target: &Target) -> Self {
        let repo = format!("{}/repos/{}", api, target);
        Self {
            issues: format!("{}/issues", repo),
            graphql: format!("{}/graphql", api),
            repo,
        }
    }
}

/// GitHub response to issue creation. Only the fields we need.
#[derive(Deserialize, Debug, Clone)]
struct Issue {
    html_url: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct CreateDiscussion {
    create_discussion: DiscussionPayload,
}

#[derive(Deserialize, Debug)]
struct DiscussionPayload {
    discussion: Discussion,
}

#[derive(Deserialize, Debug)]
struct Discussion {
    id: String,
    url: String,
}

/// Query document of a GraphQL request body, without its variables
fn query_text(body: &Value) -> &str {
    body["query"].as_str().unwrap_or_default()
}

/// Creates issues via the REST API and discussions via the GraphQL API of one repository.
#[derive(Debug)]
pub struct GitHub<E> {
    exec: E,
    target: Target,
    url_for: UrlFor,
    todo_label: Option<String>,
    meta: Resolver,
}

impl<E: Executor> GitHub<E> {
    pub fn new(exec: E, target: Target, api: &str) -> Self {
        let url_for = UrlFor::new(api.trim_end_matches('/'), &target);
        Self {
            exec,
            target,
            url_for,
            todo_label: None,
            meta: Resolver::new(),
        }
    }

    /// Attach this label to every issue created from now on
    pub fn with_todo_label(mut self, label: Option<String>) -> Self {
        self.todo_label = label;
        self
    }

    fn graphql(&self, body: &Value) -> Result<Value> {
        debug!("GraphQL request:\n{}", query_text(body));
        self.exec.execute(Method::POST, &self.url_for.graphql, Some(body))
    }

    fn metadata(&self) -> Result<&super::Metadata> {
        self.meta.get(|| {
            debug!("Querying metadata of {}", self.target);
            self.graphql(&Resolver::query(&self.target.owner, &self.target.name))
        })
    }

    /// Opaque GraphQL node id of the repository
    pub fn repository_id(&self) -> Result<&str> {
        Ok(self.metadata()?.repository_id())
    }

    /// Opaque GraphQL node id of a discussion category, looked up case-insensitively
    pub fn category_id(&self, name: &str) -> Result<&str> {
        self.metadata()?.category_id(name)
    }

    /// Checks that the repository is reachable with the configured credentials
    pub fn ping(&self) -> Result<Value> {
        self.exec.execute(Method::GET, &self.url_for.repo, None)
    }

    pub fn create_issue(&self, title: &str, body: Option<&str>) -> Result<Created> {
        let mut payload = json!({
            "title": title,
            "body": body,
        });
        if let Some(label) = &self.todo_label {
            payload["labels"] = json!([label]);
        }
        let res = self
            .exec
            .execute(Method::POST, &self.url_for.issues, Some(&payload))?;
        let iss: Issue = decode(res)?;
        Ok(Created { url: iss.html_url })
    }

    pub fn create_discussion(
        &self,
        title: &str,
        body: Option<&str>,
        category: &str,
    ) -> Result<Created> {
        let repository_id = self.repository_id()?;
        let category_id = self.category_id(category)?;
        let req = json!({
            "query": CREATE_DISCUSSION,
            "variables": {
                "input": {
                    "repositoryId": repository_id,
                    "categoryId": category_id,
                    "title": title,
                    "body": body.unwrap_or_default(),
                }
            }
        });
        debug!("Creating discussion in category {}", category);
        let res: CreateDiscussion = graphql_data(self.graphql(&req)?)?;
        let d = res.create_discussion.discussion;
        debug!("Discussion id {}", d.id);
        Ok(Created { url: d.url })
    }

    /// Creates whatever `req` asks for and optionally opens the result in a browser.
    ///
    /// Nothing is opened if creation fails.
    pub fn submit(&self, req: &Request, browser: &dyn Browser) -> Result<Created> {
        let body = req.body.as_deref();
        let created = match &req.kind {
            Kind::Issue => self.create_issue(&req.title, body)?,
            Kind::Discussion { category } => {
                self.create_discussion(&req.title, body, category)?
            }
        };
        info!("Created {} {}", req.kind, created.url.green());
        if req.open {
            browser::open_delayed(browser, &created.url);
        }
        Ok(created)
    }
}
