mod github;
mod http;
mod metadata;

pub use github::GitHub;
pub use http::Http;
pub use metadata::{Metadata, Resolver};

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Cannot reach GitHub API")]
    Transport(#[source] reqwest::Error),
    #[error("GitHub API request failed with status {status}: {body}")]
    Remote { status: u16, body: String },
    #[error("Invalid GitHub API response: {res}")]
    Malformed {
        res: String,
        #[source]
        e: serde_json::Error,
    },
    #[error("Unknown discussion category '{name}'")]
    UnknownCategory { name: String },
    #[error("Trying to construct invalid HTTP header")]
    Header(#[from] reqwest::header::InvalidHeaderValue),
}

type Result<T, E = Error> = std::result::Result<T, E>;

/// Performs a single authenticated call against the GitHub API.
///
/// Implementations must map non-2xx responses to [`Error::Remote`] and must not retry.
pub trait Executor {
    fn execute(&self, method: Method, url: &str, body: Option<&Value>) -> Result<Value>;
}

/// Which kind of GitHub object a request ends up as
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kind {
    /// TODO item, closeable
    Issue,
    /// NOTE or DOC, filed under the named discussion category
    Discussion { category: String },
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Issue => write!(f, "issue"),
            Kind::Discussion { .. } => write!(f, "discussion"),
        }
    }
}

/// Everything needed to create one object. Consumed by [`GitHub::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub kind: Kind,
    pub title: String,
    pub body: Option<String>,
    /// Open the created object in a browser afterwards
    pub open: bool,
}

/// Newly created issue or discussion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Created {
    pub url: String,
}

/// Decodes a JSON value into `T`, keeping the raw response for error reporting.
fn decode<T: DeserializeOwned>(res: Value) -> Result<T> {
    let raw = res.to_string();
    serde_json::from_value(res).map_err(|e| Error::Malformed { res: raw, e })
}

/// GraphQL response envelope. GitHub reports query errors with status 200.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

/// Unpacks the `data` part of a GraphQL response into `T`.
///
/// An `errors` array is turned into [`Error::Remote`] even if partial data is present.
fn graphql_data<T: DeserializeOwned>(res: Value) -> Result<T> {
    let raw = res.to_string();
    let env: Envelope = serde_json::from_value(res).map_err(|e| Error::Malformed {
        res: raw.clone(),
        e,
    })?;
    if !env.errors.is_empty() {
        let msgs: Vec<&str> = env.errors.iter().map(|e| e.message.as_str()).collect();
        return Err(Error::Remote {
            status: 200,
            body: msgs.join("; "),
        });
    }
    serde_json::from_value(env.data.unwrap_or(Value::Null))
        .map_err(|e| Error::Malformed { res: raw, e })
}
