use super::{Error, Executor, Result};

use clap::{crate_name, crate_version};
use reqwest::blocking::Client;
use reqwest::header::*;
use reqwest::Method;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// Blocking HTTP client which authenticates every request with the configured token.
#[derive(Clone)]
pub struct Http {
    client: Client,
    token: String,
}

impl fmt::Debug for Http {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Http").field("token", &"<redacted>").finish()
    }
}

impl Http {
    pub fn new(token: &str, timeout: Duration) -> Result<Self> {
        let mut h = HeaderMap::new();
        h.insert(ACCEPT, "application/vnd.github+json".parse()?);
        h.insert(
            USER_AGENT,
            format!("{}/{}", crate_name!(), crate_version!()).parse()?,
        );
        let client = Client::builder()
            .default_headers(h)
            .timeout(timeout)
            .build()
            .map_err(Error::Transport)?;
        Ok(Self {
            client,
            token: token.to_owned(),
        })
    }
}

impl Executor for Http {
    fn execute(&self, method: Method, url: &str, body: Option<&Value>) -> Result<Value> {
        let mut req = self
            .client
            .request(method, url)
            .basic_auth("token", Some(&self.token));
        if let Some(body) = body {
            req = req.json(body);
        }
        let res = req.send().map_err(Error::Transport)?;
        let status = res.status();
        let txt = res.text().map_err(Error::Transport)?;
        if !status.is_success() {
            return Err(Error::Remote {
                status: status.as_u16(),
                body: txt,
            });
        }
        if txt.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&txt).map_err(|e| Error::Malformed { res: txt, e })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    /// Accepts a single connection on a loopback port, answers with `status` and `body` and
    /// hands back the raw request.
    fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let url = format!("http://{}/repos/owner/repo", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = stream.read(&mut chunk).expect("read request");
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                let req = String::from_utf8_lossy(&buf).to_string();
                if let Some(end) = req.find("\r\n\r\n") {
                    let len = header(&req, "content-length")
                        .and_then(|l| l.parse::<usize>().ok())
                        .unwrap_or(0);
                    if buf.len() >= end + 4 + len {
                        break;
                    }
                }
            }
            write!(
                stream,
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            )
            .expect("write response");
            String::from_utf8_lossy(&buf).to_string()
        });
        (url, handle)
    }

    /// Header value by case-insensitive name
    fn header(req: &str, name: &str) -> Option<String> {
        req.lines().find_map(|l| {
            let mut kv = l.splitn(2, ':');
            match (kv.next(), kv.next()) {
                (Some(k), Some(v)) if k.trim().eq_ignore_ascii_case(name) => {
                    Some(v.trim().to_owned())
                }
                _ => None,
            }
        })
    }

    fn http() -> Http {
        Http::new("secret", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn non_success_status_is_remote_error() {
        let (url, server) = serve_once("404 Not Found", "not found");
        assert_matches!(
            http().execute(Method::GET, &url, None),
            Err(Error::Remote { status: 404, body }) if body == "not found"
        );
        let req = server.join().unwrap();
        assert!(req.starts_with("GET /repos/owner/repo "));
    }

    #[test]
    fn sends_token_as_basic_auth() {
        let (url, server) = serve_once("200 OK", "{}");
        http().execute(Method::GET, &url, None).unwrap();
        let req = server.join().unwrap();
        // base64("token:secret")
        assert_eq!(
            header(&req, "authorization").as_deref(),
            Some("Basic dG9rZW46c2VjcmV0")
        );
        assert_eq!(
            header(&req, "accept").as_deref(),
            Some("application/vnd.github+json")
        );
        assert!(header(&req, "user-agent").unwrap().starts_with("ghpm/"));
    }

    #[test]
    fn posts_json_body() {
        let (url, server) = serve_once("201 Created", r#"{"html_url": "https://x/issues/1"}"#);
        let res = http()
            .execute(Method::POST, &url, Some(&json!({"title": "t"})))
            .unwrap();
        assert_eq!(res["html_url"], "https://x/issues/1");
        let req = server.join().unwrap();
        assert!(req.starts_with("POST "));
        assert_eq!(
            header(&req, "content-type").as_deref(),
            Some("application/json")
        );
        assert!(req.ends_with(r#"{"title":"t"}"#));
    }

    #[test]
    fn non_json_success_is_malformed() {
        let (url, server) = serve_once("200 OK", "<html>hi</html>");
        assert_matches!(
            http().execute(Method::GET, &url, None),
            Err(Error::Malformed { res, .. }) if res == "<html>hi</html>"
        );
        server.join().unwrap();
    }

    #[test]
    fn empty_success_is_null() {
        let (url, server) = serve_once("200 OK", "");
        assert_eq!(http().execute(Method::GET, &url, None).unwrap(), Value::Null);
        server.join().unwrap();
    }

    #[test]
    fn unreachable_host_is_transport_error() {
        // port 9 (discard) on localhost is not expected to accept connections
        assert_matches!(
            http().execute(Method::GET, "http://127.0.0.1:9/", None),
            Err(Error::Transport(_))
        );
    }
}
