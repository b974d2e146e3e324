// src/client/transport.rs

//! Transport seams between the retrying clients and an HTTP implementation.
//!
//! A transport sends one request once. Retrying and classification live in
//! the clients, so fakes in tests only need to replay attempts.

use async_trait::async_trait;
use reqwest::header::HeaderMap;

use crate::error::TransportError;
use crate::models::{UpstreamRequest, UpstreamResponse};

/// Blocking transport.
pub trait Transport {
    fn execute(&self, request: &UpstreamRequest) -> Result<UpstreamResponse, TransportError>;
}

/// Future-returning transport.
#[async_trait]
pub trait AsyncTransport: Send + Sync {
    async fn execute(&self, request: &UpstreamRequest)
    -> Result<UpstreamResponse, TransportError>;
}

impl Transport for reqwest::blocking::Client {
    fn execute(&self, request: &UpstreamRequest) -> Result<UpstreamResponse, TransportError> {
        let mut builder = self.request(request.method().into(), request.uri().clone());
        for (name, value) in request.headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(credentials) = request.credentials() {
            builder = builder.basic_auth(&credentials.username, Some(&credentials.password));
        }
        if let Some(body) = request.body() {
            builder = builder.body(body.to_string());
        }

        let response = builder.send()?;
        let status = response.status().as_u16();
        let headers = collect_headers(response.headers());
        let body = response.text()?;
        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }
}

#[async_trait]
impl AsyncTransport for reqwest::Client {
    async fn execute(
        &self,
        request: &UpstreamRequest,
    ) -> Result<UpstreamResponse, TransportError> {
        let mut builder = self.request(request.method().into(), request.uri().clone());
        for (name, value) in request.headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(credentials) = request.credentials() {
            builder = builder.basic_auth(&credentials.username, Some(&credentials.password));
        }
        if let Some(body) = request.body() {
            builder = builder.body(body.to_string());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = collect_headers(response.headers());
        let body = response.text().await?;
        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }
}

/// Copy response headers, skipping values that are not valid UTF-8.
fn collect_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpListener, TcpStream};
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Duration;

    use reqwest::header::{CONTENT_TYPE, HeaderValue};
    use serde_json::Value;
    use url::Url;

    use super::*;
    use crate::client::{BlockingUpstreamClient, UpstreamClient};
    use crate::models::{Attempt, Credentials, FailureReason, Outcome};
    use crate::retry::{Backoff, RetryPolicy};

    type Seen = Arc<Mutex<Vec<String>>>;

    /// Read one HTTP/1.1 request, headers plus a `Content-Length` body.
    fn read_request(stream: &mut TcpStream) -> String {
        let mut data = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).unwrap();
            if n == 0 {
                break;
            }
            data.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&data);
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        if name.eq_ignore_ascii_case("content-length") {
                            value.trim().parse::<usize>().ok()
                        } else {
                            None
                        }
                    })
                    .unwrap_or(0);
                if data.len() >= end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&data).into_owned()
    }

    /// Serve one connection per scripted response, recording each request.
    fn serve(responses: Vec<(u16, &'static str)>) -> (Url, Seen) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);

        thread::spawn(move || {
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().unwrap();
                let request = read_request(&mut stream);
                log.lock().unwrap().push(request);
                let response = format!(
                    "HTTP/1.1 {status} Scripted\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                stream.write_all(response.as_bytes()).unwrap();
            }
        });

        (base(addr), seen)
    }

    fn base(addr: SocketAddr) -> Url {
        Url::parse(&format!("http://{addr}/v2/")).unwrap()
    }

    fn blocking(
        timeout: Duration,
        policy: RetryPolicy,
    ) -> BlockingUpstreamClient<reqwest::blocking::Client> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
            .unwrap();
        BlockingUpstreamClient::new(client, policy)
    }

    #[test]
    fn collect_headers_skips_opaque_values() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("x-binary", HeaderValue::from_bytes(&[0xfa, 0xfb]).unwrap());

        let collected = collect_headers(&headers);
        assert_eq!(
            collected,
            vec![("content-type".to_string(), "application/json".to_string())]
        );
    }

    #[test]
    fn blocking_retries_server_errors_over_http() {
        let (base, seen) = serve(vec![(500, ""), (500, ""), (200, "[]")]);
        let client = blocking(Duration::from_secs(5), RetryPolicy::new(3, Backoff::None));

        let request = UpstreamRequest::post(base.join("projects").unwrap(), r#"{"title":"x"}"#)
            .with_institution("185")
            .with_credentials(Credentials {
                username: "u".into(),
                password: "p".into(),
            });
        let outcome = client.fetch::<Vec<Value>>(&request);

        assert_eq!(outcome, Outcome::Success(vec![]));
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);

        let raw = seen[2].to_lowercase();
        assert!(raw.starts_with("post /v2/projects "), "{raw}");
        assert!(raw.contains("cristin-representing-institution: 185"), "{raw}");
        assert!(raw.contains("authorization: basic dtpw"), "{raw}");
        assert!(raw.contains("content-type: application/json; charset=utf-8"), "{raw}");
        assert!(raw.ends_with(r#"{"title":"x"}"#), "{raw}");
    }

    #[test]
    fn blocking_refused_connection_is_transport_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = blocking(Duration::from_secs(5), RetryPolicy::new(3, Backoff::None));
        let settled = client.send_raw(&UpstreamRequest::get(base(addr).join("units").unwrap()));
        assert_eq!(settled.attempts, 3);
        assert!(matches!(
            settled.last,
            Attempt::Failed(TransportError::Connect(_))
        ));

        let outcome = client.send(&UpstreamRequest::get(base(addr).join("units").unwrap()));
        assert_eq!(
            outcome,
            Outcome::UpstreamFailure {
                status: None,
                reason: FailureReason::Transport
            }
        );
    }

    #[test]
    fn blocking_slow_upstream_is_timeout_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            read_request(&mut stream);
            thread::sleep(Duration::from_secs(2));
        });

        let client = blocking(Duration::from_millis(200), RetryPolicy::no_retry());
        let outcome = client.send(&UpstreamRequest::get(base(addr).join("persons/1").unwrap()));

        assert_eq!(
            outcome,
            Outcome::UpstreamFailure {
                status: None,
                reason: FailureReason::Timeout
            }
        );
    }

    #[test]
    fn invalid_request_is_not_transient() {
        let err = reqwest::Client::new().get("http://[::1").build().unwrap_err();
        let error = TransportError::from(err);

        assert!(matches!(error, TransportError::Request(_)));
        assert!(!error.is_transient());
    }

    #[tokio::test]
    async fn async_retries_and_reads_headers_over_http() {
        let (base, seen) = serve(vec![(503, ""), (200, r#"[{"id":1}]"#)]);
        let transport = reqwest::Client::builder().no_proxy().build().unwrap();
        let client = UpstreamClient::new(transport, RetryPolicy::new(3, Backoff::None));

        let response = client
            .send(&UpstreamRequest::get(base.join("units").unwrap()))
            .await
            .success()
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.header("Content-Type"), Some("application/json"));
        assert_eq!(response.body, r#"[{"id":1}]"#);
        assert_eq!(seen.lock().unwrap().len(), 2);
        assert!(seen.lock().unwrap()[1].starts_with("GET /v2/units "));
    }
}
