//! Authority time sources

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use timehack_core::{HackConfig, HackError, HackResult, UtcInstant};

use crate::{parse_authority_body, TimeBase};

/// Where a reading came from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Provenance {
    /// Answered by the named endpoint
    Endpoint(String),
    /// No endpoint answered; host wall clock
    LocalFallback,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Endpoint(name) => write!(f, "{}", name),
            Provenance::LocalFallback => write!(f, "local-fallback"),
        }
    }
}

/// One authority reading
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorityReading {
    pub instant: UtcInstant,
    pub provenance: Provenance,
}

impl AuthorityReading {
    pub fn from_endpoint(instant: UtcInstant, endpoint: impl Into<String>) -> Self {
        AuthorityReading {
            instant,
            provenance: Provenance::Endpoint(endpoint.into()),
        }
    }

    pub fn local(instant: UtcInstant) -> Self {
        AuthorityReading {
            instant,
            provenance: Provenance::LocalFallback,
        }
    }

    /// True when the reading is the local wall clock rather than an authority
    pub fn is_degraded(&self) -> bool {
        self.provenance == Provenance::LocalFallback
    }
}

/// A source of authoritative UTC time
///
/// Implementations are stateless across calls; the only side effects are
/// the fetches themselves.
#[async_trait]
pub trait AuthorityTimeSource: Send + Sync {
    /// Fetch from the highest-ranked endpoint that answers.
    /// Fails with `SourceUnavailable` when none does.
    async fn fetch(&self) -> HackResult<AuthorityReading>;

    /// Fetch, degrading to the host wall clock instead of failing
    async fn fetch_or_fallback(&self, base: &dyn TimeBase) -> AuthorityReading {
        match self.fetch().await {
            Ok(reading) => reading,
            Err(e) => {
                tracing::warn!(error = %e, "authority unavailable, using local wall clock");
                AuthorityReading::local(base.wall_clock())
            }
        }
    }
}

/// HTTP source trying a ranked list of JSON time endpoints
pub struct HttpAuthoritySource {
    client: reqwest::Client,
    endpoints: Vec<String>,
}

impl HttpAuthoritySource {
    pub fn new(endpoints: Vec<String>, timeout: Duration) -> HackResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HackError::TransportError(e.to_string()))?;

        Ok(HttpAuthoritySource { client, endpoints })
    }

    pub fn from_config(config: &HackConfig) -> HackResult<Self> {
        Self::new(config.endpoints.clone(), config.fetch_timeout())
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    async fn fetch_endpoint(&self, url: &str) -> HackResult<UtcInstant> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| HackError::TransportError(e.to_string()))?
            .error_for_status()
            .map_err(|e| HackError::TransportError(e.to_string()))?;

        let body = response
            .text()
            .await
            .map_err(|e| HackError::TransportError(e.to_string()))?;

        parse_authority_body(&body)
    }
}

#[async_trait]
impl AuthorityTimeSource for HttpAuthoritySource {
    async fn fetch(&self) -> HackResult<AuthorityReading> {
        for (rank, url) in self.endpoints.iter().enumerate() {
            match self.fetch_endpoint(url).await {
                Ok(instant) => {
                    tracing::debug!(endpoint = %url, rank, ?instant, "authority answered");
                    return Ok(AuthorityReading::from_endpoint(instant, url.as_str()));
                }
                Err(e) => {
                    tracing::debug!(endpoint = %url, rank, error = %e, "endpoint skipped");
                }
            }
        }
        Err(HackError::SourceUnavailable)
    }
}

/// Source with no endpoints: always unavailable
#[derive(Clone, Copy, Debug, Default)]
pub struct OfflineSource;

#[async_trait]
impl AuthorityTimeSource for OfflineSource {
    async fn fetch(&self) -> HackResult<AuthorityReading> {
        Err(HackError::SourceUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ManualTimeBase;

    #[tokio::test]
    async fn test_offline_source_falls_back_to_wall_clock() {
        let base = ManualTimeBase::new(UtcInstant::from_secs(42));

        assert_eq!(OfflineSource.fetch().await, Err(HackError::SourceUnavailable));

        let reading = OfflineSource.fetch_or_fallback(&base).await;
        assert!(reading.is_degraded());
        assert_eq!(reading.instant, UtcInstant::from_secs(42));
    }

    #[tokio::test]
    async fn test_http_source_without_endpoints_is_unavailable() {
        let source = HttpAuthoritySource::new(Vec::new(), Duration::from_secs(1)).unwrap();
        assert_eq!(source.fetch().await, Err(HackError::SourceUnavailable));
    }

    #[tokio::test]
    async fn test_http_source_skips_unreachable_endpoints() {
        // Port 9 on loopback refuses connections
        let source = HttpAuthoritySource::new(
            vec![
                "http://127.0.0.1:9/time".to_string(),
                "not a url".to_string(),
            ],
            Duration::from_millis(500),
        )
        .unwrap();

        assert_eq!(source.fetch().await, Err(HackError::SourceUnavailable));
    }

    /// Serve `body` as JSON on a loopback port, returning the endpoint URL
    async fn serve_json(body: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut request = [0u8; 2048];
                    let _ = stream.read(&mut request).await;
                    let response = format!(
                        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                        body.len(),
                        body
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });

        format!("http://{}/time", addr)
    }

    // 2024-03-10T14:05:30Z
    const T: i64 = 1_710_079_530_000;

    #[tokio::test]
    async fn test_http_source_falls_through_to_next_endpoint() {
        let good = serve_json(r#"{"utc_datetime": "2024-03-10T14:05:30Z"}"#).await;
        let source = HttpAuthoritySource::new(
            vec!["http://127.0.0.1:9/time".to_string(), good.clone()],
            Duration::from_secs(2),
        )
        .unwrap();

        let reading = source.fetch().await.unwrap();
        assert_eq!(reading.instant, UtcInstant::from_millis(T));
        assert_eq!(reading.provenance, Provenance::Endpoint(good));
    }

    #[tokio::test]
    async fn test_http_source_prefers_higher_rank() {
        let first = serve_json(r#"{"unixtime_ms": 1710079530000}"#).await;
        let second = serve_json(r#"{"unixtime_ms": 1710079599000}"#).await;
        let source = HttpAuthoritySource::new(
            vec![first.clone(), second],
            Duration::from_secs(2),
        )
        .unwrap();

        let reading = source.fetch().await.unwrap();
        assert_eq!(reading.instant, UtcInstant::from_millis(T));
        assert_eq!(reading.provenance, Provenance::Endpoint(first));
    }

    #[tokio::test]
    async fn test_http_source_skips_out_of_range_body() {
        let overflow = serve_json(r#"{"unixtime": 9223372036854775807}"#).await;
        let far = serve_json(r#"{"unixtime_ms": 9223372036854775807}"#).await;
        let good = serve_json(r#"{"datetime": "2024-03-10T14:05:30+00:00"}"#).await;
        let source = HttpAuthoritySource::new(
            vec![overflow, far, good.clone()],
            Duration::from_secs(2),
        )
        .unwrap();

        let reading = source.fetch().await.unwrap();
        assert_eq!(reading.instant, UtcInstant::from_millis(T));
        assert_eq!(reading.provenance, Provenance::Endpoint(good));
    }

    #[test]
    fn test_provenance_display() {
        let reading = AuthorityReading::from_endpoint(UtcInstant::EPOCH, "https://a.test");
        assert_eq!(reading.provenance.to_string(), "https://a.test");
        assert!(!reading.is_degraded());
        assert_eq!(Provenance::LocalFallback.to_string(), "local-fallback");
    }
}
