use std::time::Duration;

use url::Url;

use crate::{
    error::Result,
    writer::{BodyWriter, SingleFlushHttpWriter, UreqConnection},
};

pub const DEFAULT_BASE_URL: &str = "https://app.datadoghq.com/api/v1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(2500);

pub trait TransportFactory {
    type Writer: BodyWriter;
    fn open(&self, url: &Url) -> Result<Self::Writer>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportConfig {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}
impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_TIMEOUT,
            read_timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HttpTransportFactory {
    config: TransportConfig,
}
impl HttpTransportFactory {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }
}
impl TransportFactory for HttpTransportFactory {
    type Writer = SingleFlushHttpWriter<UreqConnection>;
    fn open(&self, url: &Url) -> Result<Self::Writer> {
        let conn = UreqConnection::new(
            url.to_string(),
            self.config.connect_timeout,
            self.config.read_timeout,
        );
        Ok(SingleFlushHttpWriter::new(conn))
    }
}

/// Series and event URLs, each carrying the API key as a query parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub series: Url,
    pub events: Url,
}
impl Endpoints {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, EndpointError> {
        let base = Url::parse(base_url)?;
        if base.cannot_be_a_base() || base.query().is_some() || base.fragment().is_some() {
            return Err(EndpointError::InvalidBase(base_url.to_string()));
        }
        let endpoint = |path: &str| {
            let mut url = base.clone();
            if let Ok(mut segments) = url.path_segments_mut() {
                segments.pop_if_empty().push(path);
            }
            url.query_pairs_mut().append_pair("api_key", api_key);
            url
        };
        Ok(Self {
            series: endpoint("series"),
            events: endpoint("events"),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    #[error(transparent)]
    Parse(#[from] url::ParseError),
    #[error("base url {0} must be a plain path without query or fragment")]
    InvalidBase(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_endpoints() {
        let endpoints = Endpoints::new(DEFAULT_BASE_URL, "abc").unwrap();
        assert_eq!(
            endpoints.series.as_str(),
            "https://app.datadoghq.com/api/v1/series?api_key=abc"
        );
        assert_eq!(
            endpoints.events.as_str(),
            "https://app.datadoghq.com/api/v1/events?api_key=abc"
        );
    }

    #[test]
    fn api_key_is_query_encoded() {
        let endpoints = Endpoints::new("http://127.0.0.1:8080/api/v1/", "a&b c").unwrap();
        assert_eq!(
            endpoints.series.as_str(),
            "http://127.0.0.1:8080/api/v1/series?api_key=a%26b+c"
        );
        let key = endpoints
            .series
            .query_pairs()
            .find(|(k, _)| k == "api_key")
            .map(|(_, v)| v.into_owned());
        assert_eq!(key.as_deref(), Some("a&b c"));
    }

    #[test]
    fn invalid_base() {
        assert!(matches!(
            Endpoints::new("not a url", "k"),
            Err(EndpointError::Parse(_))
        ));
        for base in [
            "http://h/api/v1?region=eu",
            "http://h/api/v1#frag",
            "mailto:ops@example.com",
        ] {
            assert!(
                matches!(Endpoints::new(base, "k"), Err(EndpointError::InvalidBase(_))),
                "{base}"
            );
        }
    }

    #[test]
    fn segment_is_appended_to_the_path() {
        let endpoints = Endpoints::new("http://h:8080", "k").unwrap();
        assert_eq!(endpoints.series.as_str(), "http://h:8080/series?api_key=k");
        let endpoints = Endpoints::new("http://h/api/v1", "k").unwrap();
        assert_eq!(endpoints.events.path(), "/api/v1/events");
        assert_eq!(endpoints.events.query(), Some("api_key=k"));
    }

    #[test]
    fn factory_opens_fresh_writer() {
        let factory = HttpTransportFactory::default();
        let url = Url::parse("http://127.0.0.1:1/series").unwrap();
        let wtr = factory.open(&url).unwrap();
        assert_eq!(wtr.state(), crate::writer::WriterState::Open);
        assert!(wtr.buffered().is_empty());
    }
}
