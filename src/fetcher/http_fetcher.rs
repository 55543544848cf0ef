use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use url::Url;

use crate::app::{Result, WeighbridgeError};
use crate::fetcher::{FetchConfig, FetchFailure, Fetcher, Page};

const ID_PLACEHOLDER: &str = "{id}";

pub struct HttpFetcher {
    client: Client,
    url_template: String,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        if !config.url_template.contains(ID_PLACEHOLDER) {
            return Err(WeighbridgeError::Other(format!(
                "URL template '{}' has no {} placeholder",
                config.url_template, ID_PLACEHOLDER
            )));
        }
        // Reject templates that cannot become a URL before any request is made
        Url::parse(&config.url_template.replace(ID_PLACEHOLDER, "probe"))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
        );
        let language = HeaderValue::from_str(&config.accept_language).map_err(|_| {
            WeighbridgeError::Other(format!(
                "accept_language '{}' is not a valid header value",
                config.accept_language.escape_debug()
            ))
        })?;
        headers.insert(ACCEPT_LANGUAGE, language);

        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(Duration::from_secs(config.timeout_secs.clamp(1, 5)))
            .gzip(true)
            .brotli(true)
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            url_template: config.url_template.clone(),
        })
    }

    /// Build the page URL for `identifier`, percent-encoding it.
    pub fn url_for(&self, identifier: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(identifier.as_bytes())
            .collect::<String>()
            // form encoding writes spaces as '+', which only queries understand
            .replace('+', "%20");
        self.url_template.replace(ID_PLACEHOLDER, &encoded)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_once(&self, identifier: &str) -> std::result::Result<Page, FetchFailure> {
        let url = self.url_for(identifier);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::Status(status.as_u16()));
        }

        let body = response.text().await?;

        Ok(Page {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_for_substitutes_and_encodes() {
        let config = FetchConfig {
            url_template: "https://shop.example.com/p/{id}?lang=en".into(),
            ..Default::default()
        };
        let fetcher = HttpFetcher::new(&config).unwrap();
        assert_eq!(
            fetcher.url_for("AB-12"),
            "https://shop.example.com/p/AB-12?lang=en"
        );
        assert_eq!(
            fetcher.url_for("a b/c"),
            "https://shop.example.com/p/a%20b%2Fc?lang=en"
        );
    }

    #[test]
    fn test_template_without_placeholder_is_rejected() {
        let config = FetchConfig {
            url_template: "https://shop.example.com/p/".into(),
            ..Default::default()
        };
        assert!(HttpFetcher::new(&config).is_err());
    }

    #[test]
    fn test_invalid_accept_language_is_rejected() {
        let config = FetchConfig {
            accept_language: "en\r\nX-Injected: 1".into(),
            ..Default::default()
        };
        assert!(matches!(
            HttpFetcher::new(&config),
            Err(WeighbridgeError::Other(msg)) if msg.contains("accept_language")
        ));
    }

    #[test]
    fn test_unparseable_template_is_rejected() {
        let config = FetchConfig {
            url_template: "not a url {id}".into(),
            ..Default::default()
        };
        assert!(matches!(
            HttpFetcher::new(&config),
            Err(WeighbridgeError::InvalidUrl(_))
        ));
    }
}
