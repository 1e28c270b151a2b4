//! Reads instance facts from the EC2 instance metadata service.
//!
//! Each fact is a single GET of a well-known path under the metadata base.
//! There are no internal retries; the instance cannot identify itself without
//! these facts, so callers treat any failure as fatal.

use crate::error::{self, Result};
use log::debug;
use reqwest::Client;
use snafu::{ensure, ResultExt};
use std::time::Duration;

/// How long to wait on any single metadata request.
const METADATA_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) struct MetadataClient {
    client: Client,
    base_uri: String,
}

impl MetadataClient {
    pub(crate) fn new<S: Into<String>>(base_uri: S) -> Result<Self> {
        let client = Client::builder()
            .timeout(METADATA_TIMEOUT)
            .build()
            .context(error::MetadataClientSnafu)?;
        Ok(Self {
            client,
            base_uri: base_uri.into(),
        })
    }

    /// Returns the availability zone the instance is running in.
    pub(crate) async fn fetch_availability_zone(&self) -> Result<String> {
        self.fetch_field("placement/availability-zone").await
    }

    /// Returns the instance's unique identifier.
    pub(crate) async fn fetch_instance_id(&self) -> Result<String> {
        self.fetch_field("instance-id").await
    }

    /// Returns the public IPv4 address currently attached to the instance.
    pub(crate) async fn fetch_public_ipv4(&self) -> Result<String> {
        self.fetch_field("public-ipv4").await
    }

    async fn fetch_field(&self, field: &str) -> Result<String> {
        let uri = format!("{}/{}", self.base_uri, field);
        debug!("Requesting {}", uri);
        let response = self
            .client
            .get(&uri)
            .send()
            .await
            .context(error::MetadataRequestSnafu { uri: uri.clone() })?
            .error_for_status()
            .context(error::MetadataResponseSnafu { uri: uri.clone() })?;
        response.text().await.context(error::MetadataBodySnafu { uri })
    }
}

/// Derives the region from an availability zone by dropping the zone's
/// trailing letter suffix, e.g. "us-west-2a" becomes "us-west-2".
pub(crate) fn region_from_zone(zone: &str) -> Result<&str> {
    let mut chars = zone.chars();
    ensure!(chars.next_back().is_some(), error::DeriveRegionSnafu { zone });
    Ok(chars.as_str())
}

#[cfg(test)]
mod test {
    use super::*;
    use httptest::{matchers::*, responders::*, Expectation, Server};

    #[tokio::test]
    async fn fetch_availability_zone() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path(
                "GET",
                "/latest/meta-data/placement/availability-zone",
            ))
            .respond_with(status_code(200).body("us-west-2a")),
        );
        let client = MetadataClient::new(server.url_str("/latest/meta-data")).unwrap();
        let zone = client.fetch_availability_zone().await.unwrap();
        assert_eq!(zone, "us-west-2a");
    }

    #[tokio::test]
    async fn fetch_instance_id() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/latest/meta-data/instance-id"))
                .respond_with(status_code(200).body("i-0123456789abcdef0")),
        );
        let client = MetadataClient::new(server.url_str("/latest/meta-data")).unwrap();
        let instance_id = client.fetch_instance_id().await.unwrap();
        assert_eq!(instance_id, "i-0123456789abcdef0");
    }

    #[tokio::test]
    async fn fetch_public_ipv4() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/latest/meta-data/public-ipv4"))
                .respond_with(status_code(200).body("203.0.113.10")),
        );
        let client = MetadataClient::new(server.url_str("/latest/meta-data")).unwrap();
        let public_ipv4 = client.fetch_public_ipv4().await.unwrap();
        assert_eq!(public_ipv4, "203.0.113.10");
    }

    #[tokio::test]
    async fn fetch_error_status_is_fatal() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/latest/meta-data/public-ipv4"))
                .respond_with(status_code(404)),
        );
        let client = MetadataClient::new(server.url_str("/latest/meta-data")).unwrap();
        assert!(client.fetch_public_ipv4().await.is_err());
    }

    #[tokio::test]
    async fn fetch_unreachable_endpoint_is_fatal() {
        let client = MetadataClient::new("http://localhost:0/latest/meta-data").unwrap();
        assert!(client.fetch_availability_zone().await.is_err());
    }

    #[test]
    fn region_from_zone_strips_suffix() {
        assert_eq!(region_from_zone("us-west-2a").unwrap(), "us-west-2");
        assert_eq!(region_from_zone("eu-central-1b").unwrap(), "eu-central-1");
    }

    #[test]
    fn region_from_empty_zone_is_an_error() {
        assert!(region_from_zone("").is_err());
    }
}
