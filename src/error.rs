//! Provides the list of errors for `eip-associate`.

use snafu::Snafu;

pub(crate) type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(super)))]
pub(crate) enum Error {
    #[snafu(display("AssociateAddress request failed: {}", message))]
    AssociateAddress { message: String },

    #[snafu(display("Cannot derive a region from availability zone '{}'", zone))]
    DeriveRegion { zone: String },

    #[snafu(display("DescribeAddresses request failed: {}", message))]
    DescribeAddresses { message: String },

    #[snafu(display("EC2 {} request timed out: {}", operation, source))]
    Ec2Timeout {
        operation: &'static str,
        source: tokio::time::error::Elapsed,
    },

    #[snafu(display("No usable addresses in '{}'", eips))]
    EmptyPool { eips: String },

    #[snafu(display("Failed to read response body from '{}': {}", uri, source))]
    MetadataBody { uri: String, source: reqwest::Error },

    #[snafu(display("Failed to build metadata HTTP client: {}", source))]
    MetadataClient { source: reqwest::Error },

    #[snafu(display("Failed to fetch '{}': {}", uri, source))]
    MetadataRequest { uri: String, source: reqwest::Error },

    #[snafu(display("Unexpected response from '{}': {}", uri, source))]
    MetadataResponse { uri: String, source: reqwest::Error },

    #[snafu(display("None of the pool addresses exist in the provider inventory"))]
    NoPoolAddresses,

    #[snafu(display("Unable to associate public ip after {} candidate checks", attempts))]
    RetriesExhausted { attempts: u32 },
}
