//! EC2-backed implementation of the address operations.

use crate::associate::{AddressApi, Eip};
use crate::error::{self, Result};
use async_trait::async_trait;
use aws_smithy_types::error::display::DisplayErrorContext;
use aws_types::region::Region;
use log::debug;
use snafu::ResultExt;
use std::time::Duration;
use tokio::time::timeout;

/// Limit how long a single EC2 API call may take.
const EC2_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) struct Ec2Client {
    client: aws_sdk_ec2::Client,
}

impl Ec2Client {
    pub(crate) async fn new(region: &str) -> Self {
        let config = aws_config::from_env()
            .region(Region::new(region.to_owned()))
            .load()
            .await;
        Self {
            client: aws_sdk_ec2::Client::new(&config),
        }
    }
}

#[async_trait]
impl AddressApi for Ec2Client {
    async fn describe_addresses(&self) -> Result<Vec<Eip>> {
        let resp = timeout(EC2_REQUEST_TIMEOUT, self.client.describe_addresses().send())
            .await
            .context(error::Ec2TimeoutSnafu {
                operation: "DescribeAddresses",
            })?
            .map_err(|e| {
                error::DescribeAddressesSnafu {
                    message: DisplayErrorContext(&e).to_string(),
                }
                .build()
            })?;

        // Addresses without a public IP cannot be pool members; drop them.
        let addresses = resp
            .addresses
            .unwrap_or_default()
            .into_iter()
            .filter_map(|address| {
                let public_ip = address.public_ip?;
                Some(Eip {
                    public_ip,
                    allocation_id: address.allocation_id,
                    instance_id: address.instance_id,
                })
            })
            .collect();
        Ok(addresses)
    }

    async fn associate_address(
        &self,
        allocation_id: Option<&str>,
        instance_id: &str,
    ) -> Result<()> {
        debug!(
            "requesting association of {:?} with {}",
            allocation_id, instance_id
        );
        timeout(
            EC2_REQUEST_TIMEOUT,
            self.client
                .associate_address()
                .set_allocation_id(allocation_id.map(str::to_string))
                .instance_id(instance_id)
                .send(),
        )
        .await
        .context(error::Ec2TimeoutSnafu {
            operation: "AssociateAddress",
        })?
        .map_err(|e| {
            error::AssociateAddressSnafu {
                message: DisplayErrorContext(&e).to_string(),
            }
            .build()
        })?;
        Ok(())
    }
}
