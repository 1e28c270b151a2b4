//! The reconciliation loop that claims a free elastic IP for this instance.
//!
//! Peer instances run the same loop against the same pool, so an address that
//! looks free here can be taken by the time we ask for it. The provider's
//! `AssociateAddress` call is the only arbiter; losing a race is an expected,
//! recoverable outcome, and the pause between candidate checks gives peers
//! time to finish their own in-flight associations.

use crate::error::{self, Result};
use async_trait::async_trait;
use log::{error, info};
use snafu::ensure;
use std::collections::HashSet;
use std::time::Duration;
use tokio::time;

/// An elastic IP address as reported by the provider, reduced to the fields
/// the loop cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Eip {
    pub(crate) public_ip: String,
    pub(crate) allocation_id: Option<String>,
    pub(crate) instance_id: Option<String>,
}

impl Eip {
    /// An address is free when the provider reports no binding for it at all.
    fn is_free(&self) -> bool {
        self.allocation_id.is_none() && self.instance_id.is_none()
    }
}

/// The provider operations the loop needs. `Ec2Client` implements this
/// against EC2; tests substitute a mock.
#[async_trait]
pub(crate) trait AddressApi {
    /// Returns a point-in-time snapshot of all addresses in the account.
    async fn describe_addresses(&self) -> Result<Vec<Eip>>;

    /// Attempts to bind the address named by `allocation_id` to `instance_id`.
    async fn associate_address(
        &self,
        allocation_id: Option<&str>,
        instance_id: &str,
    ) -> Result<()>;
}

/// How a successful run ended.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// The instance's current public IP is already one of the pool addresses.
    AlreadyAssigned,
    /// A pool address was newly bound to the instance.
    Associated { public_ip: String },
}

/// Retry accounting for the candidate scan, carried as a value rather than
/// shared state.
#[derive(Debug, Default)]
struct RetryState {
    retries_used: u32,
}

/// Splits the `--eips` flag value into the address pool. Duplicates are kept;
/// they are redundant but harmless since selection follows inventory order.
pub(crate) fn parse_pool(eips: &str) -> Result<Vec<String>> {
    let pool: Vec<String> = eips
        .split(',')
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
        .collect();
    ensure!(!pool.is_empty(), error::EmptyPoolSnafu { eips });
    Ok(pool)
}

/// Ensures the instance holds one of the pool addresses.
///
/// If the locally observed public IP is already a pool member, returns
/// without touching the provider; the metadata service is ground truth for
/// that check, not the (possibly stale) inventory snapshot. Otherwise the
/// account's addresses are fetched once and scanned in inventory order,
/// re-scanning the same snapshot until an association succeeds or
/// `max_retries` candidate checks have been spent. Addresses outside the
/// pool are skipped without consuming budget.
pub(crate) async fn associate_first_free(
    api: &dyn AddressApi,
    instance_id: &str,
    public_ipv4: &str,
    pool: &[String],
    max_retries: u32,
    pause: Duration,
) -> Result<Outcome> {
    if pool.iter().any(|ip| ip == public_ipv4) {
        info!("ip already allocated {}", public_ipv4);
        return Ok(Outcome::AlreadyAssigned);
    }

    let wanted: HashSet<&str> = pool.iter().map(String::as_str).collect();

    // One snapshot for the whole run; candidates are re-checked against this
    // snapshot rather than re-queried.
    let addresses = api.describe_addresses().await?;
    ensure!(
        addresses
            .iter()
            .any(|eip| wanted.contains(eip.public_ip.as_str())),
        error::NoPoolAddressesSnafu
    );

    let mut state = RetryState::default();
    loop {
        for eip in &addresses {
            if wanted.contains(eip.public_ip.as_str()) {
                ensure!(
                    state.retries_used < max_retries,
                    error::RetriesExhaustedSnafu {
                        attempts: state.retries_used
                    }
                );
                state.retries_used += 1;

                if eip.is_free() {
                    info!("{} free", eip.public_ip);
                    match api
                        .associate_address(eip.allocation_id.as_deref(), instance_id)
                        .await
                    {
                        Ok(()) => {
                            info!("{} associated", eip.public_ip);
                            return Ok(Outcome::Associated {
                                public_ip: eip.public_ip.clone(),
                            });
                        }
                        // A lost race or provider rejection; move on to the
                        // next candidate.
                        Err(err) => error!("{}", err),
                    }
                } else {
                    info!("{} not_free", eip.public_ip);
                }
            }
            time::sleep(pause).await;
        }
    }
}
