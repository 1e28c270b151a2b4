#![deny(unused_imports)]

/*!
## Introduction

eip-associate claims one of a predefined pool of Elastic IP addresses for the
EC2 instance it runs on. A fleet of interchangeable instances can share a small
pool of stable public addresses by running this at boot, or as a remediation
step from a health check, without an operator re-binding addresses by hand.

The instance's identity, availability zone, and current public IPv4 address are
read from the instance metadata service. If the instance already holds one of
the pool addresses, nothing is done. Otherwise the account's addresses are
listed through EC2 and scanned for a pool member with no current binding; each
free candidate is offered to `AssociateAddress` until one sticks or the retry
budget runs out. Addresses outside the pool are never touched.

## Usage

```text
eip-associate --eips 203.0.113.10,203.0.113.11 [--retries 10] [--pause 5]
```

* `--eips`: comma separated list of elastic IPs the instance may claim (required).
* `--retries`: maximum number of candidate checks before giving up.
* `--pause`: seconds to wait between candidate checks, giving peer instances
  time to finish their own in-flight associations.
* `--metadata`: base URI of the instance metadata service.
* `--log-level`: logging verbosity.

Exits 0 when the instance ends up holding a pool address, 1 otherwise.
*/

mod args;
mod associate;
mod ec2;
mod error;
mod imds;

use crate::args::Args;
use crate::associate::{associate_first_free, parse_pool, Outcome};
use crate::ec2::Ec2Client;
use crate::error::Result;
use crate::imds::{region_from_zone, MetadataClient};
use log::info;
use simplelog::{Config as LogConfig, SimpleLogger};
use std::process;
use std::time::Duration;

async fn run(args: Args) -> Result<()> {
    SimpleLogger::init(args.log_level, LogConfig::default()).expect("unable to configure logger");

    let pool = parse_pool(&args.eips)?;

    let metadata = MetadataClient::new(&args.metadata)?;

    info!("connecting {}", args.metadata);
    let zone = metadata.fetch_availability_zone().await?;
    info!("connected {}", zone);
    let region = region_from_zone(&zone)?;

    let instance_id = metadata.fetch_instance_id().await?;
    info!("instance {}", instance_id);
    let public_ipv4 = metadata.fetch_public_ipv4().await?;
    info!("public ipv4 {}", public_ipv4);

    let ec2 = Ec2Client::new(region).await;
    match associate_first_free(
        &ec2,
        &instance_id,
        &public_ipv4,
        &pool,
        args.retries,
        Duration::from_secs(args.pause),
    )
    .await?
    {
        Outcome::AlreadyAssigned => {}
        Outcome::Associated { public_ip } => info!("instance now reachable at {}", public_ip),
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let args: Args = argh::from_env();
    if let Err(e) = run(args).await {
        eprintln!("{}", e);
        process::exit(1);
    }
}
