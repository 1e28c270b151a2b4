use argh::FromArgs;
use log::LevelFilter;

const DEFAULT_METADATA_BASE: &str = "http://169.254.169.254/latest/meta-data";

/// Associate a free elastic IP from a predefined pool with this EC2 instance.
#[derive(FromArgs, Debug)]
pub(crate) struct Args {
    /// comma separated list of elastic IPs the instance may claim
    #[argh(option)]
    pub(crate) eips: String,
    /// maximum number of candidate checks before giving up
    #[argh(option, default = "10")]
    pub(crate) retries: u32,
    /// number of seconds to pause between candidate checks
    #[argh(option, default = "5")]
    pub(crate) pause: u64,
    /// base URI of the instance metadata service
    #[argh(option, default = "DEFAULT_METADATA_BASE.to_string()")]
    pub(crate) metadata: String,
    /// logging verbosity [trace|debug|info|warn|error]
    #[argh(option, default = "LevelFilter::Info")]
    pub(crate) log_level: LevelFilter,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::from_args(&["eip-associate"], &["--eips", "1.2.3.4,5.6.7.8"]).unwrap();
        assert_eq!(args.eips, "1.2.3.4,5.6.7.8");
        assert_eq!(args.retries, 10);
        assert_eq!(args.pause, 5);
        assert_eq!(args.metadata, DEFAULT_METADATA_BASE);
        assert_eq!(args.log_level, LevelFilter::Info);
    }

    #[test]
    fn eips_is_required() {
        assert!(Args::from_args(&["eip-associate"], &[]).is_err());
    }

    #[test]
    fn overrides() {
        let args = Args::from_args(
            &["eip-associate"],
            &[
                "--eips",
                "1.2.3.4",
                "--retries",
                "3",
                "--pause",
                "0",
                "--metadata",
                "http://localhost:8080/meta-data",
            ],
        )
        .unwrap();
        assert_eq!(args.retries, 3);
        assert_eq!(args.pause, 0);
        assert_eq!(args.metadata, "http://localhost:8080/meta-data");
    }
}
