//! Runtime configuration of the `devnode` binary.
//!
//! Every setting comes from a command-line flag with an environment
//! fallback. Device wiring is fixed; only timing, mock mode and plumbing
//! are configurable.

use std::time::Duration;

use clap::Parser;
use clap::builder::BoolishValueParser;
use devnode_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// devnode - run a demo station of periodic devices
#[derive(Parser, Debug)]
#[command(name = "devnode")]
#[command(version)]
#[command(about = "Run a demo station: environment sensor, LED and relay")]
#[command(long_about = None)]
pub struct Args {
    /// Station name, used as the topic prefix
    #[arg(long, default_value = "devnode")]
    pub station: String,

    /// Fabricate readings instead of touching hardware
    #[arg(
        short,
        long,
        env = "DEVNODE_MOCK",
        action = clap::ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    pub mock: bool,

    /// Sensor poll period in milliseconds
    #[arg(short, long = "period-ms", env = "DEVNODE_PERIOD_MS", default_value_t = 1000)]
    pub period_ms: u64,

    /// State report period of the LED and relay in milliseconds
    #[arg(long = "output-period-ms", default_value_t = 5000)]
    pub output_period_ms: u64,

    /// Capacity of the outbound message queue
    #[arg(long, default_value_t = 64)]
    pub capacity: usize,

    /// GPIO line of the LED
    #[arg(long, default_value_t = 6)]
    pub led_pin: u32,

    /// GPIO line of the relay
    #[arg(long, default_value_t = 26)]
    pub relay_pin: u32,

    /// Log filter used when RUST_LOG is not set
    #[arg(long = "log", env = "DEVNODE_LOG", default_value = "info")]
    pub log_filter: String,

    /// Stop after this many seconds instead of waiting for Ctrl-C
    #[arg(long = "run-for-secs", env = "DEVNODE_RUN_FOR_SECS")]
    pub run_for_secs: Option<u64>,
}

/// Validated node configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    pub station: String,
    pub mock: bool,
    pub period_ms: u64,
    pub output_period_ms: u64,
    pub capacity: usize,
    pub led_pin: u32,
    pub relay_pin: u32,
    pub log_filter: String,
    pub run_for_secs: Option<u64>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            station: "devnode".to_string(),
            mock: false,
            period_ms: 1000,
            output_period_ms: 5000,
            capacity: 64,
            led_pin: 6,
            relay_pin: 26,
            log_filter: "info".to_string(),
            run_for_secs: None,
        }
    }
}

impl From<Args> for NodeConfig {
    fn from(args: Args) -> Self {
        Self {
            station: args.station,
            mock: args.mock,
            period_ms: args.period_ms,
            output_period_ms: args.output_period_ms,
            capacity: args.capacity,
            led_pin: args.led_pin,
            relay_pin: args.relay_pin,
            log_filter: args.log_filter,
            run_for_secs: args.run_for_secs,
        }
    }
}

impl NodeConfig {
    /// Parse configuration from the process arguments and environment.
    pub fn from_args() -> Self {
        Args::parse().into()
    }

    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    pub fn output_period(&self) -> Duration {
        Duration::from_millis(self.output_period_ms)
    }

    pub fn run_for(&self) -> Option<Duration> {
        self.run_for_secs.map(Duration::from_secs)
    }

    /// Reject settings the device loops cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.station.is_empty() || self.station.contains('/') {
            return Err(Error::configuration(format!(
                "station name must be non-empty and contain no '/': {:?}",
                self.station
            )));
        }
        if self.period_ms == 0 || self.output_period_ms == 0 {
            return Err(Error::configuration("periods must be greater than zero"));
        }
        if self.capacity == 0 {
            return Err(Error::configuration("queue capacity must be greater than zero"));
        }
        if self.led_pin == self.relay_pin {
            return Err(Error::configuration(format!(
                "LED and relay share GPIO line {}",
                self.led_pin
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse(args: &[&str]) -> NodeConfig {
        let argv = std::iter::once("devnode").chain(args.iter().copied());
        Args::try_parse_from(argv).unwrap().into()
    }

    #[test]
    fn test_default_is_valid() {
        let config = NodeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.period(), Duration::from_secs(1));
        assert_eq!(config.run_for(), None);
    }

    #[test]
    fn test_parse_flags() {
        let config = parse(&[
            "--mock",
            "--period-ms",
            "250",
            "--run-for-secs",
            "3",
            "--station",
            "greenhouse",
        ]);

        assert!(config.mock);
        assert_eq!(config.period(), Duration::from_millis(250));
        assert_eq!(config.run_for(), Some(Duration::from_secs(3)));
        assert_eq!(config.station, "greenhouse");
        assert_eq!(config.capacity, 64);
    }

    #[rstest]
    #[case(NodeConfig { period_ms: 0, ..NodeConfig::default() })]
    #[case(NodeConfig { output_period_ms: 0, ..NodeConfig::default() })]
    #[case(NodeConfig { capacity: 0, ..NodeConfig::default() })]
    #[case(NodeConfig { station: String::new(), ..NodeConfig::default() })]
    #[case(NodeConfig { station: "a/b".to_string(), ..NodeConfig::default() })]
    #[case(NodeConfig { relay_pin: 6, ..NodeConfig::default() })]
    fn test_validate_rejects(#[case] config: NodeConfig) {
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_config_serializes() {
        let json = serde_json::to_string(&NodeConfig::default()).unwrap();
        let back: NodeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, NodeConfig::default());
    }
}
