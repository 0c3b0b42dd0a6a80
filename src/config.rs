use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::jobs::StageTimings;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be a valid {kind}, got '{value}'")]
    Invalid {
        name: &'static str,
        kind: &'static str,
        value: String,
    },

    #[error("JOB_RETENTION_SECS ({retention}s) must exceed JOB_SWEEP_INTERVAL_SECS ({sweep}s)")]
    RetentionTooShort { retention: u64, sweep: u64 },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub static_dir: PathBuf,
    pub retention: Duration,
    pub sweep_interval: Duration,
    pub start_delay: Duration,
    pub generate_delay: Duration,
    pub upload_delay: Duration,
    pub job_timeout: Duration,
    pub audio_base_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from any variable source; missing entries take defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host: IpAddr = parse(&lookup, "HOST", "IP address", IpAddr::from([0, 0, 0, 0]))?;
        let port: u16 = parse(&lookup, "PORT", "port number", 3000)?;
        let addr = SocketAddr::new(host, port);

        let retention_secs: u64 = parse(&lookup, "JOB_RETENTION_SECS", "number of seconds", 300)?;
        let sweep_secs: u64 = parse(&lookup, "JOB_SWEEP_INTERVAL_SECS", "number of seconds", 60)?;
        if sweep_secs == 0 {
            return Err(ConfigError::Zero("JOB_SWEEP_INTERVAL_SECS"));
        }
        if retention_secs <= sweep_secs {
            return Err(ConfigError::RetentionTooShort {
                retention: retention_secs,
                sweep: sweep_secs,
            });
        }

        let timeout_secs: u64 = parse(&lookup, "JOB_TIMEOUT_SECS", "number of seconds", 120)?;
        if timeout_secs == 0 {
            return Err(ConfigError::Zero("JOB_TIMEOUT_SECS"));
        }

        let millis = |name: &'static str, default: u64| -> Result<Duration, ConfigError> {
            parse(&lookup, name, "number of milliseconds", default).map(Duration::from_millis)
        };

        Ok(Self {
            addr,
            static_dir: lookup("STATIC_DIR")
                .unwrap_or_else(|| "./static".to_string())
                .into(),
            retention: Duration::from_secs(retention_secs),
            sweep_interval: Duration::from_secs(sweep_secs),
            start_delay: millis("JOB_START_DELAY_MS", 2000)?,
            generate_delay: millis("JOB_GENERATE_DELAY_MS", 3000)?,
            upload_delay: millis("JOB_UPLOAD_DELAY_MS", 2000)?,
            job_timeout: Duration::from_secs(timeout_secs),
            audio_base_url: lookup("AUDIO_BASE_URL")
                .unwrap_or_else(|| "https://example.com/audio".to_string()),
        })
    }

    pub fn stage_timings(&self) -> StageTimings {
        StageTimings {
            start_delay: self.start_delay,
            job_timeout: self.job_timeout,
        }
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    kind: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        Some(value) => parse_value(name, kind, value),
        None => Ok(default),
    }
}

fn parse_value<T: FromStr>(
    name: &'static str,
    kind: &'static str,
    value: String,
) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { name, kind, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = config(&[]).unwrap();
        assert_eq!(config.addr, "0.0.0.0:3000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.retention, Duration::from_secs(300));
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
        assert_eq!(config.start_delay, Duration::from_secs(2));
        assert_eq!(config.generate_delay, Duration::from_secs(3));
        assert_eq!(config.upload_delay, Duration::from_secs(2));
        assert_eq!(config.job_timeout, Duration::from_secs(120));
        assert_eq!(config.audio_base_url, "https://example.com/audio");
    }

    #[test]
    fn reads_overrides() {
        let config = config(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("JOB_START_DELAY_MS", "0"),
            ("AUDIO_BASE_URL", "https://cdn.test/tts"),
        ])
        .unwrap();
        assert_eq!(config.addr, "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(config.start_delay, Duration::ZERO);
        assert_eq!(config.audio_base_url, "https://cdn.test/tts");
    }

    #[test]
    fn accepts_ipv6_hosts() {
        let any = config(&[("HOST", "::"), ("PORT", "8080")]).unwrap();
        assert_eq!(any.addr, "[::]:8080".parse::<SocketAddr>().unwrap());

        let loopback = config(&[("HOST", "::1")]).unwrap();
        assert_eq!(loopback.addr, "[::1]:3000".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn rejects_unparseable_values() {
        let err = config(&[("PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));

        let err = config(&[("HOST", "localhost:80")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "HOST", .. }));
    }

    #[test]
    fn retention_must_exceed_sweep_interval() {
        let err = config(&[("JOB_RETENTION_SECS", "60"), ("JOB_SWEEP_INTERVAL_SECS", "60")])
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::RetentionTooShort {
                retention: 60,
                sweep: 60
            }
        );
    }

    #[test]
    fn rejects_zero_sweep_interval() {
        let err = config(&[("JOB_SWEEP_INTERVAL_SECS", "0")]).unwrap_err();
        assert_eq!(err, ConfigError::Zero("JOB_SWEEP_INTERVAL_SECS"));
    }
}
