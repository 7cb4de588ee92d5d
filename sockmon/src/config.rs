//! Client configuration: command line first, then `SOCKMON_*` environment
//! variables, then built-in defaults. Nothing is read from or written to disk.

use std::{fmt, path::PathBuf, time::Duration};

use thiserror::Error;
use url::Url;

use crate::error::ClientError;
use crate::ws::DEFAULT_RECONNECT_DELAY;

pub const DEFAULT_URL: &str = "ws://localhost:3030/ws";

pub const ENV_URL: &str = "SOCKMON_URL";
pub const ENV_TLS_CA: &str = "SOCKMON_TLS_CA";
pub const ENV_RECONNECT_MS: &str = "SOCKMON_RECONNECT_MS";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Tui,
    Plain,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    /// `--help` was given; carries the usage text.
    #[error("{0}")]
    Help(String),
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ParsedArgs {
    pub url: Option<String>,
    pub tls_ca: Option<String>,
    pub reconnect_ms: Option<u64>,
    pub log_file: Option<PathBuf>,
    pub plain: bool,
    pub dry_run: bool,
}

pub fn usage(prog: &str) -> String {
    format!(
        "Usage: {prog} [--tls-ca CERT_PEM|-t CERT_PEM] [--reconnect-ms MS|-r MS] [--plain] [--log-file PATH] [--dry-run] [ws://HOST:PORT/ws]"
    )
}

pub fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<ParsedArgs, CliError> {
    let mut it = args.into_iter();
    let prog = it.next().unwrap_or_else(|| "sockmon".into());
    let mut parsed = ParsedArgs::default();

    while let Some(arg) = it.next() {
        match arg.as_str() {
            "-h" | "--help" => return Err(CliError::Help(usage(&prog))),
            "--tls-ca" | "-t" => {
                parsed.tls_ca = Some(value_for(&arg, it.next(), &prog)?);
            }
            "--reconnect-ms" | "-r" => {
                let v = value_for(&arg, it.next(), &prog)?;
                parsed.reconnect_ms = Some(parse_ms(&v, &prog)?);
            }
            "--log-file" => {
                parsed.log_file = Some(PathBuf::from(value_for(&arg, it.next(), &prog)?));
            }
            "--plain" => parsed.plain = true,
            "--dry-run" => parsed.dry_run = true,
            _ if arg.starts_with("--tls-ca=") => {
                if let Some((_, v)) = arg.split_once('=') {
                    if !v.is_empty() {
                        parsed.tls_ca = Some(v.to_string());
                    }
                }
            }
            _ if arg.starts_with("--reconnect-ms=") => {
                if let Some((_, v)) = arg.split_once('=') {
                    parsed.reconnect_ms = Some(parse_ms(v, &prog)?);
                }
            }
            _ if arg.starts_with('-') => {
                return Err(CliError::Invalid(format!(
                    "Unknown option '{arg}'. {}",
                    usage(&prog)
                )));
            }
            _ => {
                if parsed.url.is_none() {
                    parsed.url = Some(arg);
                } else {
                    return Err(CliError::Invalid(format!(
                        "Unexpected argument. {}",
                        usage(&prog)
                    )));
                }
            }
        }
    }
    Ok(parsed)
}

fn value_for(flag: &str, v: Option<String>, prog: &str) -> Result<String, CliError> {
    v.filter(|v| !v.is_empty())
        .ok_or_else(|| CliError::Invalid(format!("{flag} needs a value. {}", usage(prog))))
}

fn parse_ms(v: &str, prog: &str) -> Result<u64, CliError> {
    v.parse::<u64>()
        .map_err(|_| CliError::Invalid(format!("invalid milliseconds '{v}'. {}", usage(prog))))
}

/// Fully resolved settings the binary runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub url: Url,
    pub tls_ca: Option<String>,
    pub reconnect_delay: Duration,
    pub mode: Mode,
    pub log_file: Option<PathBuf>,
    pub dry_run: bool,
}

impl ClientConfig {
    /// `env` is a lookup so tests can resolve without touching the process env.
    pub fn resolve<F>(args: ParsedArgs, env: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |k: &str| env(k).filter(|v| !v.trim().is_empty());
        let url = args
            .url
            .or_else(|| lookup(ENV_URL))
            .unwrap_or_else(|| DEFAULT_URL.to_string());
        let reconnect_delay = args
            .reconnect_ms
            .or_else(|| lookup(ENV_RECONNECT_MS).and_then(|v| v.trim().parse().ok()))
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_RECONNECT_DELAY);

        Ok(Self {
            url: validate_url(&url)?,
            tls_ca: args.tls_ca.or_else(|| lookup(ENV_TLS_CA)),
            reconnect_delay,
            mode: if args.plain { Mode::Plain } else { Mode::Tui },
            log_file: args.log_file,
            dry_run: args.dry_run,
        })
    }
}

impl fmt::Display for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "url: {}", self.url)?;
        writeln!(f, "tls_ca: {}", self.tls_ca.as_deref().unwrap_or("-"))?;
        writeln!(f, "reconnect_ms: {}", self.reconnect_delay.as_millis())?;
        write!(
            f,
            "mode: {}",
            match self.mode {
                Mode::Tui => "tui",
                Mode::Plain => "plain",
            }
        )
    }
}

pub fn validate_url(s: &str) -> Result<Url, ClientError> {
    let url = Url::parse(s)?;
    match url.scheme() {
        "ws" | "wss" => Ok(url),
        other => Err(ClientError::InvalidUrl(format!(
            "unsupported scheme '{other}' in {s} (expected ws:// or wss://)"
        ))),
    }
}
