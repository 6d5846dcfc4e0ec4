//! authdouble command-line tool.
//!
//! Mints and inspects fake Hawk headers and replays the canned
//! authentication responders without a test harness around them.

use std::process::ExitCode;

use anyhow::{bail, Context};
use authdouble_hawk::{decode, Credential, ExtensionPayload};
use authdouble_responders::{
    FixedClock, HawkAuthResponder, InterceptedRequest, Responder, Response, UserInfoResponder,
};
use authdouble_telemetry::{init_logging, LogConfig, LogFormat};
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};

/// Accepted by `hawk --now`.
const NOW_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Parser, Debug)]
#[command(
    name = "authdouble",
    about = "Fake Hawk and userinfo authentication for tests",
    version
)]
struct Cli {
    /// Log level (overridden by RUST_LOG).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Log format (json or pretty).
    #[arg(long, global = true, default_value = "json")]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Mint a Hawk authorization header.
    Header {
        /// Client identifier.
        #[arg(long)]
        client_id: String,

        /// Scope to grant (repeatable).
        #[arg(long = "scope")]
        scopes: Vec<String>,

        /// Raw extension payload as a JSON object.
        #[arg(long, conflicts_with = "scopes")]
        ext: Option<String>,

        /// Fixed timestamp instead of the current time.
        #[arg(long)]
        ts: Option<u64>,

        /// Fixed nonce instead of a random one.
        #[arg(long)]
        nonce: Option<u32>,
    },

    /// Decode a Hawk header and report its fields as JSON.
    Parse {
        /// The full header, starting with "Hawk ".
        header: String,
    },

    /// Run the Hawk authentication responder against a request body.
    Hawk {
        /// JSON request body, e.g. '{"authorization": "Hawk ..."}'.
        #[arg(long)]
        body: String,

        /// Pin the current time (YYYY-MM-DDTHH:MM:SS).
        #[arg(long)]
        now: Option<String>,
    },

    /// Run the userinfo responder against a request URL.
    Userinfo {
        /// Full URL including the query string.
        url: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let Some(log_format) = LogFormat::parse(&cli.log_format) else {
        eprintln!(
            "error: unknown log format '{}' (expected json or pretty)",
            cli.log_format
        );
        return ExitCode::from(1);
    };
    let log_config = LogConfig::new()
        .with_log_level(&cli.log_level)
        .with_log_format(log_format);
    if let Err(e) = init_logging(&log_config) {
        eprintln!("error: {}", e);
        return ExitCode::from(1);
    }

    let result = match cli.command {
        Commands::Header {
            client_id,
            scopes,
            ext,
            ts,
            nonce,
        } => run_header(client_id, scopes, ext.as_deref(), ts, nonce),
        Commands::Parse { header } => run_parse(&header),
        Commands::Hawk { body, now } => run_hawk(&body, now.as_deref()),
        Commands::Userinfo { url } => run_userinfo(&url),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn run_header(
    client_id: String,
    scopes: Vec<String>,
    ext: Option<&str>,
    ts: Option<u64>,
    nonce: Option<u32>,
) -> anyhow::Result<()> {
    let mut credential = Credential::new(client_id);
    if let Some(ts) = ts {
        credential = credential.with_timestamp(ts);
    }
    if let Some(nonce) = nonce {
        credential = credential.with_nonce(nonce);
    }
    if let Some(raw) = ext {
        credential = credential.with_ext(parse_ext(raw)?);
    } else if !scopes.is_empty() {
        credential = credential.with_scopes(scopes);
    }

    println!("{}", credential.encode());
    Ok(())
}

fn run_parse(header: &str) -> anyhow::Result<()> {
    let parsed = decode(header)?;
    let mac_matches = parsed.mac_matches();
    tracing::debug!(id = %parsed.id, mac_matches, "header decoded");

    print_json(&json!({
        "id": parsed.id,
        "ts": parsed.ts,
        "nonce": parsed.nonce,
        "ext": parsed.ext,
        "mac": parsed.mac,
        "mac_matches": mac_matches,
    }))
}

fn run_hawk(body: &str, now: Option<&str>) -> anyhow::Result<()> {
    let outcome = match now {
        Some(now) => {
            let now = NaiveDateTime::parse_from_str(now, NOW_FORMAT)
                .with_context(|| format!("invalid --now '{}', expected {}", now, NOW_FORMAT))?;
            HawkAuthResponder::with_clock(FixedClock(now)).authenticate(Some(body))
        }
        None => HawkAuthResponder::new().authenticate(Some(body)),
    };
    print_response(&outcome.into_response())
}

fn run_userinfo(url: &str) -> anyhow::Result<()> {
    let response = UserInfoResponder::new().respond(&InterceptedRequest::get(url));
    print_response(&response)
}

fn parse_ext(raw: &str) -> anyhow::Result<ExtensionPayload> {
    let value: Value = serde_json::from_str(raw).context("--ext is not valid JSON")?;
    match value {
        Value::Object(map) => Ok(map),
        other => bail!("--ext must be a JSON object, got {}", other),
    }
}

/// Print a responder result as `{"status", "content_type", "body"}`.
///
/// JSON bodies are embedded as JSON; anything else as a string.
fn print_response(response: &Response) -> anyhow::Result<()> {
    let body = response
        .json_body()
        .or_else(|| response.body.clone().map(Value::String))
        .unwrap_or(Value::Null);
    print_json(&json!({
        "status": response.status,
        "content_type": response.content_type(),
        "body": body,
    }))
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
