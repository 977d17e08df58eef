//! The built-in command set.
//!
//! Three commands, one per output shape the API can stream: `echo`
//! answers with a materialized value, `cat` streams file bytes, and
//! `count` emits values over a live channel. `Registry` is both the
//! request parser and the invoker, so a single value wires the whole
//! daemon.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::debug;

use spout_core::options::{OptionValue, ENCODING, STREAM_CHANNELS};
use spout_core::{CommandError, Invocation, Invoker, Outcome};
use spout_http::{HttpError, HttpRequest, RequestParser};

const API_PREFIX: &str = "/api/v0/";
const KNOWN_COMMANDS: [&str; 3] = ["echo", "cat", "count"];

/// Maps `/api/v0/<command>` requests onto invocations and runs them.
#[derive(Debug, Default)]
pub struct Registry;

impl Registry {
    pub fn new() -> Self {
        Self
    }
}

impl RequestParser for Registry {
    fn parse(&self, request: &HttpRequest) -> Result<Invocation, HttpError> {
        let Some(rest) = request.path().strip_prefix(API_PREFIX) else {
            return Err(HttpError::NotFound);
        };
        let command: Vec<String> =
            rest.split('/').filter(|s| !s.is_empty()).map(str::to_string).collect();
        let Some(root) = command.first() else {
            return Err(HttpError::NotFound);
        };
        if !KNOWN_COMMANDS.contains(&root.as_str()) {
            return Err(HttpError::NotFound);
        }

        let mut invocation = Invocation::new(command);
        invocation.options.set(ENCODING, OptionValue::Text("json".to_string()));

        let query = request.query().unwrap_or("");
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "arg" => invocation.args.push(value.into_owned()),
                // `enc` is the short form clients historically send.
                "enc" | ENCODING => {
                    invocation.options.set(ENCODING, OptionValue::Text(value.into_owned()));
                }
                STREAM_CHANNELS => {
                    let flag = value.parse::<bool>().map_err(|_| {
                        HttpError::Parse(format!("invalid boolean for stream-channels: {value:?}"))
                    })?;
                    invocation.options.set(STREAM_CHANNELS, OptionValue::Bool(flag));
                }
                other => {
                    invocation.options.set(other.to_string(), OptionValue::Text(value.into_owned()));
                }
            }
        }
        Ok(invocation)
    }
}

#[async_trait]
impl Invoker for Registry {
    async fn invoke(&self, invocation: Invocation) -> Outcome {
        debug!(command = ?invocation.command, args = ?invocation.args, "running command");
        match invocation.root() {
            Some("echo") => echo(&invocation),
            Some("cat") => cat(&invocation).await,
            Some("count") => count(&invocation),
            _ => Outcome::failed(CommandError::client("unknown command")),
        }
    }
}

fn echo(invocation: &Invocation) -> Outcome {
    Outcome::value(json!({ "Text": invocation.args.join(" ") }))
}

async fn cat(invocation: &Invocation) -> Outcome {
    let Some(path) = invocation.args.first() else {
        return Outcome::failed(CommandError::client("cat requires a path argument"));
    };
    match tokio::fs::File::open(path).await {
        Ok(file) => {
            let length = match file.metadata().await {
                Ok(meta) => meta.len(),
                Err(_) => 0,
            };
            Outcome::stream(file).with_length(length)
        }
        Err(err) => Outcome::failed(CommandError::client(format!("cat {path}: {err}"))),
    }
}

fn count(invocation: &Invocation) -> Outcome {
    let limit: u64 = invocation
        .args
        .first()
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(5);

    let (tx, rx) = mpsc::channel(8);
    tokio::spawn(async move {
        for seq in 0..limit {
            // A closed receiver means the client went away.
            if tx.send(Ok(json!({ "Seq": seq }))).await.is_err() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    });
    Outcome::channel(rx)
}
