//! HTTP backend client.
//!
//! Two worker threads bridge the async HTTP world into the console's mpsc
//! channels so the egui side never blocks: one owns the command loop, one
//! owns the event-stream subscription. Both follow the same shape — spawn
//! a thread, build a tokio runtime, drive the work with `block_on`, push
//! results into a channel — and both exit once their receiving side is
//! dropped.
//!
//! Commands are fire-and-forget with a typed [`Outcome`] coming back; the
//! policy for failures is to log and surface them, never to retry.

use std::sync::mpsc::{Receiver, Sender};
use std::time::Duration;

use futures::StreamExt;
use serde::Serialize;

use crate::config::{BackendConfig, PreferencesDoc, RunSettings};
use crate::data::event::{decode, ProgressEvent};
use crate::sse::SseDecoder;

// ─────────────────────────────────────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────────────────────────────────────

/// Errors from talking to the backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Acknowledgment body shared by the command endpoints.
///
/// Start/abort answer with `{ok, message}`, the toggle endpoints with
/// `{ok, error}`; one struct covers both.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(default)]
pub struct Ack {
    pub ok: bool,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl Ack {
    /// Human-readable reason, preferring `message` over `error`.
    pub fn reason(&self) -> Option<&str> {
        self.message.as_deref().or(self.error.as_deref())
    }
}

/// A request the console can fire at the backend.
#[derive(Debug, Clone)]
pub enum Command {
    /// Start a run with these settings (the backend persists them too).
    Start(RunSettings),
    /// Abort the running measurement.
    Abort,
    /// Fetch the merged preferences document.
    LoadPrefs,
    /// Store a preferences document.
    SavePrefs(PreferencesDoc),
    /// Switch the end-of-run buzzer.
    SetBuzzer(bool),
    /// Switch analyzer online mode.
    SetOnlineMode(bool),
}

/// The answer to a [`Command`], tagged so the caller can route it.
#[derive(Debug)]
pub enum Outcome {
    Start(Result<Ack, BackendError>),
    Abort(Result<Ack, BackendError>),
    Prefs(Result<PreferencesDoc, BackendError>),
    PrefsSaved(Result<Ack, BackendError>),
    Buzzer(Result<Ack, BackendError>),
    OnlineMode(Result<Ack, BackendError>),
}

// ─────────────────────────────────────────────────────────────────────────────
// Command worker
// ─────────────────────────────────────────────────────────────────────────────

/// Handle for queueing commands onto the worker.
#[derive(Clone)]
pub struct CommandSender {
    tx: Sender<Command>,
}

impl CommandSender {
    /// Queue a command. Returns `false` if the worker is gone.
    pub fn send(&self, command: Command) -> bool {
        self.tx.send(command).is_ok()
    }
}

/// Spawn the command worker.
///
/// Commands go in via the returned sender; outcomes come back on the
/// returned receiver in submission order. The worker runs commands one at
/// a time — the console's actions are rare and strictly operator-paced.
pub fn spawn_command_worker(cfg: BackendConfig) -> (CommandSender, Receiver<Outcome>) {
    let (cmd_tx, cmd_rx) = std::sync::mpsc::channel::<Command>();
    let (out_tx, out_rx) = std::sync::mpsc::channel::<Outcome>();

    std::thread::spawn(move || {
        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                log::error!("command worker failed to start a runtime: {e}");
                return;
            }
        };
        let client = match reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                log::error!("command worker failed to build a client: {e}");
                return;
            }
        };
        while let Ok(command) = cmd_rx.recv() {
            let outcome = rt.block_on(run_command(&client, &cfg, command));
            if out_tx.send(outcome).is_err() {
                break;
            }
        }
    });

    (CommandSender { tx: cmd_tx }, out_rx)
}

async fn run_command(client: &reqwest::Client, cfg: &BackendConfig, command: Command) -> Outcome {
    match command {
        Command::Start(settings) => Outcome::Start(
            post_ack(client, cfg, "/gasera/api/measurement/start", Some(&settings)).await,
        ),
        Command::Abort => Outcome::Abort(
            post_ack::<RunSettings>(client, cfg, "/gasera/api/measurement/abort", None).await,
        ),
        Command::LoadPrefs => Outcome::Prefs(get_prefs(client, cfg).await),
        Command::SavePrefs(doc) => {
            Outcome::PrefsSaved(post_ack(client, cfg, "/system/prefs", Some(&doc)).await)
        }
        Command::SetBuzzer(enabled) => Outcome::Buzzer(
            post_ack(
                client,
                cfg,
                "/system/api/buzzer",
                Some(&serde_json::json!({ "enabled": enabled })),
            )
            .await,
        ),
        Command::SetOnlineMode(enabled) => Outcome::OnlineMode(
            post_ack(
                client,
                cfg,
                "/system/api/online_mode",
                Some(&serde_json::json!({ "enabled": enabled })),
            )
            .await,
        ),
    }
}

/// POST and read the `{ok, ...}` acknowledgment.
///
/// The backend answers failed validation with a non-2xx status *and* a
/// JSON body; when that body parses, it wins. A non-JSON error page turns
/// into a synthetic `ok: false` ack carrying the HTTP status.
async fn post_ack<B: Serialize + ?Sized>(
    client: &reqwest::Client,
    cfg: &BackendConfig,
    path: &str,
    body: Option<&B>,
) -> Result<Ack, BackendError> {
    let mut request = client.post(cfg.url(path));
    if let Some(body) = body {
        request = request.json(body);
    }
    let response = request.send().await?;
    let status = response.status();
    match response.json::<Ack>().await {
        Ok(ack) => Ok(ack),
        Err(e) if status.is_success() => Err(BackendError::Transport(e)),
        Err(_) => Ok(Ack {
            ok: false,
            message: Some(format!("HTTP {status}")),
            error: None,
        }),
    }
}

async fn get_prefs(
    client: &reqwest::Client,
    cfg: &BackendConfig,
) -> Result<PreferencesDoc, BackendError> {
    let response = client
        .get(cfg.url("/system/prefs"))
        .send()
        .await?
        .error_for_status()?;
    Ok(response.json::<PreferencesDoc>().await?)
}

// ─────────────────────────────────────────────────────────────────────────────
// Event-stream worker
// ─────────────────────────────────────────────────────────────────────────────

/// Frames delivered by the event-stream worker.
#[derive(Debug)]
pub enum StreamFrame {
    /// One decoded progress event.
    Event(ProgressEvent),
    /// The stream (re)connected.
    Connected,
    /// The stream was lost; the worker retries after the configured delay.
    Disconnected,
}

/// Spawn the event-stream worker feeding decoded events into `tx`.
///
/// The worker subscribes to the backend's SSE endpoint, reconnects forever
/// with a fixed delay on any failure, and exits once the receiving side is
/// dropped.
pub fn spawn_event_stream(cfg: BackendConfig, tx: Sender<StreamFrame>) {
    std::thread::spawn(move || {
        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                log::error!("stream worker failed to start a runtime: {e}");
                return;
            }
        };
        rt.block_on(async move {
            let client = reqwest::Client::new();
            let url = cfg.url("/gasera/api/measurement/events");
            loop {
                match subscribe_once(&client, &url, &tx).await {
                    Ok(()) => log::info!("event stream ended, reconnecting"),
                    Err(e) => log::warn!("event stream error: {e}, reconnecting"),
                }
                if tx.send(StreamFrame::Disconnected).is_err() {
                    return;
                }
                tokio::time::sleep(Duration::from_secs(cfg.reconnect_delay_secs)).await;
            }
        });
    });
}

async fn subscribe_once(
    client: &reqwest::Client,
    url: &str,
    tx: &Sender<StreamFrame>,
) -> Result<(), BackendError> {
    let response = client.get(url).send().await?.error_for_status()?;
    if tx.send(StreamFrame::Connected).is_err() {
        return Ok(());
    }
    let mut decoder = SseDecoder::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        for payload in decoder.push(&chunk) {
            if let Some(event) = decode(&payload) {
                if tx.send(StreamFrame::Event(event)).is_err() {
                    return Ok(());
                }
            }
        }
    }
    Ok(())
}
