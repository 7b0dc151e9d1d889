use muxpanel::{run_operator, BackendConfig, OperatorConfig};
use std::path::PathBuf;

// Full operator console against a live sampler backend.
//
// Usage:
//   cargo run --example operator -- [http://host:port]
//
// The base URL may also come from the MUXPANEL_URL environment variable;
// a CLI argument wins over it. Defaults to http://127.0.0.1:5000, which
// is where the sampler service listens on the instrument itself.
//
// Session state (run counter, acknowledged notices) is kept in
// muxpanel_session.json in the working directory, so re-raising a notice
// you already dismissed stays suppressed across restarts within the same
// run.
//
// Set RUST_LOG=muxpanel=debug to watch the reconcile and command traffic.

fn main() -> eframe::Result<()> {
    env_logger::init();

    let base_url = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("MUXPANEL_URL").ok())
        .unwrap_or_else(|| "http://127.0.0.1:5000".to_string());

    eprintln!("[operator] Backend at {base_url}");

    let cfg = OperatorConfig {
        backend: BackendConfig::new(base_url),
        session_path: Some(PathBuf::from("muxpanel_session.json")),
        ..OperatorConfig::default()
    };
    run_operator(cfg)
}
