//! sockmon_agent: samples the host with sysinfo and pushes a JSON payload to
//! every WebSocket client on `/ws`.

pub mod metrics;
pub mod sampler;
pub mod state;
pub mod types;
pub mod ws;

pub const DEFAULT_PORT: u16 = 3030;

/// `--port N`, `-p N` or `--port=N`; anything unparsable falls back to `default_port`.
pub fn parse_port<I: IntoIterator<Item = String>>(args: I, default_port: u16) -> u16 {
    let mut it = args.into_iter();
    let _ = it.next(); // program name
    let mut long: Option<String> = None;
    let mut short: Option<String> = None;
    while let Some(a) = it.next() {
        match a.as_str() {
            "--port" => long = it.next(),
            "-p" => short = it.next(),
            _ if a.starts_with("--port=") => {
                if let Some((_, v)) = a.split_once('=') {
                    long = Some(v.to_string());
                }
            }
            _ => {}
        }
    }
    long.or(short)
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(default_port)
}
