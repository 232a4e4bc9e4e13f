use std::time::Duration;

pub const DEFAULT_SERVER_PORT: u16 = 3000;
pub const DEFAULT_SSE_KEEPALIVE_SECS: u64 = 15;
pub const DEFAULT_BROADCAST_BUFFER: usize = 256;
pub const DEFAULT_STATIC_DIR: &str = "client/dist";
/// Largest accepted publish body; a 4000x4000 grid as JSON fits comfortably.
pub const DEFAULT_MAX_PUBLISH_BYTES: usize = 64 * 1024 * 1024;

pub fn server_port() -> u16 {
    std::env::var("NAVVIEW_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_SERVER_PORT)
}

pub fn sse_broadcast_buffer() -> usize {
    std::env::var("SSE_BROADCAST_BUFFER")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_BROADCAST_BUFFER)
}

pub fn sse_keepalive() -> Duration {
    std::env::var("SSE_KEEPALIVE_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_SSE_KEEPALIVE_SECS))
}

pub fn max_publish_bytes() -> usize {
    std::env::var("NAVVIEW_MAX_PUBLISH_BYTES")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_MAX_PUBLISH_BYTES)
}

pub fn static_dir() -> String {
    std::env::var("NAVVIEW_STATIC_DIR")
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string())
}
