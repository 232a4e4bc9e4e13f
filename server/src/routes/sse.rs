use std::convert::Infallible;

use axum::extract::State;
use axum::response::Sse;
use axum::response::sse::{Event, KeepAlive};
use bytes::Bytes;
use futures::stream::Stream;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::{debug, warn};

use crate::config::sse_keepalive;
use crate::state::{AppState, RelayEvent};

/// Live bridge feed. New subscribers first get the retained latest map,
/// pose and transform messages so the viewer can draw immediately.
pub async fn bridge_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // Subscribe before reading the retained set so nothing published in
    // between is lost; duplicates are filtered by sequence number below.
    let rx = state.event_tx.subscribe();

    let stream = async_stream::stream! {
        let mut last_seq = 0u64;
        for event in state.retained_events() {
            last_seq = last_seq.max(event.seq);
            if let Some(sse) = to_sse(&event) {
                yield Ok(sse);
            }
        }

        let mut stream = BroadcastStream::new(rx);
        while let Some(result) = stream.next().await {
            match result {
                Ok(event) => {
                    if event.seq <= last_seq {
                        continue;
                    }
                    last_seq = event.seq;
                    if let Some(sse) = to_sse(&event) {
                        yield Ok(sse);
                    }
                }
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    state.counters.record_lagged_subscriber();
                    warn!(
                        skipped_events = skipped,
                        "SSE client lagged behind broadcast buffer; replaying retained state"
                    );
                    for event in state.retained_events() {
                        if event.seq <= last_seq {
                            continue;
                        }
                        last_seq = event.seq;
                        if let Some(sse) = to_sse(&event) {
                            yield Ok(sse);
                        }
                    }
                }
            }
        }
        debug!("SSE broadcast closed");
    };

    Sse::new(stream).keep_alive(KeepAlive::new().interval(sse_keepalive()).text("keep-alive"))
}

fn to_sse(event: &RelayEvent) -> Option<Event> {
    let Some(payload) = event_payload(event.json.as_ref()) else {
        warn!(
            seq = event.seq,
            event = event.event,
            "event payload is not valid utf-8; dropping SSE event"
        );
        return None;
    };
    Some(
        Event::default()
            .id(event.seq.to_string())
            .event(event.event)
            .data(payload),
    )
}

fn event_payload(bytes: &Bytes) -> Option<&str> {
    std::str::from_utf8(bytes.as_ref()).ok()
}
