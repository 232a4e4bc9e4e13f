use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use chrono::Utc;
use dashmap::DashMap;
use navview_shared::BridgeMessage;
use tokio::sync::broadcast;

use crate::config::sse_broadcast_buffer;

/// One bridge message, serialized once and shared by every SSE subscriber.
#[derive(Debug, Clone)]
pub struct RelayEvent {
    pub seq: u64,
    pub event: &'static str,
    pub json: Arc<Bytes>,
}

#[derive(Debug, Default)]
pub struct RelayCounters {
    maps_published_total: AtomicU64,
    poses_published_total: AtomicU64,
    transforms_published_total: AtomicU64,
    rejected_publishes_total: AtomicU64,
    lagged_subscribers_total: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayCountersSnapshot {
    pub maps_published_total: u64,
    pub poses_published_total: u64,
    pub transforms_published_total: u64,
    pub rejected_publishes_total: u64,
    pub lagged_subscribers_total: u64,
}

impl RelayCounters {
    pub fn snapshot(&self) -> RelayCountersSnapshot {
        RelayCountersSnapshot {
            maps_published_total: self.maps_published_total.load(Ordering::Relaxed),
            poses_published_total: self.poses_published_total.load(Ordering::Relaxed),
            transforms_published_total: self.transforms_published_total.load(Ordering::Relaxed),
            rejected_publishes_total: self.rejected_publishes_total.load(Ordering::Relaxed),
            lagged_subscribers_total: self.lagged_subscribers_total.load(Ordering::Relaxed),
        }
    }

    fn record_published(&self, message: &BridgeMessage) {
        let counter = match message {
            BridgeMessage::Map { .. } => &self.maps_published_total,
            BridgeMessage::Pose { .. } => &self.poses_published_total,
            BridgeMessage::Transform { .. } => &self.transforms_published_total,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected_publish(&self) {
        self.rejected_publishes_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_lagged_subscriber(&self) {
        self.lagged_subscribers_total.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Clone)]
pub struct AppState {
    /// Latest map per topic, replayed to new and lagging subscribers.
    pub latest_maps: Arc<DashMap<String, RelayEvent>>,
    pub latest_poses: Arc<DashMap<String, RelayEvent>>,
    /// Keyed by `parent->child`.
    pub latest_transforms: Arc<DashMap<String, RelayEvent>>,
    pub next_seq: Arc<AtomicU64>,
    pub event_tx: broadcast::Sender<RelayEvent>,
    pub counters: Arc<RelayCounters>,
}

impl AppState {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(sse_broadcast_buffer());
        Self {
            latest_maps: Arc::new(DashMap::new()),
            latest_poses: Arc::new(DashMap::new()),
            latest_transforms: Arc::new(DashMap::new()),
            next_seq: Arc::new(AtomicU64::new(0)),
            event_tx,
            counters: Arc::new(RelayCounters::default()),
        }
    }

    /// Stamp, serialize, retain and fan out one message.
    pub fn publish(&self, message: BridgeMessage) -> Result<RelayEvent, serde_json::Error> {
        let message = message.with_stamp(Utc::now());
        let json = serde_json::to_vec(&message)?;
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed) + 1;
        let event = RelayEvent {
            seq,
            event: message.event_name(),
            json: Arc::new(Bytes::from(json)),
        };

        let retained = match &message {
            BridgeMessage::Map { .. } => &self.latest_maps,
            BridgeMessage::Pose { .. } => &self.latest_poses,
            BridgeMessage::Transform { .. } => &self.latest_transforms,
        };
        retain_latest(retained, message.retain_key(), &event);
        self.counters.record_published(&message);

        // No receivers is the normal idle case.
        let _ = self.event_tx.send(event.clone());
        Ok(event)
    }

    /// Everything retained, oldest sequence first.
    pub fn retained_events(&self) -> Vec<RelayEvent> {
        let mut events: Vec<RelayEvent> = self
            .latest_maps
            .iter()
            .chain(self.latest_poses.iter())
            .chain(self.latest_transforms.iter())
            .map(|entry| entry.value().clone())
            .collect();
        events.sort_by_key(|event| event.seq);
        events
    }
}

/// Keep `event` under `key` unless a later sequence number already got there.
/// Concurrent publishes on one key may reach the map out of order.
fn retain_latest(retained: &DashMap<String, RelayEvent>, key: String, event: &RelayEvent) {
    retained
        .entry(key)
        .and_modify(|current| {
            if event.seq > current.seq {
                *current = event.clone();
            }
        })
        .or_insert_with(|| event.clone());
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use navview_shared::{GridInfo, OccupancyGrid, PoseMsg, TransformMsg};

    fn map(topic: &str, width: u32) -> BridgeMessage {
        BridgeMessage::Map {
            topic: topic.into(),
            grid: OccupancyGrid {
                info: GridInfo {
                    resolution: 1.0,
                    width,
                    height: 1,
                    origin: PoseMsg::default(),
                },
                data: vec![0; width as usize],
            },
            stamp: None,
        }
    }

    #[test]
    fn publish_retains_latest_per_key_and_counts() {
        let state = AppState::new();
        state.publish(map("/map", 1)).expect("publish");
        state.publish(map("/map", 2)).expect("publish");
        state
            .publish(BridgeMessage::Transform {
                parent_frame: "/map".into(),
                child_frame: "/base_link".into(),
                transform: TransformMsg::default(),
                stamp: None,
            })
            .expect("publish");

        let retained = state.retained_events();
        assert_eq!(
            retained.iter().map(|e| (e.seq, e.event)).collect::<Vec<_>>(),
            vec![(2, "map"), (3, "transform")]
        );
        let counters = state.counters.snapshot();
        assert_eq!(counters.maps_published_total, 2);
        assert_eq!(counters.transforms_published_total, 1);
        assert_eq!(counters.poses_published_total, 0);
    }

    #[test]
    fn out_of_order_retain_keeps_higher_seq() {
        let retained = DashMap::new();
        let event = |seq| RelayEvent {
            seq,
            event: "map",
            json: Arc::new(Bytes::from(format!("{{\"seq\":{seq}}}"))),
        };
        retain_latest(&retained, "/map".into(), &event(5));
        retain_latest(&retained, "/map".into(), &event(3));
        assert_eq!(retained.get("/map").map(|e| e.seq), Some(5));

        retain_latest(&retained, "/map".into(), &event(6));
        assert_eq!(retained.get("/map").map(|e| e.seq), Some(6));
        assert_eq!(retained.len(), 1);
    }

    #[test]
    fn published_payload_carries_stamp() {
        let state = AppState::new();
        let event = state.publish(map("/map", 1)).expect("publish");
        let decoded: BridgeMessage = serde_json::from_slice(&event.json).expect("decode");
        let BridgeMessage::Map { stamp, .. } = decoded else {
            panic!("expected map");
        };
        assert!(stamp.is_some());
    }

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let state = AppState::new();
        let mut rx = state.event_tx.subscribe();
        state.publish(map("/map", 3)).expect("publish");
        let event = rx.recv().await.expect("event");
        assert_eq!(event.seq, 1);
        assert_eq!(event.event, "map");
    }
}
