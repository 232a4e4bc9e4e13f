use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{EventSource, MessageEvent};

use navview_shared::{BridgeMessage, ViewerOptions};

use crate::marker::RobotMarker;
use crate::occupancy::MapLayer;
use crate::session::BridgeSession;
use crate::viewer::Viewer;

const EVENTS_URL: &str = "/api/events";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Live,
    Reconnecting,
}

/// Reactive state the bridge writes into.
#[derive(Clone, Copy)]
pub struct BridgeSignals {
    pub viewer: RwSignal<Viewer>,
    pub map_layer: RwSignal<Option<MapLayer>>,
    pub marker: RwSignal<RobotMarker>,
    pub connection: RwSignal<ConnectionStatus>,
}

struct BridgeConnection {
    es: EventSource,
    on_open: Closure<dyn Fn()>,
    on_error: Closure<dyn Fn()>,
    map_handler: Closure<dyn Fn(MessageEvent)>,
    pose_handler: Closure<dyn Fn(MessageEvent)>,
}

impl BridgeConnection {
    fn close(self) {
        let _ = self.on_open.as_ref();
        let _ = self.on_error.as_ref();
        self.es.set_onopen(None);
        self.es.set_onerror(None);
        for (event, handler) in [
            ("map", &self.map_handler),
            ("pose", &self.pose_handler),
            ("transform", &self.pose_handler),
        ] {
            self.es
                .remove_event_listener_with_callback(event, handler.as_ref().unchecked_ref())
                .ok();
        }
        self.es.close();
    }
}

thread_local! {
    static BRIDGE_CONNECTION: RefCell<Option<BridgeConnection>> = const { RefCell::new(None) };
}

pub fn disconnect() {
    BRIDGE_CONNECTION.with(|slot| {
        if let Some(connection) = slot.borrow_mut().take() {
            connection.close();
        }
    });
}

fn parse_message(e: &MessageEvent) -> Option<BridgeMessage> {
    let data = e.data().as_string()?;
    match serde_json::from_str::<BridgeMessage>(&data) {
        Ok(message) => Some(message),
        Err(err) => {
            web_sys::console::warn_1(&format!("dropping malformed bridge event: {err}").into());
            None
        }
    }
}

fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or_else(js_sys::Date::now)
}

/// Subscribe to the relay's event stream and drive the viewer, map layer and
/// robot marker from it.
pub fn connect(options: ViewerOptions, signals: BridgeSignals) {
    signals.connection.set(ConnectionStatus::Connecting);

    let es = match EventSource::new(EVENTS_URL) {
        Ok(es) => es,
        Err(_) => {
            signals.connection.set(ConnectionStatus::Reconnecting);
            return;
        }
    };

    let session = Rc::new(RefCell::new(BridgeSession::new(options)));
    web_sys::console::info_1(
        &format!("tracking robot via {}", session.borrow().pose_source()).into(),
    );

    let conn = signals.connection;
    let on_open = Closure::<dyn Fn()>::new(move || {
        conn.set(ConnectionStatus::Live);
    });
    es.set_onopen(Some(on_open.as_ref().unchecked_ref()));

    let map_session = session.clone();
    let map_handler = Closure::<dyn Fn(MessageEvent)>::new(move |e: MessageEvent| {
        let Some(message) = parse_message(&e) else {
            return;
        };
        let mut layer = None;
        signals.viewer.update(|viewer| {
            layer = map_session.borrow_mut().on_map(&message, viewer);
        });
        if let Some(layer) = layer {
            signals.map_layer.set(Some(layer));
        }
    });
    es.add_event_listener_with_callback("map", map_handler.as_ref().unchecked_ref())
        .ok();

    let pose_session = session;
    let pose_handler = Closure::<dyn Fn(MessageEvent)>::new(move |e: MessageEvent| {
        let Some(message) = parse_message(&e) else {
            return;
        };
        let now = now_ms();
        let mut marker = signals.marker.get_untracked();
        let changed = signals.viewer.with_untracked(|viewer| {
            pose_session
                .borrow_mut()
                .on_pose(&message, now, viewer, &mut marker)
        });
        if changed {
            signals.marker.set(marker);
        }
    });
    for event in ["pose", "transform"] {
        es.add_event_listener_with_callback(event, pose_handler.as_ref().unchecked_ref())
            .ok();
    }

    let conn = signals.connection;
    let on_error = Closure::<dyn Fn()>::new(move || {
        conn.set(ConnectionStatus::Reconnecting);
    });
    es.set_onerror(Some(on_error.as_ref().unchecked_ref()));

    BRIDGE_CONNECTION.with(|slot| {
        let mut slot = slot.borrow_mut();
        if let Some(old) = slot.take() {
            old.close();
        }
        *slot = Some(BridgeConnection {
            es,
            on_open,
            on_error,
            map_handler,
            pose_handler,
        });
    });
}
