use leptos::prelude::*;
use web_sys::UrlSearchParams;

use navview_shared::ViewerOptions;

use crate::bridge::{self, BridgeSignals, ConnectionStatus};
use crate::canvas::MapCanvas;
use crate::marker::RobotMarker;
use crate::occupancy::MapLayer;
use crate::viewer::Viewer;

fn viewer_options() -> ViewerOptions {
    let Some(params) = web_sys::window()
        .and_then(|w| w.location().search().ok())
        .and_then(|query| UrlSearchParams::new_with_str(&query).ok())
    else {
        return ViewerOptions::default();
    };
    ViewerOptions::from_pairs(
        ViewerOptions::QUERY_KEYS
            .iter()
            .filter_map(|key| params.get(key).map(|value| (*key, value))),
    )
}

fn initial_viewer() -> Viewer {
    let size = web_sys::window().map(|w| {
        let width = w.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        let height = w.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        (width, height)
    });
    let (width, height) = size.unwrap_or((0.0, 0.0));
    Viewer::new(width.max(1.0), height.max(1.0))
}

#[component]
pub fn App() -> impl IntoView {
    let options = viewer_options();

    let viewer: RwSignal<Viewer> = RwSignal::new(initial_viewer());
    let map_layer: RwSignal<Option<MapLayer>> = RwSignal::new(None);
    let marker: RwSignal<RobotMarker> = RwSignal::new(RobotMarker::default());
    let connection: RwSignal<ConnectionStatus> = RwSignal::new(ConnectionStatus::Connecting);

    provide_context(viewer);
    provide_context(map_layer);
    provide_context(marker);
    provide_context(connection);

    let signals = BridgeSignals {
        viewer,
        map_layer,
        marker,
        connection,
    };

    // Connect to the relay on mount
    Effect::new(move || {
        bridge::connect(options.clone(), signals);
        on_cleanup(|| {
            bridge::disconnect();
        });
    });

    view! {
        <div style="position: fixed; inset: 0; background: #7f7f7f;">
            <MapCanvas />
            <StatusBadge />
        </div>
    }
}

/// Connection indicator in the top-left corner.
#[component]
fn StatusBadge() -> impl IntoView {
    let connection: RwSignal<ConnectionStatus> = expect_context();
    let map_layer: RwSignal<Option<MapLayer>> = expect_context();

    let label = move || match connection.get() {
        ConnectionStatus::Connecting => "connecting",
        ConnectionStatus::Live if map_layer.with(Option::is_none) => "waiting for map",
        ConnectionStatus::Live => "live",
        ConnectionStatus::Reconnecting => "reconnecting",
    };
    let dot = move || match connection.get() {
        ConnectionStatus::Live => "#3fb950",
        ConnectionStatus::Connecting => "#d29922",
        ConnectionStatus::Reconnecting => "#f85149",
    };

    view! {
        <div style="position: absolute; top: 12px; left: 12px; z-index: 10; padding: 4px 10px; background: rgba(19,22,31,0.85); border: 1px solid #282c3e; border-radius: 6px; color: #e2e0d8; font-family: 'JetBrains Mono', monospace; font-size: 0.75rem; display: flex; align-items: center; gap: 6px; pointer-events: none;">
            <span style=move || format!("width: 8px; height: 8px; border-radius: 50%; background: {};", dot()) />
            {label}
        </div>
    }
}
