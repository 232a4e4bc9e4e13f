use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use wasm_bindgen::prelude::*;
use wasm_bindgen::{Clamped, JsCast};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, ImageData, PointerEvent, WheelEvent};

use crate::marker::RobotMarker;
use crate::occupancy::MapLayer;
use crate::render_loop::RenderScheduler;
use crate::viewer::Viewer;

const BACKGROUND: &str = "#7f7f7f";

/// Off-screen copy of the current map bitmap, rebuilt only when a new map
/// generation arrives.
struct MapBitmap {
    generation: u64,
    canvas: HtmlCanvasElement,
}

struct ResizeBinding {
    window: web_sys::Window,
    callback: Closure<dyn Fn()>,
}

thread_local! {
    static RESIZE_BINDING: RefCell<Option<ResizeBinding>> = const { RefCell::new(None) };
}

fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
    canvas
        .get_context("2d")
        .ok()
        .flatten()
        .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
}

fn build_bitmap(layer: &MapLayer) -> Option<MapBitmap> {
    let document = web_sys::window()?.document()?;
    let canvas = document
        .create_element("canvas")
        .ok()?
        .dyn_into::<HtmlCanvasElement>()
        .ok()?;
    canvas.set_width(layer.columns);
    canvas.set_height(layer.rows);
    let ctx = context_2d(&canvas)?;
    let image =
        ImageData::new_with_u8_clamped_array_and_sh(Clamped(&layer.rgba), layer.columns, layer.rows)
            .ok()?;
    ctx.put_image_data(&image, 0.0, 0.0).ok()?;
    Some(MapBitmap {
        generation: layer.generation,
        canvas,
    })
}

fn paint(
    ctx: &CanvasRenderingContext2d,
    viewer: &Viewer,
    layer: Option<&MapLayer>,
    bitmap: Option<&MapBitmap>,
    marker: &RobotMarker,
) {
    ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0).ok();
    ctx.set_fill_style_str(BACKGROUND);
    ctx.fill_rect(0.0, 0.0, viewer.width, viewer.height);

    let (offset_x, offset_y) = viewer.offset();
    if ctx
        .set_transform(viewer.scale_x, 0.0, 0.0, viewer.scale_y, offset_x, offset_y)
        .is_err()
    {
        return;
    }

    if let (Some(layer), Some(bitmap)) = (layer, bitmap) {
        let (x, y, w, h) = layer.geometry.scene_rect();
        ctx.set_image_smoothing_enabled(false);
        ctx.draw_image_with_html_canvas_element_and_dw_and_dh(&bitmap.canvas, x, y, w, h)
            .ok();
    }

    marker.draw(ctx);
}

/// Full-size 2D canvas showing the occupancy map and the robot marker, with
/// drag to pan and wheel to zoom.
#[component]
pub fn MapCanvas() -> impl IntoView {
    let viewer: RwSignal<Viewer> = expect_context();
    let map_layer: RwSignal<Option<MapLayer>> = expect_context();
    let marker: RwSignal<RobotMarker> = expect_context();

    let canvas_ref = NodeRef::<leptos::html::Canvas>::new();

    let is_dragging = Rc::new(Cell::new(false));
    let last_x = Rc::new(Cell::new(0.0f64));
    let last_y = Rc::new(Cell::new(0.0f64));

    let bitmap: Rc<RefCell<Option<MapBitmap>>> = Rc::new(RefCell::new(None));
    let bitmap_render = bitmap.clone();

    let scheduler = RenderScheduler::new(move || {
        let Some(canvas_el) = canvas_ref.get_untracked() else {
            return;
        };
        let canvas: &HtmlCanvasElement = &canvas_el;

        // Canvas backing size follows its container.
        if let Some(parent) = canvas.parent_element() {
            let w = parent.client_width().max(0) as u32;
            let h = parent.client_height().max(0) as u32;
            if w == 0 || h == 0 {
                return;
            }
            if canvas.width() != w || canvas.height() != h {
                canvas.set_width(w);
                canvas.set_height(h);
                viewer.update_untracked(|v| v.resize(w as f64, h as f64));
            }
        }

        let Some(ctx) = context_2d(canvas) else {
            return;
        };

        map_layer.with_untracked(|layer| {
            let mut cached = bitmap_render.borrow_mut();
            match layer {
                Some(layer) if cached.as_ref().map(|b| b.generation) != Some(layer.generation) => {
                    *cached = build_bitmap(layer);
                }
                None => *cached = None,
                _ => {}
            }
            let vp = viewer.get_untracked();
            marker.with_untracked(|m| paint(&ctx, &vp, layer.as_ref(), cached.as_ref(), m));
        });
    });
    let scheduler = Rc::new(scheduler);

    let sched_state = scheduler.clone();
    Effect::new(move || {
        viewer.track();
        map_layer.track();
        marker.track();
        sched_state.mark_dirty();
    });

    let sched_resize = scheduler.clone();
    Effect::new(move || {
        let Some(window) = web_sys::window() else {
            return;
        };
        RESIZE_BINDING.with(|slot| {
            if let Some(old) = slot.borrow_mut().take() {
                old.window
                    .remove_event_listener_with_callback(
                        "resize",
                        old.callback.as_ref().unchecked_ref(),
                    )
                    .ok();
            }
        });

        let sched = sched_resize.clone();
        let callback = Closure::<dyn Fn()>::new(move || sched.mark_dirty());
        if window
            .add_event_listener_with_callback("resize", callback.as_ref().unchecked_ref())
            .is_err()
        {
            return;
        }
        RESIZE_BINDING.with(|slot| {
            *slot.borrow_mut() = Some(ResizeBinding { window, callback });
        });
    });

    // --- Input handlers ---

    let on_wheel = move |e: WheelEvent| {
        e.prevent_default();
        let delta = e.delta_y();
        let x = e.offset_x() as f64;
        let y = e.offset_y() as f64;
        viewer.update(|vp| vp.zoom_at(delta, x, y));
    };

    let on_pointer_down = {
        let is_dragging = is_dragging.clone();
        let last_x = last_x.clone();
        let last_y = last_y.clone();
        move |e: PointerEvent| {
            is_dragging.set(true);
            last_x.set(e.client_x() as f64);
            last_y.set(e.client_y() as f64);

            if let Some(target) = e.target()
                && let Ok(el) = target.dyn_into::<web_sys::HtmlElement>()
            {
                el.set_pointer_capture(e.pointer_id()).ok();
                el.style().set_property("cursor", "grabbing").ok();
            }
        }
    };

    let on_pointer_move = {
        let is_dragging = is_dragging.clone();
        move |e: PointerEvent| {
            if !is_dragging.get() {
                return;
            }
            let dx = e.client_x() as f64 - last_x.get();
            let dy = e.client_y() as f64 - last_y.get();
            last_x.set(e.client_x() as f64);
            last_y.set(e.client_y() as f64);
            viewer.update(|vp| vp.pan(dx, dy));
        }
    };

    let on_pointer_up = move |e: PointerEvent| {
        is_dragging.set(false);
        if let Some(target) = e.target()
            && let Ok(el) = target.dyn_into::<web_sys::HtmlElement>()
        {
            el.style().set_property("cursor", "grab").ok();
        }
    };

    view! {
        <div style="position: relative; width: 100%; height: 100%; overflow: hidden;">
            <canvas
                node_ref=canvas_ref
                style="position: absolute; inset: 0; width: 100%; height: 100%; touch-action: none; image-rendering: pixelated; cursor: grab;"
                on:wheel=on_wheel
                on:pointerdown=on_pointer_down
                on:pointermove=on_pointer_move
                on:pointerup=on_pointer_up
            />
        </div>
    }
}
