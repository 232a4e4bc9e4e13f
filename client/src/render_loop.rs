use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::prelude::*;

/// Coalesces repaint requests into at most one `requestAnimationFrame`
/// callback per display refresh.
pub struct RenderScheduler {
    frame: Rc<Frame>,
}

struct Frame {
    window: Option<web_sys::Window>,
    pending: Cell<Option<i32>>,
    callback: RefCell<Option<Closure<dyn FnMut()>>>,
}

impl Frame {
    fn request(&self) {
        if self.pending.get().is_some() {
            return;
        }
        let Some(window) = self.window.as_ref() else {
            return;
        };
        let callback = self.callback.borrow();
        let Some(callback) = callback.as_ref() else {
            return;
        };
        if let Ok(id) = window.request_animation_frame(callback.as_ref().unchecked_ref()) {
            self.pending.set(Some(id));
        }
    }
}

impl RenderScheduler {
    pub fn new(render_fn: impl Fn() + 'static) -> Self {
        let frame = Rc::new(Frame {
            window: web_sys::window(),
            pending: Cell::new(None),
            callback: RefCell::new(None),
        });

        let frame_cb = Rc::downgrade(&frame);
        let callback = Closure::<dyn FnMut()>::new(move || {
            let Some(frame) = frame_cb.upgrade() else {
                return;
            };
            frame.pending.set(None);
            render_fn();
        });
        *frame.callback.borrow_mut() = Some(callback);

        Self { frame }
    }

    /// Ask for a repaint on the next frame.
    pub fn mark_dirty(&self) {
        self.frame.request();
    }
}

impl Drop for RenderScheduler {
    fn drop(&mut self) {
        if let Some(id) = self.frame.pending.take()
            && let Some(window) = self.frame.window.as_ref()
        {
            let _ = window.cancel_animation_frame(id);
        }
        self.frame.callback.borrow_mut().take();
    }
}
