use crate::geometry::MapGeometry;

/// Canvas transform operations the synchronizer drives.
pub trait ViewportControl {
    /// Set the scale so that `width` x `height` world units fill the canvas.
    fn scale_to_dimensions(&mut self, width: f64, height: f64);

    /// Move the canvas origin by a world-unit delta. Cumulative.
    fn shift_by(&mut self, dx: f64, dy: f64);
}

/// Bring `viewport` in line with `next` and return the geometry that is now
/// applied, to be handed back as `previous` on the following map update.
///
/// The first update (`previous == None`) scales to the full extent and shifts
/// by the raw origin. Afterwards a size change rescales absolutely and an
/// origin change shifts by the delta; both may fire for one update, and an
/// unchanged geometry touches nothing.
pub fn sync_viewport<V>(
    previous: Option<MapGeometry>,
    viewport: &mut V,
    next: MapGeometry,
) -> MapGeometry
where
    V: ViewportControl + ?Sized,
{
    let Some(mut applied) = previous else {
        viewport.scale_to_dimensions(next.width, next.height);
        viewport.shift_by(next.origin_x, next.origin_y);
        return next;
    };

    if !applied.same_size(&next) {
        viewport.scale_to_dimensions(next.width, next.height);
        applied.width = next.width;
        applied.height = next.height;
    }

    if !applied.same_origin(&next) {
        viewport.shift_by(
            next.origin_x - applied.origin_x,
            next.origin_y - applied.origin_y,
        );
        applied.origin_x = next.origin_x;
        applied.origin_y = next.origin_y;
    }

    applied
}
