use crate::constants::{
    HOVER_SMOOTHING, HOVER_SNAP_EPSILON, MAX_FRAME_DT, POINTER_COALESCE_MS,
    POINTER_VELOCITY_DECAY, REFERENCE_FRAME_DT,
};
use glam::Vec2;

/// Bounding rectangle of the host element in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HostRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl HostRect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// What counts as "hovering" for the hover-intensity signal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HoverRegion {
    /// Anywhere inside the host element.
    Element,
    /// Inside a centered disc, radius in size-normalized units
    /// (`size = min(width, height)`, the short edge spans `[-1, 1]`).
    Disc { radius: f32 },
}

/// Smoothed, normalized view of the pointer consumed by the simulation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InteractionSignal {
    /// Cursor in `[-1, 1]`, y up.
    pub pointer: Vec2,
    /// Cursor in `[0, 1]`, y down (texture convention).
    pub uv: Vec2,
    /// Movement between the last two accepted pointer samples in uv units,
    /// decayed every frame.
    pub velocity: Vec2,
    /// Smoothed hover blend in `[0, 1]`.
    pub hover: f32,
    /// Target the hover blend is moving toward (0 or 1).
    pub hover_target: f32,
    pub inside: bool,
    /// Host size in CSS pixels.
    pub viewport: Vec2,
}

impl Default for InteractionSignal {
    fn default() -> Self {
        Self {
            pointer: Vec2::ZERO,
            uv: Vec2::splat(0.5),
            velocity: Vec2::ZERO,
            hover: 0.0,
            hover_target: 0.0,
            inside: false,
            viewport: Vec2::ZERO,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct PendingMove {
    client: Vec2,
    timestamp_ms: f64,
}

/// Turns raw pointer / viewport / visibility events into an [`InteractionSignal`].
///
/// Event handlers write here at input rate; the render loop reads once per
/// executed tick after calling [`InteractionAdapter::advance`].
#[derive(Clone, Debug)]
pub struct InteractionAdapter {
    bounds: HostRect,
    region: HoverRegion,
    forced_hover: bool,
    last_accepted_ms: Option<f64>,
    pending: Option<PendingMove>,
    last_client: Option<Vec2>,
    last_uv: Option<Vec2>,
    signal: InteractionSignal,
    document_visible: bool,
    in_viewport: bool,
    resize_pending: bool,
    moves_applied: u64,
    moves_coalesced: u64,
}

impl InteractionAdapter {
    pub fn new(bounds: HostRect, region: HoverRegion) -> Self {
        let signal = InteractionSignal {
            viewport: Vec2::new(bounds.width, bounds.height),
            ..Default::default()
        };
        Self {
            bounds,
            region,
            forced_hover: false,
            last_accepted_ms: None,
            pending: None,
            last_client: None,
            last_uv: None,
            signal,
            document_visible: true,
            in_viewport: true,
            resize_pending: false,
            moves_applied: 0,
            moves_coalesced: 0,
        }
    }

    pub fn set_region(&mut self, region: HoverRegion) {
        self.region = region;
        self.refresh_hover_target();
    }

    /// Pin the hover target to 1 regardless of the pointer.
    pub fn set_forced_hover(&mut self, forced: bool) {
        self.forced_hover = forced;
        self.refresh_hover_target();
    }

    #[inline]
    pub fn bounds(&self) -> HostRect {
        self.bounds
    }

    #[inline]
    pub fn signal(&self) -> InteractionSignal {
        self.signal
    }

    /// `(applied, coalesced)` pointer move counts.
    pub fn move_counts(&self) -> (u64, u64) {
        (self.moves_applied, self.moves_coalesced)
    }

    // ---------------- events ----------------

    /// Pointer moved to client coordinates at host time `timestamp_ms`.
    ///
    /// Moves closer than the coalescing window to the last accepted one are
    /// parked (latest wins) and applied by [`InteractionAdapter::flush`].
    /// Returns whether the move was applied immediately.
    pub fn on_pointer_move(&mut self, client_x: f32, client_y: f32, timestamp_ms: f64) -> bool {
        let client = Vec2::new(client_x, client_y);
        if let Some(last) = self.last_accepted_ms {
            let since = timestamp_ms - last;
            if since >= 0.0 && since < POINTER_COALESCE_MS {
                self.pending = Some(PendingMove {
                    client,
                    timestamp_ms,
                });
                self.moves_coalesced += 1;
                return false;
            }
        }
        self.apply_move(client, timestamp_ms);
        true
    }

    /// Apply a parked move once its coalescing window has passed.
    pub fn flush(&mut self, now_ms: f64) {
        let Some(pending) = self.pending else {
            return;
        };
        let due = match self.last_accepted_ms {
            Some(last) => now_ms - last >= POINTER_COALESCE_MS || now_ms < last,
            None => true,
        };
        if due {
            self.pending = None;
            self.apply_move(pending.client, pending.timestamp_ms.max(now_ms));
        }
    }

    pub fn on_pointer_leave(&mut self) {
        self.pending = None;
        self.last_client = None;
        self.last_uv = None;
        self.signal.inside = false;
        self.signal.velocity = Vec2::ZERO;
        self.refresh_hover_target();
    }

    /// Host element was resized or moved; coordinates are re-derived from the
    /// new rectangle.
    pub fn on_resize(&mut self, bounds: HostRect) {
        if bounds == self.bounds {
            return;
        }
        self.bounds = bounds;
        self.signal.viewport = Vec2::new(bounds.width, bounds.height);
        self.resize_pending = true;
        if let Some(client) = self.last_client {
            self.locate(client);
            // a resize is not a movement
            self.last_uv = Some(self.signal.uv);
        }
    }

    /// Take the latest unconsumed resize, if any.
    pub fn take_resize(&mut self) -> Option<HostRect> {
        if self.resize_pending {
            self.resize_pending = false;
            Some(self.bounds)
        } else {
            None
        }
    }

    pub fn set_document_visible(&mut self, visible: bool) {
        self.document_visible = visible;
    }

    pub fn set_in_viewport(&mut self, intersecting: bool) {
        self.in_viewport = intersecting;
    }

    /// Visible only when the document is shown and the host intersects the viewport.
    #[inline]
    pub fn is_visible(&self) -> bool {
        self.document_visible && self.in_viewport
    }

    // ---------------- per tick ----------------

    /// Advance smoothing by one executed frame of `dt_sec`.
    ///
    /// The hover blend covers `HOVER_SMOOTHING` of the remaining distance per
    /// reference frame (1/60 s); the fraction is rescaled for other frame
    /// intervals so all quality tiers converge at the same wall-clock speed.
    pub fn advance(&mut self, dt_sec: f32) {
        let frames = frames_elapsed(dt_sec);
        let alpha = 1.0 - (1.0 - HOVER_SMOOTHING).powf(frames);
        let target = self.signal.hover_target;
        let mut hover = self.signal.hover + (target - self.signal.hover) * alpha;
        if (target - hover).abs() < HOVER_SNAP_EPSILON {
            hover = target;
        }
        self.signal.hover = hover.clamp(0.0, 1.0);
        self.signal.velocity *= POINTER_VELOCITY_DECAY.powf(frames);
    }

    // ---------------- helpers ----------------

    fn apply_move(&mut self, client: Vec2, timestamp_ms: f64) {
        if self.bounds.is_empty() {
            return;
        }
        self.last_accepted_ms = Some(timestamp_ms);
        self.last_client = Some(client);
        self.locate(client);
        let uv = self.signal.uv;
        self.signal.velocity = match self.last_uv {
            Some(prev) => uv - prev,
            None => Vec2::ZERO,
        };
        self.last_uv = Some(uv);
        self.moves_applied += 1;
    }

    fn locate(&mut self, client: Vec2) {
        let b = self.bounds;
        if b.is_empty() {
            return;
        }
        let local = Vec2::new(client.x - b.left, client.y - b.top);
        let raw_uv = Vec2::new(local.x / b.width, local.y / b.height);
        self.signal.inside = (0.0..=1.0).contains(&raw_uv.x) && (0.0..=1.0).contains(&raw_uv.y);
        let uv = raw_uv.clamp(Vec2::ZERO, Vec2::ONE);
        self.signal.uv = uv;
        self.signal.pointer = Vec2::new(uv.x * 2.0 - 1.0, 1.0 - uv.y * 2.0);
        self.refresh_hover_target();
    }

    fn refresh_hover_target(&mut self) {
        let hovering = self.forced_hover
            || match (self.region, self.last_client) {
                (_, None) => false,
                (HoverRegion::Element, Some(_)) => self.signal.inside,
                (HoverRegion::Disc { radius }, Some(client)) => {
                    let b = self.bounds;
                    let size = b.width.min(b.height);
                    if size <= 0.0 {
                        false
                    } else {
                        let x = (client.x - b.left - b.width * 0.5) / size * 2.0;
                        let y = (client.y - b.top - b.height * 0.5) / size * 2.0;
                        Vec2::new(x, y).length() < radius
                    }
                }
            };
        self.signal.hover_target = if hovering { 1.0 } else { 0.0 };
    }
}

/// Elapsed time expressed in reference frames, after the global dt clamp.
#[inline]
pub(crate) fn frames_elapsed(dt_sec: f32) -> f32 {
    if !dt_sec.is_finite() || dt_sec <= 0.0 {
        return 0.0;
    }
    dt_sec.min(MAX_FRAME_DT) / REFERENCE_FRAME_DT
}
