//! The infinite-canvas coordinate model.
//!
//! Owns the [`ViewTransform`] and the host's screen size. Pan and zoom apply
//! immediately; reset and pan-to can animate with an ease-out curve that is
//! advanced by [`ViewportModel::tick`] once per frame.

use kurbo::{Point, Rect, Size, Vec2};
use mosaic_core::{ViewTransform, clamp_scale};
use serde::Deserialize;

/// Tunables the host may override with JSON.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Logical point centered by a view reset.
    pub home: Point,
    pub reset_duration_ms: f64,
    pub pan_duration_ms: f64,
    /// Wheel zoom factor per unit of `deltaY`.
    pub wheel_sensitivity: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            home: Point::ZERO,
            reset_duration_ms: 800.0,
            pan_duration_ms: 400.0,
            wheel_sensitivity: 0.001,
        }
    }
}

/// Where [`ViewportModel::pan_to`] puts its target on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    Center,
    /// `inset` screen pixels from the top-left corner.
    TopLeft { inset: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Animation {
    from: ViewTransform,
    to: ViewTransform,
    started_at: f64,
    duration: f64,
}

/// Ease-out quadratic: fast start, gentle landing.
pub fn ease_out_quad(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t) * (1.0 - t)
}

#[derive(Debug, Clone)]
pub struct ViewportModel {
    view: ViewTransform,
    screen: Size,
    config: ViewportConfig,
    animation: Option<Animation>,
    dirty: bool,
}

impl ViewportModel {
    pub fn new(config: ViewportConfig, screen: Size) -> Self {
        Self {
            view: ViewTransform::default(),
            screen,
            config,
            animation: None,
            dirty: true,
        }
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    pub fn transform(&self) -> ViewTransform {
        self.view
    }

    pub fn scale(&self) -> f64 {
        self.view.scale
    }

    pub fn offset(&self) -> Point {
        self.view.offset
    }

    /// Replace the transform outright (project restore). Cancels animation.
    pub fn set_transform(&mut self, view: ViewTransform) {
        self.animation = None;
        self.view = ViewTransform::new(view.offset, view.scale);
        self.dirty = true;
    }

    pub fn screen_size(&self) -> Size {
        self.screen
    }

    pub fn resize(&mut self, screen: Size) {
        if self.screen != screen {
            self.screen = screen;
            self.dirty = true;
        }
    }

    pub fn screen_to_logical(&self, p: Point) -> Point {
        self.view.to_logical(p)
    }

    pub fn logical_to_screen(&self, p: Point) -> Point {
        self.view.to_screen(p)
    }

    /// Logical point under the screen center.
    pub fn center_logical(&self) -> Point {
        self.screen_to_logical(Point::new(self.screen.width / 2.0, self.screen.height / 2.0))
    }

    /// Translate by a screen-space delta. Unbounded.
    pub fn pan(&mut self, delta: Vec2) {
        self.animation = None;
        self.view.offset += delta;
        self.dirty = true;
    }

    /// Multiply the scale by `factor`, keeping the logical point under
    /// `pivot` (screen coordinates) fixed.
    pub fn zoom(&mut self, pivot: Point, factor: f64) {
        self.animation = None;
        let old = self.view.scale;
        let new = clamp_scale(old * factor);
        let offset = self.view.offset;
        self.view.offset = Point::new(
            pivot.x - (pivot.x - offset.x) / old * new,
            pivot.y - (pivot.y - offset.y) / old * new,
        );
        self.view.scale = new;
        self.dirty = true;
    }

    /// Zoom for one wheel event.
    pub fn wheel(&mut self, pivot: Point, delta_y: f64) {
        self.zoom(pivot, 1.0 - delta_y * self.config.wheel_sensitivity);
    }

    /// Back to scale 1 with the home point centered.
    pub fn reset_view(&mut self, animated: bool, now: f64) {
        let center = Point::new(self.screen.width / 2.0, self.screen.height / 2.0);
        let home = self.config.home;
        let target = ViewTransform::new(Point::new(center.x - home.x, center.y - home.y), 1.0);
        let duration = self.config.reset_duration_ms;
        self.go_to(target, animated, now, duration);
    }

    /// Bring a logical point to `placement` without changing the scale.
    pub fn pan_to(&mut self, logical: Point, placement: Placement, animated: bool, now: f64) {
        let anchor = match placement {
            Placement::Center => Point::new(self.screen.width / 2.0, self.screen.height / 2.0),
            Placement::TopLeft { inset } => Point::new(inset, inset),
        };
        let scale = self.view.scale;
        let target = ViewTransform::new(
            Point::new(anchor.x - logical.x * scale, anchor.y - logical.y * scale),
            scale,
        );
        let duration = self.config.pan_duration_ms;
        self.go_to(target, animated, now, duration);
    }

    fn go_to(&mut self, target: ViewTransform, animated: bool, now: f64, duration: f64) {
        if animated && duration > 0.0 {
            log::debug!("viewport: animating to {target:?} over {duration}ms");
            self.animation = Some(Animation {
                from: self.view,
                to: target,
                started_at: now,
                duration,
            });
        } else {
            self.animation = None;
            self.view = target;
        }
        self.dirty = true;
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Advance a running animation. Returns true while it is still running.
    pub fn tick(&mut self, now: f64) -> bool {
        let Some(anim) = self.animation else {
            return false;
        };
        let t = (now - anim.started_at) / anim.duration;
        if t >= 1.0 {
            self.view = anim.to;
            self.animation = None;
        } else {
            let e = ease_out_quad(t);
            let lerp = |a: f64, b: f64| a + (b - a) * e;
            self.view = ViewTransform {
                offset: Point::new(
                    lerp(anim.from.offset.x, anim.to.offset.x),
                    lerp(anim.from.offset.y, anim.to.offset.y),
                ),
                scale: lerp(anim.from.scale, anim.to.scale),
            };
        }
        self.dirty = true;
        self.animation.is_some()
    }

    /// Whether the transform changed since the last call. Resets the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Logical rect covering the screen plus `buffer` screen pixels on every
    /// side.
    pub fn visible_rect(&self, buffer: f64) -> Rect {
        let ViewTransform { offset, scale } = self.view;
        Rect::new(
            (-offset.x - buffer) / scale,
            (-offset.y - buffer) / scale,
            (self.screen.width - offset.x + buffer) / scale,
            (self.screen.height - offset.y + buffer) / scale,
        )
    }
}

impl Default for ViewportModel {
    fn default() -> Self {
        Self::new(ViewportConfig::default(), Size::new(1280.0, 800.0))
    }
}
