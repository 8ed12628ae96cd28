use crate::Action;
use glam::Vec2;

/// Hit testing against the paintable surface, supplied by the application.
pub trait SurfacePicker {
    /// Whether a model is loaded. Drags do nothing without one.
    fn has_target(&self) -> bool;

    /// Paint-canvas texel under a window position, if the garment is there.
    fn pick_texel(&self, screen: Vec2) -> Option<Vec2>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureSettings {
    /// Camera distance per unit of wheel delta or pinch distance.
    pub zoom_speed: f32,
    /// Radians of model yaw per horizontal pixel dragged.
    pub rotate_speed: f32,
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self {
            zoom_speed: 0.01,
            rotate_speed: 0.01,
        }
    }
}

/// Browser-style pixels per wheel line step.
pub const PIXELS_PER_LINE: f32 = 100.0;

/// Vertical wheel motion as the windowing layer reports it: positive scrolls
/// up (away from the user).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WheelDelta {
    Lines(f32),
    Pixels(f32),
}

impl WheelDelta {
    /// The same motion as a browser `deltaY`, where positive scrolls down.
    pub fn browser_delta_y(self) -> f32 {
        match self {
            Self::Lines(y) => -y * PIXELS_PER_LINE,
            Self::Pixels(y) => -y,
        }
    }
}

/// Turns pointer, touch and wheel events into [`Action`]s.
///
/// A press that lands on the garment starts a stroke; a press anywhere else
/// starts a turntable drag. Two fingers pinch-zoom.
#[derive(Debug, Default)]
pub struct GestureController {
    settings: GestureSettings,
    mouse_down: bool,
    last_x: f32,
    drawing: bool,
    last_touch_distance: Option<f32>,
    /// Active touches in the order they started.
    touches: Vec<(u64, Vec2)>,
}

impl GestureController {
    pub fn new(settings: GestureSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> GestureSettings {
        self.settings
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    pub fn is_mouse_down(&self) -> bool {
        self.mouse_down
    }

    pub fn touch_count(&self) -> usize {
        self.touches.len()
    }

    /// Browser-style wheel delta: positive scrolls down and zooms out.
    pub fn wheel(&mut self, delta_y: f32) -> Option<Action> {
        if delta_y == 0.0 {
            return None;
        }
        Some(Action::Zoom(delta_y * self.settings.zoom_speed))
    }

    /// Wheel event straight from the windowing layer.
    pub fn scroll(&mut self, delta: WheelDelta) -> Option<Action> {
        self.wheel(delta.browser_delta_y())
    }

    pub fn mouse_down(&mut self, pos: Vec2, picker: &impl SurfacePicker) -> Option<Action> {
        self.mouse_down = true;
        self.press(pos, picker)
    }

    pub fn mouse_moved(&mut self, pos: Vec2, picker: &impl SurfacePicker) -> Option<Action> {
        if !self.mouse_down || !picker.has_target() {
            return None;
        }
        self.drag(pos, picker)
    }

    pub fn mouse_up(&mut self) -> Option<Action> {
        self.mouse_down = false;
        self.stop_drawing()
    }

    /// Pointer left the window. Same as releasing the button.
    pub fn mouse_left(&mut self) -> Option<Action> {
        self.mouse_up()
    }

    pub fn touch_start(&mut self, id: u64, pos: Vec2, picker: &impl SurfacePicker) -> Option<Action> {
        self.touches.retain(|(t, _)| *t != id);
        self.touches.push((id, pos));
        if self.touches.len() == 1 {
            self.press(pos, picker)
        } else {
            None
        }
    }

    pub fn touch_moved(&mut self, id: u64, pos: Vec2, picker: &impl SurfacePicker) -> Option<Action> {
        let slot = self.touches.iter_mut().find(|(t, _)| *t == id)?;
        slot.1 = pos;

        match self.touches.as_slice() {
            [(_, a), (_, b)] => {
                let distance = a.distance(*b);
                let action = self
                    .last_touch_distance
                    .map(|last| Action::Zoom((last - distance) * self.settings.zoom_speed));
                self.last_touch_distance = Some(distance);
                action
            }
            [_] if picker.has_target() => self.drag(pos, picker),
            _ => None,
        }
    }

    /// A finger lifted or the touch was cancelled.
    pub fn touch_ended(&mut self, id: u64) -> Option<Action> {
        self.touches.retain(|(t, _)| *t != id);
        self.last_touch_distance = None;
        self.stop_drawing()
    }

    fn press(&mut self, pos: Vec2, picker: &impl SurfacePicker) -> Option<Action> {
        self.last_x = pos.x;
        let texel = picker.pick_texel(pos)?;
        tracing::debug!("stroke begins at texel ({:.1}, {:.1})", texel.x, texel.y);
        self.drawing = true;
        Some(Action::BeginStroke(texel))
    }

    fn drag(&mut self, pos: Vec2, picker: &impl SurfacePicker) -> Option<Action> {
        let action = if self.drawing {
            // Off the garment mid-stroke: skip the sample, keep the anchor.
            Action::ContinueStroke(picker.pick_texel(pos)?)
        } else {
            Action::RotateModel((pos.x - self.last_x) * self.settings.rotate_speed)
        };
        self.last_x = pos.x;
        Some(action)
    }

    fn stop_drawing(&mut self) -> Option<Action> {
        std::mem::take(&mut self.drawing).then_some(Action::EndStroke)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Garment occupies screen x in [100, 200); texel = screen position.
    struct FakePicker {
        loaded: bool,
    }

    impl SurfacePicker for FakePicker {
        fn has_target(&self) -> bool {
            self.loaded
        }

        fn pick_texel(&self, screen: Vec2) -> Option<Vec2> {
            (self.loaded && (100.0..200.0).contains(&screen.x)).then_some(screen)
        }
    }

    const LOADED: FakePicker = FakePicker { loaded: true };
    const EMPTY: FakePicker = FakePicker { loaded: false };

    fn v(x: f32, y: f32) -> Vec2 {
        Vec2::new(x, y)
    }

    fn assert_near(actual: Option<Action>, expected: Action) {
        match (actual, expected) {
            (Some(Action::Zoom(a)), Action::Zoom(b)) | (Some(Action::RotateModel(a)), Action::RotateModel(b)) => {
                assert!((a - b).abs() < 1e-5, "{a} != {b}")
            }
            (actual, expected) => assert_eq!(actual, Some(expected)),
        }
    }

    #[test]
    fn wheel_zooms_by_speed() {
        let mut g = GestureController::default();
        assert_near(g.wheel(100.0), Action::Zoom(1.0));
        assert_near(g.wheel(-50.0), Action::Zoom(-0.5));
        assert_eq!(g.wheel(0.0), None);
    }

    #[test]
    fn scroll_converts_lines_and_pixels() {
        let mut g = GestureController::default();
        // One line toward the user is a browser delta of +100: zoom out by 1.
        assert_near(g.scroll(WheelDelta::Lines(-1.0)), Action::Zoom(1.0));
        assert_near(g.scroll(WheelDelta::Lines(2.0)), Action::Zoom(-2.0));
        assert_near(g.scroll(WheelDelta::Pixels(-30.0)), Action::Zoom(0.3));
        assert_near(g.scroll(WheelDelta::Pixels(45.0)), Action::Zoom(-0.45));
        assert_eq!(g.scroll(WheelDelta::Lines(0.0)), None);
        assert_eq!(g.scroll(WheelDelta::Pixels(0.0)), None);
    }

    #[test]
    fn press_on_garment_starts_stroke() {
        let mut g = GestureController::default();
        assert_eq!(g.mouse_down(v(150.0, 10.0), &LOADED), Some(Action::BeginStroke(v(150.0, 10.0))));
        assert!(g.is_drawing());
        assert_eq!(g.mouse_moved(v(160.0, 12.0), &LOADED), Some(Action::ContinueStroke(v(160.0, 12.0))));
        assert_eq!(g.mouse_up(), Some(Action::EndStroke));
        assert!(!g.is_drawing());
        assert_eq!(g.mouse_up(), None);
    }

    #[test]
    fn press_off_garment_rotates() {
        let mut g = GestureController::default();
        assert_eq!(g.mouse_down(v(10.0, 10.0), &LOADED), None);
        assert_near(g.mouse_moved(v(30.0, 50.0), &LOADED), Action::RotateModel(0.2));
        assert_near(g.mouse_moved(v(20.0, 50.0), &LOADED), Action::RotateModel(-0.1));
        assert_eq!(g.mouse_up(), None);
    }

    #[test]
    fn moves_without_button_or_model_are_ignored() {
        let mut g = GestureController::default();
        assert_eq!(g.mouse_moved(v(50.0, 0.0), &LOADED), None);
        g.mouse_down(v(10.0, 0.0), &EMPTY);
        assert_eq!(g.mouse_moved(v(50.0, 0.0), &EMPTY), None);
    }

    #[test]
    fn miss_mid_stroke_keeps_anchor() {
        let mut g = GestureController::default();
        g.mouse_down(v(150.0, 0.0), &LOADED);
        assert_eq!(g.mouse_moved(v(250.0, 0.0), &LOADED), None);
        assert!(g.is_drawing());
        // Back on the garment, the stroke continues.
        assert_eq!(g.mouse_moved(v(190.0, 0.0), &LOADED), Some(Action::ContinueStroke(v(190.0, 0.0))));
    }

    #[test]
    fn leaving_window_ends_stroke() {
        let mut g = GestureController::default();
        g.mouse_down(v(150.0, 0.0), &LOADED);
        assert_eq!(g.mouse_left(), Some(Action::EndStroke));
        assert!(!g.is_mouse_down());
        assert_eq!(g.mouse_moved(v(160.0, 0.0), &LOADED), None);
    }

    #[test]
    fn single_touch_draws_and_rotates() {
        let mut g = GestureController::default();
        assert_eq!(g.touch_start(1, v(120.0, 0.0), &LOADED), Some(Action::BeginStroke(v(120.0, 0.0))));
        assert_eq!(g.touch_moved(1, v(130.0, 0.0), &LOADED), Some(Action::ContinueStroke(v(130.0, 0.0))));
        assert_eq!(g.touch_ended(1), Some(Action::EndStroke));

        assert_eq!(g.touch_start(2, v(10.0, 0.0), &LOADED), None);
        assert_near(g.touch_moved(2, v(60.0, 0.0), &LOADED), Action::RotateModel(0.5));
        assert_eq!(g.touch_moved(2, v(60.0, 0.0), &EMPTY), None);
        assert_eq!(g.touch_ended(2), None);
        assert_eq!(g.touch_count(), 0);
    }

    #[test]
    fn pinch_needs_a_previous_distance() {
        let mut g = GestureController::default();
        g.touch_start(1, v(0.0, 0.0), &LOADED);
        assert_eq!(g.touch_start(2, v(100.0, 0.0), &LOADED), None);
        assert_eq!(g.touch_moved(2, v(200.0, 0.0), &LOADED), None);
        // Fingers spread by 100 px: zoom in by 1.
        assert_near(g.touch_moved(1, v(-100.0, 0.0), &LOADED), Action::Zoom(-1.0));
        assert_near(g.touch_moved(2, v(100.0, 0.0), &LOADED), Action::Zoom(1.0));

        g.touch_ended(2);
        g.touch_start(3, v(50.0, 0.0), &LOADED);
        assert_eq!(g.touch_moved(3, v(60.0, 0.0), &LOADED), None);
    }

    #[test]
    fn second_finger_does_not_start_stroke() {
        let mut g = GestureController::default();
        g.touch_start(1, v(10.0, 0.0), &LOADED);
        assert_eq!(g.touch_start(2, v(150.0, 0.0), &LOADED), None);
        assert!(!g.is_drawing());
    }

    #[test]
    fn unknown_touch_is_ignored() {
        let mut g = GestureController::default();
        assert_eq!(g.touch_moved(9, v(1.0, 1.0), &LOADED), None);
    }

    #[test]
    fn custom_speeds_apply() {
        let mut g = GestureController::new(GestureSettings {
            zoom_speed: 0.1,
            rotate_speed: 0.5,
        });
        assert_near(g.wheel(10.0), Action::Zoom(1.0));
        g.mouse_down(v(0.0, 0.0), &LOADED);
        assert_near(g.mouse_moved(v(2.0, 0.0), &LOADED), Action::RotateModel(1.0));
    }
}
