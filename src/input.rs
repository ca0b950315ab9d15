/// Input routing
///
/// Pointer and keyboard events arrive here in viewport coordinates and are
/// dispatched to whichever engine owns the current interaction mode. The
/// router owns the mode; engines never intercept each other's events.

use crate::geometry::Point;
use crate::scene::surface::RenderSurface;
use crate::scene::view::ViewController;
use crate::tagging::{TagEngine, TagEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    #[default]
    Idle,
    /// The tag engine owns the pointer (draw, move or resize gesture)
    Drawing,
    /// A level slider is being dragged; canvas pointer input is ignored
    Adjusting,
    Panning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Escape,
    Delete,
    DrawTag,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Press { pos: Point, button: PointerButton },
    Move { pos: Point },
    Release { pos: Point, button: PointerButton },
    /// Scroll delta in viewport pixels; zooms only with the modifier held
    Wheel { dx: f64, dy: f64, pos: Point, zoom_modifier: bool },
    Key(KeyInput),
}

/// What the viewer has to follow up on after routing
#[derive(Debug, Clone, PartialEq)]
pub enum Routed {
    Nothing,
    Tag(TagEvent),
    ViewChanged,
    DeleteRequested,
    DrawRequested,
}

#[derive(Debug, Clone, Default)]
pub struct InputRouter {
    mode: InteractionMode,
    last_pan: Option<Point>,
}

impl InputRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn begin_adjusting(&mut self) {
        self.mode = InteractionMode::Adjusting;
        self.last_pan = None;
    }

    /// Returns true if an adjustment drag was actually in progress
    pub fn end_adjusting(&mut self) -> bool {
        let was = self.mode == InteractionMode::Adjusting;
        if was {
            self.mode = InteractionMode::Idle;
        }
        was
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn dispatch(
        &mut self,
        event: InputEvent,
        tags: &mut TagEngine,
        view: &mut ViewController,
        surface: &mut dyn RenderSurface,
    ) -> Routed {
        if self.mode == InteractionMode::Adjusting {
            return Routed::Nothing;
        }
        match event {
            InputEvent::Press { pos, button } => self.press(pos, button, tags, view, surface),
            InputEvent::Move { pos } => match self.mode {
                InteractionMode::Drawing => {
                    tags.move_to(view.transform().to_scene(pos), surface);
                    Routed::Nothing
                }
                InteractionMode::Panning => {
                    let Some(last) = self.last_pan.replace(pos) else {
                        return Routed::Nothing;
                    };
                    let (dx, dy) = pos.delta_from(last);
                    view.pan(dx, dy);
                    Routed::ViewChanged
                }
                InteractionMode::Idle | InteractionMode::Adjusting => Routed::Nothing,
            },
            InputEvent::Release { pos, .. } => match self.mode {
                InteractionMode::Drawing => {
                    self.mode = InteractionMode::Idle;
                    Routed::Tag(tags.release(view.transform().to_scene(pos), surface))
                }
                InteractionMode::Panning => {
                    self.mode = InteractionMode::Idle;
                    self.last_pan = None;
                    Routed::Nothing
                }
                InteractionMode::Idle | InteractionMode::Adjusting => Routed::Nothing,
            },
            InputEvent::Wheel {
                dx,
                dy,
                pos,
                zoom_modifier,
            } => {
                if view.wheel_zoom(dy, pos, zoom_modifier) {
                    return Routed::ViewChanged;
                }
                if zoom_modifier || (dx == 0.0 && dy == 0.0) {
                    return Routed::Nothing;
                }
                view.pan(dx, dy);
                Routed::ViewChanged
            }
            InputEvent::Key(KeyInput::Escape) => {
                if self.mode == InteractionMode::Panning {
                    self.last_pan = None;
                }
                self.mode = InteractionMode::Idle;
                Routed::Tag(tags.cancel(surface))
            }
            InputEvent::Key(KeyInput::Delete) => Routed::DeleteRequested,
            InputEvent::Key(KeyInput::DrawTag) => Routed::DrawRequested,
        }
    }

    fn press(
        &mut self,
        pos: Point,
        button: PointerButton,
        tags: &mut TagEngine,
        view: &mut ViewController,
        surface: &mut dyn RenderSurface,
    ) -> Routed {
        if self.mode != InteractionMode::Idle {
            return Routed::Nothing;
        }
        if button == PointerButton::Primary && tags.press(view.transform().to_scene(pos), surface) {
            self.mode = InteractionMode::Drawing;
            log::debug!("Input mode: Drawing");
        } else {
            self.mode = InteractionMode::Panning;
            self.last_pan = Some(pos);
            log::debug!("Input mode: Panning");
        }
        Routed::Nothing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::scene::surface::Scene;

    struct Rig {
        router: InputRouter,
        tags: TagEngine,
        view: ViewController,
        scene: Scene,
    }

    impl Rig {
        /// 2× zoom, scene origin at the viewport origin
        fn new() -> Self {
            let mut view = ViewController::new();
            view.set_viewport(400.0, 300.0);
            view.set_content(Some(Rect::new(0.0, 0.0, 200.0, 150.0)));
            Self {
                router: InputRouter::new(),
                tags: TagEngine::new(),
                view,
                scene: Scene::new(),
            }
        }

        fn send(&mut self, event: InputEvent) -> Routed {
            self.router
                .dispatch(event, &mut self.tags, &mut self.view, &mut self.scene)
        }
    }

    fn primary(x: f64, y: f64) -> InputEvent {
        InputEvent::Press {
            pos: Point::new(x, y),
            button: PointerButton::Primary,
        }
    }

    fn release(x: f64, y: f64) -> InputEvent {
        InputEvent::Release {
            pos: Point::new(x, y),
            button: PointerButton::Primary,
        }
    }

    #[test]
    fn test_draw_gesture_goes_to_tag_engine_in_scene_space() {
        let mut rig = Rig::new();
        assert_eq!(rig.view.scale(), 2.0);
        rig.tags.start_drawing(&mut rig.scene);

        rig.send(primary(20.0, 20.0));
        assert_eq!(rig.router.mode(), InteractionMode::Drawing);
        rig.send(InputEvent::Move { pos: Point::new(80.0, 50.0) });
        let routed = rig.send(release(120.0, 80.0));
        assert_eq!(routed, Routed::Tag(TagEvent::Created(1)));
        assert_eq!(rig.tags.get(1).unwrap().bounds, Rect::new(10.0, 10.0, 50.0, 30.0));
        assert_eq!(rig.router.mode(), InteractionMode::Idle);
    }

    #[test]
    fn test_press_on_empty_space_pans() {
        let mut rig = Rig::new();
        rig.send(primary(100.0, 100.0));
        assert_eq!(rig.router.mode(), InteractionMode::Panning);
        let before = rig.view.transform().offset;
        assert_eq!(
            rig.send(InputEvent::Move { pos: Point::new(130.0, 90.0) }),
            Routed::ViewChanged
        );
        let after = rig.view.transform().offset;
        assert_eq!((after.x - before.x, after.y - before.y), (30.0, -10.0));
        rig.send(release(130.0, 90.0));
        assert_eq!(rig.router.mode(), InteractionMode::Idle);
    }

    #[test]
    fn test_middle_button_pans_even_over_tags() {
        let mut rig = Rig::new();
        rig.tags.start_drawing(&mut rig.scene);
        rig.send(primary(0.0, 0.0));
        rig.send(release(100.0, 100.0));

        rig.send(InputEvent::Press {
            pos: Point::new(50.0, 50.0),
            button: PointerButton::Middle,
        });
        assert_eq!(rig.router.mode(), InteractionMode::Panning);
        assert_eq!(rig.tags.selected_id(), None);
    }

    #[test]
    fn test_adjusting_blocks_pointer_input() {
        let mut rig = Rig::new();
        rig.router.begin_adjusting();
        rig.tags.start_drawing(&mut rig.scene);
        assert_eq!(rig.send(primary(10.0, 10.0)), Routed::Nothing);
        assert!(rig.scene.is_empty());
        assert!(rig.router.end_adjusting());
        assert!(!rig.router.end_adjusting());
    }

    #[test]
    fn test_wheel_zooms_only_with_modifier() {
        let mut rig = Rig::new();
        let scale = rig.view.scale();
        let routed = rig.send(InputEvent::Wheel {
            dx: 0.0,
            dy: 40.0,
            pos: Point::new(10.0, 10.0),
            zoom_modifier: false,
        });
        assert_eq!(routed, Routed::ViewChanged);
        assert_eq!(rig.view.scale(), scale);

        rig.send(InputEvent::Wheel {
            dx: 0.0,
            dy: 40.0,
            pos: Point::new(10.0, 10.0),
            zoom_modifier: true,
        });
        assert!(rig.view.scale() > scale);
    }

    #[test]
    fn test_escape_cancels_and_keys_forward() {
        let mut rig = Rig::new();
        rig.tags.start_drawing(&mut rig.scene);
        rig.send(primary(20.0, 20.0));
        assert_eq!(
            rig.send(InputEvent::Key(KeyInput::Escape)),
            Routed::Tag(TagEvent::Cancelled)
        );
        assert_eq!(rig.router.mode(), InteractionMode::Idle);
        assert!(rig.scene.is_empty());
        assert_eq!(rig.send(InputEvent::Key(KeyInput::Delete)), Routed::DeleteRequested);
        assert_eq!(rig.send(InputEvent::Key(KeyInput::DrawTag)), Routed::DrawRequested);
    }
}
