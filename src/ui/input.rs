use compact_str::CompactString;
use winit::event::{ElementState, MouseButton};
use winit::keyboard::{Key, NamedKey};

use crate::ui::frame::{Frame, Tile, TileKind};
use crate::ui::navigation::ViewMode;

/// Mouse state tracking.
#[derive(Debug, Default)]
pub struct MouseState {
    pub x: f32,
    pub y: f32,
}

/// Input action produced from raw input events.
#[derive(Debug, Clone, PartialEq)]
pub enum InputAction {
    /// Left click on a group (zoom in)
    SelectGroup(CompactString),
    /// Right click, mouse back or Escape with an empty search box
    Back,
    /// Typed text appended to the search box
    SearchInput(String),
    SearchBackspace,
    /// Escape while the search box has text
    ClearSearch,
    /// Tab: switch to the next grouping dimension
    CycleDimension,
    /// No action
    None,
}

/// Hit-test: find the deepest tile at the given point.
pub fn hit_test(frame: &Frame, x: f32, y: f32) -> Option<&Tile> {
    frame.hit_test(x, y)
}

/// Group key under the point in the overview. Clicking a member cell in the
/// grouped overview selects its enclosing group.
pub fn group_at(frame: &Frame, x: f32, y: f32) -> Option<CompactString> {
    if frame.view_mode != ViewMode::Overview {
        return None;
    }
    frame
        .tiles
        .iter()
        .rev()
        .filter(|t| t.rect.contains(x, y))
        .find_map(|t| match &t.kind {
            TileKind::Group { key, .. } => Some(key.clone()),
            TileKind::Instrument { .. } => None,
        })
}

/// Process a mouse button event.
pub fn process_mouse_button(
    button: MouseButton,
    state: ElementState,
    mouse: &MouseState,
    frame: &Frame,
) -> InputAction {
    if state != ElementState::Pressed {
        return InputAction::None;
    }

    match button {
        MouseButton::Left => match group_at(frame, mouse.x, mouse.y) {
            Some(key) => InputAction::SelectGroup(key),
            None => InputAction::None,
        },
        MouseButton::Back | MouseButton::Right => InputAction::Back,
        _ => InputAction::None,
    }
}

/// Process a keyboard event. `search_has_text` decides whether Escape
/// clears the search box or navigates back.
pub fn process_key(key: &Key, state: ElementState, search_has_text: bool) -> InputAction {
    if state != ElementState::Pressed {
        return InputAction::None;
    }

    match key {
        Key::Named(NamedKey::Escape) if search_has_text => InputAction::ClearSearch,
        Key::Named(NamedKey::Escape) | Key::Named(NamedKey::BrowserBack) => InputAction::Back,
        Key::Named(NamedKey::Backspace) => InputAction::SearchBackspace,
        Key::Named(NamedKey::Tab) => InputAction::CycleDimension,
        Key::Named(NamedKey::Space) => InputAction::SearchInput(" ".to_string()),
        Key::Character(text) if text.chars().all(|c| !c.is_control()) => {
            InputAction::SearchInput(text.to_string())
        }
        _ => InputAction::None,
    }
}
