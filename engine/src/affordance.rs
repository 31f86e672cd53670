//! The floating row of objective buttons shown under a selection.

use polish_dom::{Document, DomError, NodeId, Rect, ScrollOffset};
use polish_types::{Objective, UiPreferences};

/// Vertical gap between the selection and the buttons, in CSS pixels.
pub const AFFORDANCE_OFFSET_PX: f64 = 10.0;

const HIDDEN_CLASS: &str = "hidden";

/// Document coordinates of the affordance's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub top: f64,
    pub left: f64,
}

/// Below-left of `rect`, never above or left of the scroll origin.
#[must_use]
pub fn position_below(rect: Rect, scroll: ScrollOffset) -> Position {
    Position {
        top: (scroll.y + rect.bottom + AFFORDANCE_OFFSET_PX).max(scroll.y),
        left: (scroll.x + rect.left).max(scroll.x),
    }
}

/// `div.polish-affordance` with one `button.polish-action` per objective.
#[derive(Debug, Clone)]
pub struct Affordance {
    root: NodeId,
    buttons: Vec<(Objective, NodeId)>,
    ui: UiPreferences,
    position: Position,
}

impl Affordance {
    /// Build the buttons, hidden, under `<body>`.
    pub fn mount(doc: &mut Document, ui: UiPreferences) -> Result<Self, DomError> {
        let root = doc.create_element("div");
        doc.set_attribute(root, "class", "polish-affordance");
        doc.add_class(root, HIDDEN_CLASS);

        let mut buttons = Vec::with_capacity(Objective::ALL.len());
        for objective in Objective::ALL {
            let button = doc.create_element("button");
            doc.set_attribute(button, "class", "polish-action");
            doc.set_attribute(button, "type", "button");
            doc.set_attribute(button, "data-objective", objective.as_str());
            doc.set_attribute(button, "aria-label", objective.label());
            doc.append_child(root, button)?;
            buttons.push((objective, button));
        }
        doc.append_child(doc.body(), root)?;

        let mut affordance = Self {
            root,
            buttons,
            ui,
            position: Position::default(),
        };
        affordance.render(doc);
        Ok(affordance)
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[must_use]
    pub fn position(&self) -> Position {
        self.position
    }

    #[must_use]
    pub fn preferences(&self) -> UiPreferences {
        self.ui
    }

    #[must_use]
    pub fn is_visible(&self, doc: &Document) -> bool {
        doc.is_connected(self.root) && !doc.has_class(self.root, HIDDEN_CLASS)
    }

    /// Re-render size and tooltips when the preferences differ.
    pub fn apply_preferences(&mut self, doc: &mut Document, ui: UiPreferences) {
        if self.ui == ui {
            return;
        }
        self.ui = ui;
        self.render(doc);
    }

    pub fn show_at(&mut self, doc: &mut Document, rect: Rect) {
        self.position = position_below(rect, doc.scroll());
        self.render(doc);
        doc.remove_class(self.root, HIDDEN_CLASS);
    }

    pub fn hide(&self, doc: &mut Document) {
        doc.add_class(self.root, HIDDEN_CLASS);
    }

    /// True when `node` is the affordance or inside it.
    #[must_use]
    pub fn contains(&self, doc: &Document, node: NodeId) -> bool {
        doc.contains(self.root, node)
    }

    /// Objective of the button containing `node`.
    #[must_use]
    pub fn objective_at(&self, doc: &Document, node: NodeId) -> Option<Objective> {
        self.buttons
            .iter()
            .find(|(_, button)| doc.contains(*button, node))
            .map(|(objective, _)| *objective)
    }

    fn render(&self, doc: &mut Document) {
        let size = self.ui.icon_size;
        doc.set_attribute(
            self.root,
            "style",
            format!(
                "--icon-size: {}px; --icon-padding: {}px; top: {}px; left: {}px",
                size.px(),
                size.padding(),
                self.position.top,
                self.position.left
            ),
        );
        for (objective, button) in &self.buttons {
            if self.ui.show_tooltips {
                doc.set_attribute(*button, "data-tooltip", objective.label());
            } else {
                doc.remove_attribute(*button, "data-tooltip");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polish_types::IconSize;

    #[test]
    fn position_is_below_left_of_selection() {
        let rect = Rect::new(40.0, 100.0, 80.0, 16.0);
        let scroll = ScrollOffset { x: 5.0, y: 200.0 };
        assert_eq!(
            position_below(rect, scroll),
            Position {
                top: 326.0,
                left: 45.0
            }
        );
    }

    #[test]
    fn position_is_clamped_to_scroll_origin() {
        let rect = Rect::new(-300.0, -400.0, 10.0, 10.0);
        let scroll = ScrollOffset { x: 20.0, y: 30.0 };
        assert_eq!(
            position_below(rect, scroll),
            Position {
                top: 30.0,
                left: 20.0
            }
        );
    }

    #[test]
    fn mounts_hidden_with_one_button_per_objective() {
        let mut doc = Document::new();
        let affordance = Affordance::mount(&mut doc, UiPreferences::default()).unwrap();
        assert!(!affordance.is_visible(&doc));
        let buttons = doc.children(affordance.root()).to_vec();
        assert_eq!(buttons.len(), 3);
        assert_eq!(doc.attribute(buttons[1], "data-objective"), Some("grammar"));
        assert_eq!(doc.attribute(buttons[1], "data-tooltip"), Some("Fix Grammar"));
        let style = doc.attribute(affordance.root(), "style").unwrap();
        assert!(style.contains("--icon-size: 28px"));
        assert!(style.contains("--icon-padding: 6px"));
    }

    #[test]
    fn show_and_hide_are_idempotent() {
        let mut doc = Document::new();
        let mut affordance = Affordance::mount(&mut doc, UiPreferences::default()).unwrap();
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        affordance.show_at(&mut doc, rect);
        affordance.show_at(&mut doc, rect);
        assert!(affordance.is_visible(&doc));
        affordance.hide(&mut doc);
        affordance.hide(&mut doc);
        assert!(!affordance.is_visible(&doc));
        assert_eq!(doc.attribute(affordance.root(), "class"), Some("polish-affordance hidden"));
    }

    #[test]
    fn preferences_control_size_and_tooltips() {
        let mut doc = Document::new();
        let mut affordance = Affordance::mount(&mut doc, UiPreferences::default()).unwrap();
        affordance.apply_preferences(
            &mut doc,
            UiPreferences {
                icon_size: IconSize::new(32).unwrap(),
                show_tooltips: false,
            },
        );
        let style = doc.attribute(affordance.root(), "style").unwrap();
        assert!(style.contains("--icon-size: 32px"));
        assert!(style.contains("--icon-padding: 7px"));
        for &button in doc.children(affordance.root()) {
            assert_eq!(doc.attribute(button, "data-tooltip"), None);
        }
    }

    #[test]
    fn objective_at_resolves_clicks_inside_buttons() {
        let mut doc = Document::new();
        let affordance = Affordance::mount(&mut doc, UiPreferences::default()).unwrap();
        let concise = doc.children(affordance.root())[2];
        let icon = doc.create_element("svg");
        doc.append_child(concise, icon).unwrap();
        assert_eq!(affordance.objective_at(&doc, icon), Some(Objective::Concise));
        assert_eq!(affordance.objective_at(&doc, affordance.root()), None);
        assert_eq!(affordance.objective_at(&doc, doc.body()), None);
    }
}
