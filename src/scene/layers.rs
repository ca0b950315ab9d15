/// Layer visibility coordinator
///
/// The selectable list only ever contains layers that have backing data.
/// Selection membership drives visibility of the Log and Tag layers; the
/// base image is always drawn and never appears in the list.

use std::collections::BTreeSet;
use std::fmt;

use super::surface::RenderSurface;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LayerKind {
    Base,
    Log,
    Tag,
}

impl LayerKind {
    pub fn name(&self) -> &'static str {
        match self {
            LayerKind::Base => "Base",
            LayerKind::Log => "Log",
            LayerKind::Tag => "Tag",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A layer whose visual items can be shown or hidden as a group
pub trait LayerTarget {
    fn set_layer_visible(&mut self, visible: bool, surface: &mut dyn RenderSurface);
}

#[derive(Debug, Clone, Default)]
pub struct LayerCoordinator {
    available: Vec<LayerKind>,
    selected: BTreeSet<LayerKind>,
}

impl LayerCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Layers shown in the list, in z order
    pub fn available(&self) -> &[LayerKind] {
        &self.available
    }

    pub fn is_available(&self, kind: LayerKind) -> bool {
        self.available.contains(&kind)
    }

    pub fn is_selected(&self, kind: LayerKind) -> bool {
        self.selected.contains(&kind)
    }

    pub fn selected(&self) -> impl Iterator<Item = LayerKind> + '_ {
        self.selected.iter().copied()
    }

    /// Rebuild the list from what actually has data. A Tag layer that
    /// appears starts selected so freshly drawn tags stay visible; a Log
    /// layer starts unselected, matching its hidden initial state.
    pub fn refresh(&mut self, log_present: bool, tags_present: bool) {
        if tags_present && !self.is_available(LayerKind::Tag) {
            self.selected.insert(LayerKind::Tag);
        }
        if !log_present {
            self.selected.remove(&LayerKind::Log);
        }
        if !tags_present {
            self.selected.remove(&LayerKind::Tag);
        }
        self.available.clear();
        if log_present {
            self.available.push(LayerKind::Log);
        }
        if tags_present {
            self.available.push(LayerKind::Tag);
        }
    }

    /// Replace the whole selection (multi-select list change)
    pub fn set_selection(&mut self, kinds: impl IntoIterator<Item = LayerKind>) {
        self.selected = kinds
            .into_iter()
            .filter(|k| self.available.contains(k))
            .collect();
    }

    pub fn set_selected(&mut self, kind: LayerKind, selected: bool) {
        if selected && self.is_available(kind) {
            self.selected.insert(kind);
        } else {
            self.selected.remove(&kind);
        }
    }

    pub fn toggle(&mut self, kind: LayerKind) {
        let now = !self.is_selected(kind);
        self.set_selected(kind, now);
    }

    /// Push the selection down onto the visual items
    pub fn apply(
        &self,
        log: &mut dyn LayerTarget,
        tags: &mut dyn LayerTarget,
        surface: &mut dyn RenderSurface,
    ) {
        if self.is_available(LayerKind::Log) {
            log.set_layer_visible(self.is_selected(LayerKind::Log), surface);
        }
        if self.is_available(LayerKind::Tag) {
            tags.set_layer_visible(self.is_selected(LayerKind::Tag), surface);
        }
    }

    pub fn clear(&mut self) {
        self.available.clear();
        self.selected.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::surface::Scene;

    #[derive(Default)]
    struct Probe {
        calls: Vec<bool>,
    }

    impl LayerTarget for Probe {
        fn set_layer_visible(&mut self, visible: bool, _surface: &mut dyn RenderSurface) {
            self.calls.push(visible);
        }
    }

    #[test]
    fn test_absent_layers_are_not_listed_or_toggled() {
        let mut layers = LayerCoordinator::new();
        layers.refresh(false, false);
        assert!(layers.available().is_empty());
        layers.set_selection([LayerKind::Log, LayerKind::Tag]);
        assert_eq!(layers.selected().count(), 0);

        let (mut log, mut tags, mut scene) = (Probe::default(), Probe::default(), Scene::new());
        layers.apply(&mut log, &mut tags, &mut scene);
        assert!(log.calls.is_empty() && tags.calls.is_empty());
    }

    #[test]
    fn test_new_layers_default_selection() {
        let mut layers = LayerCoordinator::new();
        layers.refresh(true, true);
        assert_eq!(layers.available(), &[LayerKind::Log, LayerKind::Tag]);
        assert!(!layers.is_selected(LayerKind::Log));
        assert!(layers.is_selected(LayerKind::Tag));

        // A later refresh must not re-select a Tag layer the user hid
        layers.set_selected(LayerKind::Tag, false);
        layers.refresh(true, true);
        assert!(!layers.is_selected(LayerKind::Tag));
    }

    #[test]
    fn test_apply_follows_membership() {
        let mut layers = LayerCoordinator::new();
        layers.refresh(true, true);
        layers.set_selection([LayerKind::Log]);
        let (mut log, mut tags, mut scene) = (Probe::default(), Probe::default(), Scene::new());
        layers.apply(&mut log, &mut tags, &mut scene);
        assert_eq!(log.calls, vec![true]);
        assert_eq!(tags.calls, vec![false]);

        layers.toggle(LayerKind::Tag);
        layers.apply(&mut log, &mut tags, &mut scene);
        assert_eq!(tags.calls, vec![false, true]);
    }

    #[test]
    fn test_layer_disappears_with_its_data() {
        let mut layers = LayerCoordinator::new();
        layers.refresh(true, false);
        layers.set_selected(LayerKind::Log, true);
        layers.refresh(false, false);
        assert!(!layers.is_available(LayerKind::Log));
        assert!(!layers.is_selected(LayerKind::Log));
    }
}
