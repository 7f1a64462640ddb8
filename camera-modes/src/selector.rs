use crate::mode::{DEFAULT_MODE, ModeParams, ModeRegistry};
use std::sync::{Arc, Mutex, PoisonError};

/// What the user has picked: the mode name plus its slider values.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub mode: String,
    pub params: ModeParams,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            mode: DEFAULT_MODE.to_string(),
            params: ModeParams::new(),
        }
    }
}

/// Shared handle to the current [`Selection`].
///
/// Clones point at the same selection. Writers replace it whenever the user
/// changes something; frame callbacks take a [`snapshot`](Self::snapshot) at
/// the start of each frame and may see the change one frame late.
#[derive(Debug, Clone, Default)]
pub struct ModeSelector {
    inner: Arc<Mutex<Selection>>,
}

impl ModeSelector {
    pub fn new(selection: Selection) -> Self {
        Self {
            inner: Arc::new(Mutex::new(selection)),
        }
    }

    pub fn snapshot(&self) -> Selection {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn mode(&self) -> String {
        self.snapshot().mode
    }

    /// Switches to `name` when the registry knows it, storing the canonical
    /// display name. Returns whether the selection changed.
    pub fn select(&self, registry: &ModeRegistry, name: &str) -> bool {
        let Some(mode) = registry.get(name) else {
            return false;
        };

        let mut selection = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if selection.mode == mode.name {
            return false;
        }

        selection.mode = mode.name.to_string();
        true
    }

    pub fn set_param(&self, key: &str, value: f32) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .params
            .set(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_select_stores_canonical_name() {
        let registry = ModeRegistry::builtin();
        let selector = ModeSelector::default();

        assert!(selector.select(&registry, "black & white"));
        assert_eq!(selector.mode(), "Black & White");
        assert!(!selector.select(&registry, "Black & White"));
    }

    #[test]
    fn test_select_unknown_keeps_current() {
        let registry = ModeRegistry::builtin();
        let selector = ModeSelector::default();

        assert!(!selector.select(&registry, "Infrared"));
        assert_eq!(selector.mode(), DEFAULT_MODE);
    }

    #[test]
    fn test_alias_of_current_is_no_change() {
        let registry = ModeRegistry::builtin();
        let selector = ModeSelector::default();
        assert!(!selector.select(&registry, "Auto"));
    }

    #[test]
    fn test_clones_share_selection() {
        let registry = ModeRegistry::builtin();
        let selector = ModeSelector::default();
        let reader = selector.clone();

        let handle = thread::spawn(move || {
            selector.select(&registry, "Sepia");
            selector.set_param("red_gain", 1.25);
        });
        handle.join().unwrap();

        let snapshot = reader.snapshot();
        assert_eq!(snapshot.mode, "Sepia");
        assert_eq!(snapshot.params.get("red_gain"), Some(1.25));
    }
}
