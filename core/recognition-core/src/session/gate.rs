//! Detection gate: whether a successful detection may trigger navigation.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DetectionGate {
    should_recognize_objects: bool,
}

impl DetectionGate {
    /// A gate starts closed.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.should_recognize_objects
    }

    /// Flips the gate when `available`; returns the new value, or `None` if ignored.
    pub fn toggle(&mut self, available: bool) -> Option<bool> {
        if !available {
            return None;
        }
        self.should_recognize_objects = !self.should_recognize_objects;
        Some(self.should_recognize_objects)
    }

    /// Closes the gate; returns whether it was open.
    pub fn close(&mut self) -> bool {
        std::mem::replace(&mut self.should_recognize_objects, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_closed() {
        assert!(!DetectionGate::new().is_open());
    }

    #[test]
    fn toggle_ignored_while_unavailable() {
        let mut gate = DetectionGate::new();
        assert_eq!(gate.toggle(false), None);
        assert!(!gate.is_open());
    }

    #[test]
    fn toggle_flips_while_available() {
        let mut gate = DetectionGate::new();
        assert_eq!(gate.toggle(true), Some(true));
        assert_eq!(gate.toggle(true), Some(false));
        assert!(!gate.is_open());
    }

    #[test]
    fn close_reports_previous_value() {
        let mut gate = DetectionGate::new();
        assert!(!gate.close());
        gate.toggle(true);
        assert!(gate.close());
        assert!(!gate.is_open());
    }
}
