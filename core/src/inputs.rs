use cadtris_signals::{InputId, InputValue};
use std::collections::HashMap;

/// Current values of the command's input controls, kept in sync through the
/// input-changed hook.
#[derive(Debug, Clone)]
pub struct InputsWindow {
    values: HashMap<InputId, InputValue>,
}

impl InputsWindow {
    pub fn new(grid_size: u32) -> Self {
        let mut values = HashMap::new();
        values.insert(InputId::Button1, InputValue::Bool(false));
        values.insert(InputId::KeepBodies, InputValue::Bool(false));
        values.insert(InputId::GridSize, InputValue::Integer(grid_size as i64));
        Self { values }
    }

    /// Record a new value, returning the previous one.
    pub fn set(&mut self, id: InputId, value: InputValue) -> Option<InputValue> {
        self.values.insert(id, value)
    }

    pub fn get(&self, id: InputId) -> Option<&InputValue> {
        self.values.get(&id)
    }

    pub fn keep_bodies(&self) -> bool {
        self.get(InputId::KeepBodies)
            .and_then(InputValue::as_bool)
            .unwrap_or(false)
    }

    pub fn grid_size(&self) -> Option<u32> {
        self.get(InputId::GridSize)
            .and_then(InputValue::as_integer)
            .and_then(|v| u32::try_from(v).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let inputs = InputsWindow::new(3);
        assert!(!inputs.keep_bodies());
        assert_eq!(inputs.grid_size(), Some(3));
        assert_eq!(inputs.get(InputId::Button1), Some(&InputValue::Bool(false)));
    }

    #[test]
    fn test_set_returns_previous() {
        let mut inputs = InputsWindow::new(1);
        let previous = inputs.set(InputId::KeepBodies, InputValue::Bool(true));
        assert_eq!(previous, Some(InputValue::Bool(false)));
        assert!(inputs.keep_bodies());
    }

    #[test]
    fn test_negative_grid_size_is_none() {
        let mut inputs = InputsWindow::new(1);
        inputs.set(InputId::GridSize, InputValue::Integer(-2));
        assert_eq!(inputs.grid_size(), None);
    }
}
