/// Single-line numeric input with a cursor
#[derive(Debug, Default)]
pub struct TextInputState {
    value: String,
    cursor: usize,
}

impl TextInputState {
    pub fn new(value: String) -> Self {
        let cursor = value.len();
        Self { value, cursor }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    #[cfg(test)]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Insert a character if it can be part of a number
    pub fn insert(&mut self, c: char) {
        if !(c.is_ascii_digit() || c == '-' || c == '.') {
            return;
        }
        self.value.insert(self.cursor, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.value.remove(self.cursor);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.value.len() {
            self.value.remove(self.cursor);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.value.len() {
            self.cursor += 1;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.value.len();
    }

    /// Parse the value as a percentage; empty input clears it
    pub fn percentage(&self) -> Result<Option<f64>, String> {
        let trimmed = self.value.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(Some(value)),
            _ => Err(format!("'{}' is not a number", trimmed)),
        }
    }

    /// Get the value with cursor indicator for display
    pub fn display_with_cursor(&self) -> String {
        let mut result = self.value.clone();
        if self.cursor <= result.len() {
            result.insert(self.cursor, '|');
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_input_filters_chars() {
        let mut input = TextInputState::new(String::new());
        for c in "9a5.x5".chars() {
            input.insert(c);
        }
        assert_eq!(input.value(), "95.5");
        assert_eq!(input.percentage(), Ok(Some(95.5)));
    }

    #[test]
    fn test_text_input_backspace() {
        let mut input = TextInputState::new("80".to_string());
        input.backspace();
        assert_eq!(input.value(), "8");
        input.move_home();
        input.backspace();
        assert_eq!(input.value(), "8");
        input.delete();
        assert_eq!(input.value(), "");
        assert_eq!(input.percentage(), Ok(None));
    }

    #[test]
    fn test_text_input_cursor_movement() {
        let mut input = TextInputState::new("12345".to_string());
        assert_eq!(input.cursor(), 5);
        input.move_left();
        assert_eq!(input.cursor(), 4);
        input.move_home();
        input.move_left();
        assert_eq!(input.cursor(), 0);
        input.move_right();
        assert_eq!(input.display_with_cursor(), "1|2345");
        input.move_end();
        assert_eq!(input.cursor(), 5);
    }

    #[test]
    fn test_malformed_number_rejected() {
        let input = TextInputState::new("1.2.3".to_string());
        assert!(input.percentage().is_err());
    }
}
