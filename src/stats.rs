use crate::core::ReadError;

/// Lifetime counters of one reader.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Statistics {
    success_count: u32,
    error_count: u32,
    error_code: Option<ReadError>,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, result: &Result<f32, ReadError>) {
        match result {
            Ok(_) => self.success_count = self.success_count.wrapping_add(1),
            Err(err) => {
                self.error_code = Some(*err);
                self.error_count = self.error_count.wrapping_add(1);
            }
        }
    }

    /// Last error, `None` if no error occurred since the last clear.
    pub fn error_code(&mut self, clear: bool) -> Option<ReadError> {
        let code = self.error_code;
        if clear {
            self.clear_error_code();
        }
        code
    }

    pub fn error_code_raw(&mut self, clear: bool) -> u16 {
        self.error_code(clear).map_or(0, |err| err.code())
    }

    pub fn error_count(&mut self, clear: bool) -> u32 {
        let count = self.error_count;
        if clear {
            self.clear_error_count();
        }
        count
    }

    pub fn success_count(&mut self, clear: bool) -> u32 {
        let count = self.success_count;
        if clear {
            self.clear_success_count();
        }
        count
    }

    pub fn clear_error_code(&mut self) {
        self.error_code = None;
    }

    pub fn clear_error_count(&mut self) {
        self.error_count = 0;
    }

    pub fn clear_success_count(&mut self) {
        self.success_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_survives_success() {
        let mut stats = Statistics::new();
        stats.record(&Err(ReadError::Timeout));
        stats.record(&Ok(1.0));

        assert_eq!(stats.error_code(false), Some(ReadError::Timeout));
        assert_eq!(stats.error_count(false), 1);
        assert_eq!(stats.success_count(false), 1);
    }

    #[test]
    fn test_raw_code_clears() {
        let mut stats = Statistics::new();
        stats.record(&Err(ReadError::CrcError));

        assert_eq!(stats.error_code_raw(true), 1);
        assert_eq!(stats.error_code_raw(false), 0);
        // count is independent of the code
        assert_eq!(stats.error_count(false), 1);
    }
}
