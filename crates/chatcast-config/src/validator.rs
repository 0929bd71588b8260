//! Configuration validation.

use crate::schema::Config;

const STAGGER_WARN_MS: u64 = 5000;

#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();
        Self::validate_browser(config, &mut result);
        Self::validate_batch(config, &mut result);
        Self::validate_timeouts(config, &mut result);
        Self::validate_capture(config, &mut result);
        Self::validate_storage(config, &mut result);
        result
    }

    fn validate_browser(config: &Config, result: &mut ValidationResult) {
        if config.browser.debug_port == 0 {
            result.add_error(ValidationError::new("browser.debug_port", "Port cannot be 0"));
        }
        if let Some(endpoint) = &config.browser.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                result.add_error(ValidationError::new(
                    "browser.endpoint",
                    "Endpoint must start with http:// or https://",
                ));
            }
        }
    }

    fn validate_batch(config: &Config, result: &mut ValidationResult) {
        if config.batch.stagger_ms > STAGGER_WARN_MS {
            result.add_warning(ValidationWarning::new(
                "batch.stagger_ms",
                "stagger is above 5 seconds, broadcasts to many sites will be slow",
            ));
        }
    }

    fn validate_timeouts(config: &Config, result: &mut ValidationResult) {
        if config.timeouts.reply_ms == 0 {
            result.add_error(ValidationError::new(
                "timeouts.reply_ms",
                "reply_ms must be greater than 0",
            ));
        }
        if config.timeouts.inject_ms < config.timeouts.reply_ms {
            result.add_warning(ValidationWarning::new(
                "timeouts.inject_ms",
                "inject_ms is shorter than reply_ms, step lists will often time out",
            ));
        }
        if config.timeouts.bridge_ms == 0 {
            result.add_warning(ValidationWarning::new(
                "timeouts.bridge_ms",
                "bridge_ms is 0, the Quill bridge will always be skipped",
            ));
        }
    }

    fn validate_capture(config: &Config, result: &mut ValidationResult) {
        let delays = &config.capture.delays_ms;
        if delays.is_empty() {
            result.add_error(ValidationError::new(
                "capture.delays_ms",
                "at least one capture delay is required",
            ));
        } else if delays.windows(2).any(|w| w[0] > w[1]) {
            result.add_warning(ValidationWarning::new(
                "capture.delays_ms",
                "capture delays are not sorted; later rounds may report before earlier ones",
            ));
        }
        if config.capture.collect_ms == 0 {
            result.add_warning(ValidationWarning::new(
                "capture.collect_ms",
                "collect_ms is 0, no frame will have time to answer",
            ));
        }
    }

    fn validate_storage(config: &Config, result: &mut ValidationResult) {
        if config.storage.data_dir.trim().is_empty() {
            result.add_error(ValidationError::new(
                "storage.data_dir",
                "data_dir cannot be empty",
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
