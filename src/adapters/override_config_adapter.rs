//! Layers command-line values over another `ConfigPort`.
//!
//! Overridden keys are seen by validation exactly as if they were in the
//! file, so `--fast 0` fails the same way `fast_window = 0` does.

use crate::ports::config_port::ConfigPort;
use std::collections::HashMap;

pub struct OverrideConfigAdapter<'a> {
    base: &'a dyn ConfigPort,
    overrides: HashMap<(String, String), String>,
}

impl<'a> OverrideConfigAdapter<'a> {
    pub fn new(base: &'a dyn ConfigPort) -> Self {
        Self {
            base,
            overrides: HashMap::new(),
        }
    }

    /// Sets `[section] key` when `value` is present; `None` leaves the base
    /// value visible.
    pub fn with(mut self, section: &str, key: &str, value: Option<impl ToString>) -> Self {
        if let Some(value) = value {
            self.overrides
                .insert((section.to_string(), key.to_string()), value.to_string());
        }
        self
    }

    fn lookup(&self, section: &str, key: &str) -> Option<&String> {
        self.overrides.get(&(section.to_string(), key.to_string()))
    }
}

impl ConfigPort for OverrideConfigAdapter<'_> {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.lookup(section, key)
            .cloned()
            .or_else(|| self.base.get_string(section, key))
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        match self.lookup(section, key) {
            Some(v) => v.trim().parse().unwrap_or(default),
            None => self.base.get_int(section, key, default),
        }
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        match self.lookup(section, key) {
            Some(v) => v.trim().parse().unwrap_or(default),
            None => self.base.get_double(section, key, default),
        }
    }
}
