//! Configuration access port trait.
//!
//! Settings are addressed by INI `section` and `key`. Getters with a default
//! fall back to it when the key is absent or does not parse.

use crate::domain::error::TraderError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;

    /// Count or period setting; negative values are rejected.
    fn get_usize(&self, section: &str, key: &str, default: usize) -> Result<usize, TraderError> {
        let value = self.get_int(section, key, default as i64);
        usize::try_from(value).map_err(|_| TraderError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("{key} must be non-negative"),
        })
    }
}
