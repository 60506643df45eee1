//! Configuration access port.

/// Typed reads over a sectioned key/value configuration source.
/// Missing or unparsable values fall back to the caller's default.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;
}
