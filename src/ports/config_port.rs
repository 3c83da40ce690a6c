//! Configuration access port trait.

use std::collections::BTreeMap;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// Every key with a value in `section`; empty when the section is absent.
    fn get_section(&self, section: &str) -> BTreeMap<String, String>;
}
