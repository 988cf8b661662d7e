/// Checked by [`super::ConfigManager`] before a config is accepted or written.
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}
