/// Environment-backed configuration loading.
///
/// Service config structs derive `serde::Deserialize`, implement this trait,
/// and load themselves once at startup with `from_env()`.
///
/// # Panics
///
/// `from_env` panics when a required variable is missing or malformed; a
/// service with broken configuration should not come up at all.
pub trait Config: Sized + serde::de::DeserializeOwned {
    fn from_env() -> Self {
        match envy::from_env() {
            Ok(config) => config,
            Err(err) => panic!("invalid service configuration: {err}"),
        }
    }
}
