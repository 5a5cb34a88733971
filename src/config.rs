use std::sync::LazyLock;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

static CONFIG: LazyLock<Config> = LazyLock::new(|| {
    let config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file("airsched.toml"))
        .merge(Env::prefixed("AIRSCHED_"))
        .extract::<Config>();
    match config {
        Ok(config) => config,
        Err(err) => {
            panic!("CONFIG ERROR: {err}");
        }
    }
});

#[derive(Serialize, Deserialize)]
pub struct Config {
    /// Extension of playable media picked up from event directories.
    pub media_ext: String,
    /// File name probed for at each enclosing directory level when building
    /// the cascading default payloads.
    pub default_name: String,
    /// Installed event filter, registered into generated daily schedules.
    pub event_filter: String,
    /// Installed yearly filter, registered as the weekly interval program.
    pub yearly_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            media_ext: "m2ts".to_string(),
            default_name: "Default.m2ts".to_string(),
            event_filter: "/usr/libexec/airsched/filters/update-event".to_string(),
            yearly_filter: "/usr/libexec/airsched/filters/update-yearly".to_string(),
        }
    }
}

pub fn get_config() -> &'static Config {
    &*CONFIG
}
