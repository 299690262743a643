use std::sync::OnceLock;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct NotificationSettings {
    pub title: String,
    pub body: String,
}

#[derive(Deserialize, Debug)]
pub struct IntervalSettings {
    pub hours: String,
    pub minutes: String,
}

#[derive(Deserialize, Debug)]
pub struct AppSettings {
    pub notification: NotificationSettings,
    pub interval: IntervalSettings,
}

impl AppSettings {
    fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("notification.title", "Time to Stretch!")?
            .set_default("notification.body", "Take a break from the screen.")?
            .set_default("interval.hours", "00")?
            .set_default("interval.minutes", "30")?
            .add_source(File::with_name("appsettings").required(false))
            .add_source(File::with_name("appsettings.local").required(false))
            .add_source(Environment::with_prefix("APP"))
            .build()?;

        settings.try_deserialize()
    }
}

pub fn get() -> &'static AppSettings {
    static APPSETTINGS: OnceLock<AppSettings> = OnceLock::new();
    APPSETTINGS.get_or_init(|| AppSettings::new().expect("settings are well-formed"))
}
