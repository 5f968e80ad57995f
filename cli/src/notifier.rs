use anyhow::Result;
use tracing::info;

use sunshine_core::sync::{Notifier, WeatherAlert};

/// Prints the alert to stderr.
#[cfg_attr(feature = "desktop-notifications", allow(dead_code))]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, alert: &WeatherAlert) -> Result<()> {
        eprintln!("{} {}: {}", alert.art().icon(), alert.title(), alert.text());
        info!(weather_id = alert.weather_id, "weather notification shown");
        Ok(())
    }
}

/// Desktop notification through the platform's notification service.
#[cfg(feature = "desktop-notifications")]
pub struct DesktopNotifier;

#[cfg(feature = "desktop-notifications")]
impl Notifier for DesktopNotifier {
    fn notify(&self, alert: &WeatherAlert) -> Result<()> {
        use anyhow::Context;
        use notify_rust::Notification;

        Notification::new()
            .summary(alert.title())
            .body(&alert.text())
            .appname("Sunshine")
            .show()
            .context("Failed to show desktop notification")?;
        info!(weather_id = alert.weather_id, "desktop notification sent");
        Ok(())
    }
}

pub fn default_notifier() -> Box<dyn Notifier> {
    #[cfg(feature = "desktop-notifications")]
    {
        Box::new(DesktopNotifier)
    }
    #[cfg(not(feature = "desktop-notifications"))]
    {
        Box::new(TerminalNotifier)
    }
}
