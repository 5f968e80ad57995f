use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;
use std::sync::mpsc::{self, Receiver, Sender};

use tracing::debug;

use crate::error::StoreError;

const FORECAST_PATH: &str = "weather";

/// Addressable part of the forecast store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// The whole forecast table.
    Forecast,
    /// A single normalized day.
    ForecastDay(i64),
}

impl Resource {
    /// Whether a subscriber to `self` should hear about a change to `changed`.
    #[must_use]
    pub fn covers(self, changed: Resource) -> bool {
        match (self, changed) {
            (Resource::Forecast, _) | (_, Resource::Forecast) => true,
            (Resource::ForecastDay(a), Resource::ForecastDay(b)) => a == b,
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Forecast => f.write_str(FORECAST_PATH),
            Resource::ForecastDay(date) => write!(f, "{FORECAST_PATH}/{date}"),
        }
    }
}

impl FromStr for Resource {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || StoreError::UnknownResource(s.to_string());
        let mut parts = s.trim_matches('/').split('/');
        if parts.next() != Some(FORECAST_PATH) {
            return Err(unknown());
        }
        match (parts.next(), parts.next()) {
            (None, _) => Ok(Resource::Forecast),
            (Some(date), None) => date
                .parse::<i64>()
                .map(Resource::ForecastDay)
                .map_err(|_| unknown()),
            _ => Err(unknown()),
        }
    }
}

/// Fan-out of "data at this resource changed" messages.
///
/// Delivery is best effort: subscribers whose receiver has been dropped are
/// pruned on the next notification.
#[derive(Debug, Default)]
pub struct ChangeBus {
    subscribers: Mutex<Vec<(Resource, Sender<Resource>)>>,
}

impl ChangeBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, resource: Resource) -> Receiver<Resource> {
        let (tx, rx) = mpsc::channel();
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.push((resource, tx));
        }
        rx
    }

    pub fn notify(&self, changed: Resource) {
        let Ok(mut subs) = self.subscribers.lock() else {
            return;
        };
        subs.retain(|(resource, tx)| !resource.covers(changed) || tx.send(changed).is_ok());
        debug!(%changed, subscribers = subs.len(), "change notified");
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().map_or(0, |subs| subs.len())
    }
}
