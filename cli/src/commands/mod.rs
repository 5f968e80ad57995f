mod forecast;
mod helpers;
mod location;
mod settings;
mod sync;

pub(crate) use forecast::{cmd_forecast, cmd_show};
pub(crate) use location::{
    cmd_location_coords, cmd_location_reset, cmd_location_set, cmd_location_show,
};
pub(crate) use settings::{cmd_settings_notifications, cmd_settings_show, cmd_settings_units};
pub(crate) use sync::{cmd_daemon, cmd_jobs, cmd_sync};
