//! Screen implementations. Each screen is a top-level Component.

mod dashboard;
mod devices;
mod influx;
mod scan_classes;
mod setup;
mod tags;
mod telegraf;

pub use dashboard::DashboardScreen;
pub use devices::DevicesScreen;
pub use influx::InfluxScreen;
pub use scan_classes::ScanClassesScreen;
pub use setup::SetupScreen;
pub use tags::TagsScreen;
pub use telegraf::TelegrafScreen;

use crate::component::Component;
use crate::screen::ScreenId;

/// Create every screen, including the setup wizard.
pub fn create_screens() -> Vec<(ScreenId, Box<dyn Component>)> {
    vec![
        (ScreenId::Dashboard, Box::new(DashboardScreen::new())),
        (ScreenId::Devices, Box::new(DevicesScreen::new())),
        (ScreenId::Tags, Box::new(TagsScreen::new())),
        (ScreenId::ScanClasses, Box::new(ScanClassesScreen::new())),
        (ScreenId::Influx, Box::new(InfluxScreen::new())),
        (ScreenId::Telegraf, Box::new(TelegrafScreen::new())),
        (ScreenId::Setup, Box::new(SetupScreen::new())),
    ]
}
