//! Screen trait and screen identifier enum.

use std::fmt;

/// Identifies each primary TUI screen, navigable by number keys 1-6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScreenId {
    #[default]
    Dashboard, // 1
    Devices,     // 2
    Tags,        // 3
    ScanClasses, // 4
    Influx,      // 5
    Telegraf,    // 6
    /// First-run wizard — not in the tab bar, not navigable by number keys.
    Setup,
}

impl ScreenId {
    /// All screens in tab-bar order.
    pub const ALL: [ScreenId; 6] = [
        Self::Dashboard,
        Self::Devices,
        Self::Tags,
        Self::ScanClasses,
        Self::Influx,
        Self::Telegraf,
    ];

    /// Numeric key (1-6) for this screen. Setup has no number key.
    pub fn number(self) -> u8 {
        match self {
            Self::Dashboard => 1,
            Self::Devices => 2,
            Self::Tags => 3,
            Self::ScanClasses => 4,
            Self::Influx => 5,
            Self::Telegraf => 6,
            Self::Setup => 0,
        }
    }

    /// Screen from a numeric key (1-6). Returns None for out-of-range.
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::Dashboard),
            2 => Some(Self::Devices),
            3 => Some(Self::Tags),
            4 => Some(Self::ScanClasses),
            5 => Some(Self::Influx),
            6 => Some(Self::Telegraf),
            _ => None,
        }
    }

    /// Next screen in tab order (wraps around).
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|&s| s == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Previous screen in tab order (wraps around).
    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|&s| s == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// Short label for the tab bar.
    pub fn label(self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Devices => "Devices",
            Self::Tags => "Tags",
            Self::ScanClasses => "Scan Classes",
            Self::Influx => "InfluxDB",
            Self::Telegraf => "Telegraf",
            Self::Setup => "Setup",
        }
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
