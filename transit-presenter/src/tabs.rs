//! Tab state machine for the two planning modes

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

const TRIP_INSTRUCTIONS: &str = r#"
            <p>1. Enter your origin and destination</p>
            <p>2. Select your target Departure Window</p>
            <p>3. Click "Find Best Time" to see the fastest options within this window</p>"#;

const WORK_INSTRUCTIONS: &str = r#"
            <p>1. Enter Starting Address(es) and a Destination (like a workplace)</p>
            <p>2. Set how long you need to be at the destination (Hours)</p>
            <p>3. Select the earliest time you can depart from your starting address(es) for the departure window start and the latest time you can depart from your starting address(es) for the departure window end</p>
            <p>4. Click "Find Best Schedule" to minimize total round-trip time</p>"#;

/// A planning tab. Exactly one is active at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tab {
    /// Find the fastest departure within a window
    #[default]
    OptimizeTrip,
    /// Find the round-trip schedule with the shortest total commute
    OptimizeWork,
}

impl Tab {
    /// All tabs in display order
    pub const ALL: [Tab; 2] = [Tab::OptimizeTrip, Tab::OptimizeWork];

    /// Identifier used for the tab control and its content panel
    pub fn id(&self) -> &'static str {
        match self {
            Tab::OptimizeTrip => "optimize-trip",
            Tab::OptimizeWork => "optimize-work",
        }
    }

    /// Identifier of the form inside this tab's panel
    pub fn form_id(&self) -> &'static str {
        match self {
            Tab::OptimizeTrip => "form-optimize-trip",
            Tab::OptimizeWork => "form-optimize-work",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Tab::OptimizeTrip => "Optimize Trip",
            Tab::OptimizeWork => "Optimize Work Commute",
        }
    }

    /// Label of the submit button when idle
    pub fn submit_label(&self) -> &'static str {
        match self {
            Tab::OptimizeTrip => "Find Best Time",
            Tab::OptimizeWork => "Find Best Schedule",
        }
    }

    /// Fixed instructions fragment shown while this tab is active
    pub fn instructions_html(&self) -> &'static str {
        match self {
            Tab::OptimizeTrip => TRIP_INSTRUCTIONS,
            Tab::OptimizeWork => WORK_INSTRUCTIONS,
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Error for an identifier that names no tab
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Unknown tab: {0}")]
pub struct UnknownTab(pub String);

impl FromStr for Tab {
    type Err = UnknownTab;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tab::ALL
            .into_iter()
            .find(|tab| tab.id() == s)
            .ok_or_else(|| UnknownTab(s.to_string()))
    }
}

/// Tab selection plus the results visibility it governs.
///
/// Active markers are derived from `active`, so exactly one tab control and
/// one content panel are active by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabController {
    active: Tab,
    results_visible: bool,
}

impl TabController {
    pub fn new(initial: Tab) -> Self {
        Self {
            active: initial,
            results_visible: false,
        }
    }

    pub fn active(&self) -> Tab {
        self.active
    }

    /// Activate a tab. Always hides the results panel, even when the tab
    /// was already active.
    pub fn activate(&mut self, tab: Tab) {
        self.active = tab;
        self.results_visible = false;
    }

    /// Instructions for the active tab
    pub fn instructions_html(&self) -> &'static str {
        self.active.instructions_html()
    }

    /// `(tab, active)` pairs in display order
    pub fn markers(&self) -> impl Iterator<Item = (Tab, bool)> + '_ {
        Tab::ALL.into_iter().map(move |tab| (tab, tab == self.active))
    }

    pub fn results_visible(&self) -> bool {
        self.results_visible
    }

    pub fn show_results(&mut self) {
        self.results_visible = true;
    }
}

impl Default for TabController {
    fn default() -> Self {
        Self::new(Tab::default())
    }
}
