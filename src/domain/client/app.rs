use std::sync::Arc;

use crate::domain::client::outbound::{PreferenceClientPort, TimerCommandPort, WatchPort};

/// Entrance to the domain logic, providing ports for external adapters.
pub struct ApplicationCore {
    pub timer: Arc<dyn TimerCommandPort>,
    pub preference: Arc<dyn PreferenceClientPort>,
    pub watch: Arc<dyn WatchPort>,
}

impl ApplicationCore {
    /// Create a new [`ApplicationCore`] by injecting external adapters.
    pub fn setup(
        timer: Arc<dyn TimerCommandPort>,
        preference: Arc<dyn PreferenceClientPort>,
        watch: Arc<dyn WatchPort>,
    ) -> ApplicationCore {
        Self {
            timer,
            preference,
            watch,
        }
    }
}
