//! Funnel configuration: permitted answer sets, the free-text cap, and the
//! redirect destination. Defaults match the deployed consultancy funnel.

use std::time::Duration;

/// Sentinel option that unlocks the free-text elaboration field.
pub const OTHER_OPTION: &str = "Other";

#[derive(Debug, Clone)]
pub struct FunnelConfig {
    /// Permitted answers for the primary intent question (step 1).
    pub intent_options: Vec<String>,
    /// Permitted answers for company size (step 3).
    pub company_size_options: Vec<String>,
    /// Permitted answers for project timeline (step 3).
    pub timeline_options: Vec<String>,
    /// Character cap for the "Other" elaboration; input is silently
    /// truncated at this length, never rejected.
    pub other_max_chars: usize,
    /// External scheduling destination opened after submission.
    pub scheduler_url: String,
    /// How long the terminal screen is shown before the redirect fires.
    pub redirect_delay: Duration,
}

impl Default for FunnelConfig {
    fn default() -> Self {
        Self {
            intent_options: vec![
                "Automate operations".to_string(),
                "Build an app".to_string(),
                "AI solution".to_string(),
                OTHER_OPTION.to_string(),
            ],
            company_size_options: vec![
                "1-10".to_string(),
                "11-50".to_string(),
                "50+".to_string(),
            ],
            timeline_options: vec![
                "ASAP".to_string(),
                "1-3 months".to_string(),
                "3+ months".to_string(),
            ],
            other_max_chars: 30,
            scheduler_url: "https://calendly.com/bookings/30min".to_string(),
            redirect_delay: Duration::from_secs(2),
        }
    }
}
