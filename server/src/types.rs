use serde::{Deserialize, Serialize};

/// A stored booking record. Lives in process memory only; there is no
/// update or delete operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub name: String,
    pub email: String,
    pub service: String,
    pub date: String,
    /// Optional on input, stored as an empty string when absent.
    pub message: String,
}
