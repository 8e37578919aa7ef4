//! Booking storage behind a small create/list interface.
//!
//! The interface exists so the in-memory list can be swapped for a real
//! datastore without touching handlers. Identifiers are random UUIDs, which
//! keeps concurrent creations collision-free.

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::types::Booking;

/// Fields accepted when creating a booking; the id is assigned here.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub name: String,
    pub email: String,
    pub service: String,
    pub date: String,
    pub message: String,
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn create(&self, new: NewBooking) -> Booking;
    async fn list(&self) -> Vec<Booking>;
}

/// Process-memory store; contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryBookingStore {
    bookings: RwLock<Vec<Booking>>,
}

impl MemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingStore for MemoryBookingStore {
    async fn create(&self, new: NewBooking) -> Booking {
        let booking = Booking {
            id: Uuid::new_v4().to_string(),
            name: new.name,
            email: new.email,
            service: new.service,
            date: new.date,
            message: new.message,
        };
        self.bookings.write().await.push(booking.clone());
        booking
    }

    async fn list(&self) -> Vec<Booking> {
        self.bookings.read().await.clone()
    }
}
