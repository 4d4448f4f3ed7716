use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};

use crate::models::trip::{Trip, TripStatus};

/// In-memory trip registry.
///
/// Each trip sits behind its OWN async mutex: the read-evaluate-append
/// cycle for one trip serializes on that lock while unrelated trips proceed
/// in parallel. The registry lock is only held long enough to resolve an id
/// to a handle, never across a cycle.
pub struct TripStore {
    trips: RwLock<HashMap<String, Arc<Mutex<Trip>>>>,
}

impl TripStore {
    pub fn new() -> Self {
        Self {
            trips: RwLock::new(HashMap::new()),
        }
    }

    /// Register a trip and hand back its handle.
    pub async fn insert(&self, trip: Trip) -> Arc<Mutex<Trip>> {
        let id = trip.id.clone();
        let handle = Arc::new(Mutex::new(trip));
        self.trips.write().await.insert(id, handle.clone());
        handle
    }

    /// Resolve a trip handle. Callers lock it for the duration of their
    /// cycle.
    pub async fn get(&self, trip_id: &str) -> Result<Arc<Mutex<Trip>>> {
        self.trips
            .read()
            .await
            .get(trip_id)
            .cloned()
            .with_context(|| format!("Trip not found: {}", trip_id))
    }

    /// Ids and start times of trips currently active.
    pub async fn active_trips(&self) -> Vec<(String, DateTime<Utc>)> {
        let handles: Vec<_> = self.trips.read().await.values().cloned().collect();

        let mut active = Vec::new();
        for handle in handles {
            let trip = handle.lock().await;
            if trip.status == TripStatus::Active {
                active.push((trip.id.clone(), trip.start_time));
            }
        }
        active
    }
}

impl Default for TripStore {
    fn default() -> Self {
        Self::new()
    }
}
