//! Point-of-interest storage
//!
//! The store abstracts where candidate POIs come from. The shipped backend
//! reads a JSON dataset from disk at startup; a missing file degrades to an
//! empty catalog with a warning so a fresh checkout still serves requests.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::distance::distance_miles;
use crate::models::{Coordinate, Poi};

/// Candidate lookup around a center point
#[async_trait]
pub trait PoiStore: Send + Sync {
    /// Return POIs within `radius_miles` of `center`, nearest first is NOT
    /// guaranteed here; ordering is the caller's concern.
    async fn find_near(
        &self,
        center: &Coordinate,
        radius_miles: f64,
        limit: usize,
    ) -> Result<Vec<Poi>>;
}

/// In-memory store backed by a JSON dataset file
pub struct JsonPoiStore {
    pois: Vec<Poi>,
}

impl JsonPoiStore {
    /// Create a store from an already-loaded catalog
    #[must_use]
    pub fn new(pois: Vec<Poi>) -> Self {
        Self { pois }
    }

    /// Load the catalog from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read POI dataset {}", path.display()))?;
        let pois: Vec<Poi> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse POI dataset {}", path.display()))?;
        debug!("Loaded {} POIs from {}", pois.len(), path.display());
        Ok(Self::new(pois))
    }

    /// Load the catalog, falling back to an empty store if the file is
    /// missing.
    #[must_use]
    pub fn load_or_empty(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            warn!(
                "POI dataset not found at {}, starting with an empty catalog",
                path.display()
            );
            return Self::new(Vec::new());
        }
        match Self::from_file(path) {
            Ok(store) => store,
            Err(e) => {
                warn!("Failed to load POI dataset: {e:#}, starting empty");
                Self::new(Vec::new())
            }
        }
    }

    /// Number of POIs in the catalog
    #[must_use]
    pub fn len(&self) -> usize {
        self.pois.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pois.is_empty()
    }
}

#[async_trait]
impl PoiStore for JsonPoiStore {
    async fn find_near(
        &self,
        center: &Coordinate,
        radius_miles: f64,
        limit: usize,
    ) -> Result<Vec<Poi>> {
        let found: Vec<Poi> = self
            .pois
            .iter()
            .filter(|poi| distance_miles(center, &poi.coordinate()) <= radius_miles)
            .take(limit)
            .cloned()
            .collect();
        Ok(found)
    }
}
