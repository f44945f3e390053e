//! Resource references for the Gowalla REST hierarchy
//!
//! The API nests most of its endpoints under a user or a spot
//! (`/users/{name}/stamps`, `/spots/{id}/events`, ...). These small value
//! objects hold the parent identifier and build request paths; they carry no
//! connection state, so they can be cloned freely and shared across tasks.

use compact_str::{CompactString, format_compact};

use crate::id::SpotId;

/// Reference to a user resource, addressed by username.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct UserRef {
    username: CompactString,
}

/// Reference to a spot resource.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct SpotRef {
    id: SpotId,
}

/// Geographic spot search parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SpotQuery {
    pub lat: f64,
    pub lng: f64,
    /// Search radius in meters
    pub radius: u32,
}

impl UserRef {
    pub fn new<S: Into<CompactString>>(username: S) -> Self {
        Self { username: username.into() }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn path(&self) -> CompactString {
        format_compact!("/users/{}", self.username)
    }

    pub fn stamps_path(&self, limit: Option<u32>) -> CompactString {
        match limit {
            // 20 is the server default; leaving it off keeps the richer
            // paginated response shape
            Some(limit) if limit != 20 => {
                format_compact!("/users/{}/stamps?limit={}", self.username, limit)
            },
            _ => format_compact!("/users/{}/stamps", self.username),
        }
    }

    pub fn pins_path(&self) -> CompactString {
        format_compact!("/users/{}/pins", self.username)
    }

    pub fn trips_path(&self) -> CompactString {
        format_compact!("/users/{}/trips", self.username)
    }

    pub fn items_path(&self) -> CompactString {
        format_compact!("/users/{}/items", self.username)
    }

    pub fn photos_path(&self) -> CompactString {
        format_compact!("/users/{}/photos", self.username)
    }

    pub fn top_spots_path(&self) -> CompactString {
        format_compact!("/users/{}/topspots", self.username)
    }

    pub fn friend_activity_path(&self) -> CompactString {
        format_compact!("/users/{}/activity/friends", self.username)
    }
}

impl SpotRef {
    pub fn new(id: SpotId) -> Self {
        Self { id }
    }

    pub fn id(&self) -> &SpotId {
        &self.id
    }

    pub fn path(&self) -> CompactString {
        format_compact!("/spots/{}", self.id)
    }

    pub fn events_path(&self) -> CompactString {
        format_compact!("/spots/{}/events", self.id)
    }

    pub fn items_path(&self) -> CompactString {
        format_compact!("/spots/{}/items", self.id)
    }

    pub fn photos_path(&self) -> CompactString {
        format_compact!("/spots/{}/photos", self.id)
    }

    pub fn flags_path(&self) -> CompactString {
        format_compact!("/spots/{}/flags", self.id)
    }
}

impl SpotQuery {
    pub fn new(lat: f64, lng: f64, radius: u32) -> Self {
        Self { lat, lng, radius }
    }

    pub fn path(&self) -> CompactString {
        format_compact!(
            "/spots/?lat={}&lng={}&radius={}",
            self.lat,
            self.lng,
            self.radius
        )
    }

    pub fn search_path(&self, term: &str) -> CompactString {
        format_compact!("{}&q={}", self.path(), term)
    }
}

impl From<SpotId> for SpotRef {
    fn from(id: SpotId) -> Self {
        SpotRef::new(id)
    }
}
