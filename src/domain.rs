use compact_str::CompactString;
use serde::Deserialize;

use crate::id::{CheckinId, SpotId};

/// One record from an activity feed.
///
/// The polling core only interprets `created_at` and `kind`; everything else
/// the server sent rides along untouched in `extra` so observers can pick out
/// whatever fields their feed variant carries.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityDto {
    #[serde(default)]
    pub created_at: CompactString,
    #[serde(rename = "type", default)]
    pub kind: CompactString,
    pub message: Option<CompactString>,
    pub url: Option<CompactString>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl ActivityDto {
    pub fn is_checkin(&self) -> bool {
        self.kind == "checkin"
    }
}

/// Feed endpoints wrap the page in `{"activity": [...]}`, but some list
/// endpoints return a bare array. Accept either shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FeedResponse {
    Wrapped(ActivityFeedDto),
    Bare(Vec<ActivityDto>),
}

impl FeedResponse {
    pub fn into_activity(self) -> Vec<ActivityDto> {
        match self {
            FeedResponse::Wrapped(feed) => feed.activity,
            FeedResponse::Bare(activity) => activity,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityFeedDto {
    #[serde(default)]
    pub activity: Vec<ActivityDto>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserDto {
    pub username: CompactString,
    pub first_name: Option<CompactString>,
    pub last_name: Option<CompactString>,
    pub url: Option<CompactString>,
    #[serde(default)]
    pub stamps_count: u32,
    #[serde(default)]
    pub pins_count: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpotDto {
    pub name: CompactString,
    pub url: Option<CompactString>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius_meters: Option<u32>,
    #[serde(default)]
    pub checkins_count: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StampDto {
    pub spot: SpotDto,
    pub first_checkin_at: Option<CompactString>,
    pub last_checkin_at: Option<CompactString>,
    #[serde(default)]
    pub checkins_count: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StampsDto {
    #[serde(default)]
    pub stamps: Vec<StampDto>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemDto {
    pub name: CompactString,
    pub url: Option<CompactString>,
    pub image_url: Option<CompactString>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemsDto {
    #[serde(default)]
    pub items: Vec<ItemDto>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TripDto {
    pub name: CompactString,
    pub url: Option<CompactString>,
    pub description: Option<CompactString>,
    #[serde(default)]
    pub spots: Vec<SpotDto>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PinDto {
    pub spot: Option<SpotDto>,
    pub name: Option<CompactString>,
    pub url: Option<CompactString>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PinsDto {
    #[serde(default)]
    pub pins: Vec<PinDto>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TripsDto {
    #[serde(default)]
    pub trips: Vec<TripDto>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PhotoDto {
    pub url: Option<CompactString>,
    pub created_at: Option<CompactString>,
    pub user: Option<UserDto>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PhotosDto {
    #[serde(default)]
    pub photos: Vec<PhotoDto>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlagDto {
    pub status: Option<CompactString>,
    pub reason: Option<CompactString>,
    pub spot: Option<SpotDto>,
    pub url: Option<CompactString>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlagsDto {
    #[serde(default)]
    pub flags: Vec<FlagDto>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryDto {
    pub name: CompactString,
    pub url: Option<CompactString>,
    pub description: Option<CompactString>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoriesDto {
    #[serde(default)]
    pub categories: Vec<CategoryDto>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckinDto {
    pub id: Option<CheckinId>,
    pub message: Option<CompactString>,
    pub created_at: Option<CompactString>,
    pub spot: Option<SpotDto>,
    pub user: Option<UserDto>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpotsDto {
    #[serde(default)]
    pub spots: Vec<SpotSummaryDto>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpotSummaryDto {
    pub id: Option<SpotId>,
    pub name: CompactString,
    pub url: Option<CompactString>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}
