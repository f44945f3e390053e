//! Core HTTP client for the Gowalla API

use std::{sync::RwLock, time::Duration};

use async_trait::async_trait;
use compact_str::{CompactString, format_compact};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{
    config::ClientConfig,
    error::{ClientError, Result},
    fetcher::{FeedSource, PollTarget},
};
use crate::{
    domain::{
        ActivityDto, CategoriesDto, CategoryDto, CheckinDto, FeedResponse, FlagDto, FlagsDto,
        ItemDto, ItemsDto, PhotoDto, PhotosDto, PinDto, PinsDto, SpotDto, SpotSummaryDto,
        SpotsDto, StampDto, StampsDto, TripDto, TripsDto, UserDto,
    },
    resource::{SpotQuery, SpotRef, UserRef},
};

/// Pure HTTP client for the Gowalla API
#[derive(Debug)]
pub struct GowallaApi {
    client: RwLock<Client>,
    config: RwLock<ClientConfig>,
}

/// Gowalla API error response body
#[derive(Debug, Deserialize)]
struct GowallaApiError {
    error: CompactString,
}

impl GowallaApi {
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.request.timeout)
            .build()
            .map_err(ClientError::Http)?;

        Ok(Self {
            client: RwLock::new(client),
            config: RwLock::new(config),
        })
    }

    /// Get a user profile
    #[instrument(skip(self), fields(user = %user.username()))]
    pub async fn get_user(&self, user: &UserRef) -> Result<UserDto> {
        self.get_json(&user.path()).await
    }

    /// Get a user's stamps, optionally overriding the page size
    #[instrument(skip(self), fields(user = %user.username()))]
    pub async fn get_user_stamps(
        &self,
        user: &UserRef,
        limit: Option<u32>,
    ) -> Result<Vec<StampDto>> {
        let limit = limit.or_else(|| {
            let config = self.config.read().unwrap();
            Some(config.request.stamps_limit)
        });
        let response: StampsDto = self.get_json(&user.stamps_path(limit)).await?;
        Ok(response.stamps)
    }

    /// Get the spots a user has pinned
    #[instrument(skip(self), fields(user = %user.username()))]
    pub async fn get_user_pins(&self, user: &UserRef) -> Result<Vec<PinDto>> {
        let response: PinsDto = self.get_json(&user.pins_path()).await?;
        Ok(response.pins)
    }

    /// Get the trips a user has completed
    #[instrument(skip(self), fields(user = %user.username()))]
    pub async fn get_user_trips(&self, user: &UserRef) -> Result<Vec<TripDto>> {
        let response: TripsDto = self.get_json(&user.trips_path()).await?;
        Ok(response.trips)
    }

    /// Get the items a user is carrying
    #[instrument(skip(self), fields(user = %user.username()))]
    pub async fn get_user_items(&self, user: &UserRef) -> Result<Vec<ItemDto>> {
        let response: ItemsDto = self.get_json(&user.items_path()).await?;
        Ok(response.items)
    }

    /// Get the photos a user has posted
    #[instrument(skip(self), fields(user = %user.username()))]
    pub async fn get_user_photos(&self, user: &UserRef) -> Result<Vec<PhotoDto>> {
        let response: PhotosDto = self.get_json(&user.photos_path()).await?;
        Ok(response.photos)
    }

    /// Get a user's most visited spots
    #[instrument(skip(self), fields(user = %user.username()))]
    pub async fn get_user_top_spots(&self, user: &UserRef) -> Result<Vec<SpotSummaryDto>> {
        let response: SpotsDto = self.get_json(&user.top_spots_path()).await?;
        Ok(response.spots)
    }

    /// Get the friend activity feed for a user, newest-first
    #[instrument(skip(self), fields(user = %user.username()))]
    pub async fn get_friend_activity(&self, user: &UserRef) -> Result<Vec<ActivityDto>> {
        let response: FeedResponse = self.get_json(&user.friend_activity_path()).await?;
        Ok(response.into_activity())
    }

    /// Get a spot's details
    #[instrument(skip(self), fields(spot = %spot.id()))]
    pub async fn get_spot(&self, spot: &SpotRef) -> Result<SpotDto> {
        self.get_json(&spot.path()).await
    }

    /// Get the activity feed for a spot, newest-first
    #[instrument(skip(self), fields(spot = %spot.id()))]
    pub async fn get_spot_events(&self, spot: &SpotRef) -> Result<Vec<ActivityDto>> {
        let response: FeedResponse = self.get_json(&spot.events_path()).await?;
        let activity = response.into_activity();
        debug!(event_count = activity.len(), "Successfully fetched spot events");
        Ok(activity)
    }

    /// Get a spot's events filtered down to check-ins
    #[instrument(skip(self), fields(spot = %spot.id()))]
    pub async fn get_spot_checkins(&self, spot: &SpotRef) -> Result<Vec<ActivityDto>> {
        let events = self.get_spot_events(spot).await?;
        Ok(events.into_iter().filter(ActivityDto::is_checkin).collect())
    }

    /// Get the items dropped at a spot
    #[instrument(skip(self), fields(spot = %spot.id()))]
    pub async fn get_spot_items(&self, spot: &SpotRef) -> Result<Vec<ItemDto>> {
        let response: ItemsDto = self.get_json(&spot.items_path()).await?;
        Ok(response.items)
    }

    /// Get the photos taken at a spot
    #[instrument(skip(self), fields(spot = %spot.id()))]
    pub async fn get_spot_photos(&self, spot: &SpotRef) -> Result<Vec<PhotoDto>> {
        let response: PhotosDto = self.get_json(&spot.photos_path()).await?;
        Ok(response.photos)
    }

    /// Get the open flags against a spot
    #[instrument(skip(self), fields(spot = %spot.id()))]
    pub async fn get_spot_flags(&self, spot: &SpotRef) -> Result<Vec<FlagDto>> {
        let response: FlagsDto = self.get_json(&spot.flags_path()).await?;
        Ok(response.flags)
    }

    /// Find spots near a coordinate
    #[instrument(skip(self), fields(lat = query.lat, lng = query.lng, radius = query.radius))]
    pub async fn find_spots(&self, query: &SpotQuery) -> Result<Vec<SpotSummaryDto>> {
        let response: SpotsDto = self.get_json(&query.path()).await?;
        Ok(response.spots)
    }

    /// Find spots near a coordinate matching a search term
    #[instrument(skip(self), fields(lat = query.lat, lng = query.lng, term = term))]
    pub async fn search_spots(
        &self,
        query: &SpotQuery,
        term: &str,
    ) -> Result<Vec<SpotSummaryDto>> {
        let response: SpotsDto = self.get_json(&query.search_path(term)).await?;
        Ok(response.spots)
    }

    /// Get an item by id
    #[instrument(skip(self))]
    pub async fn get_item(&self, id: u64) -> Result<ItemDto> {
        self.get_json(&format_compact!("/items/{id}")).await
    }

    /// Get a trip by id
    #[instrument(skip(self))]
    pub async fn get_trip(&self, id: u64) -> Result<TripDto> {
        self.get_json(&format_compact!("/trips/{id}")).await
    }

    /// Get the featured trips list
    #[instrument(skip(self))]
    pub async fn get_trips(&self) -> Result<Vec<TripDto>> {
        let response: TripsDto = self.get_json("/trips").await?;
        Ok(response.trips)
    }

    /// Get all open flags
    #[instrument(skip(self))]
    pub async fn get_flags(&self) -> Result<Vec<FlagDto>> {
        let response: FlagsDto = self.get_json("/flags").await?;
        Ok(response.flags)
    }

    /// Get a single flag by id
    #[instrument(skip(self))]
    pub async fn get_flag(&self, id: u64) -> Result<FlagDto> {
        self.get_json(&format_compact!("/flags/{id}")).await
    }

    /// Get the spot category tree
    #[instrument(skip(self))]
    pub async fn get_categories(&self) -> Result<Vec<CategoryDto>> {
        let response: CategoriesDto = self.get_json("/categories").await?;
        Ok(response.categories)
    }

    /// Get a single category by id
    #[instrument(skip(self))]
    pub async fn get_category(&self, id: u64) -> Result<CategoryDto> {
        self.get_json(&format_compact!("/categories/{id}")).await
    }

    /// Get a single check-in by id
    #[instrument(skip(self))]
    pub async fn get_checkin(&self, id: u64) -> Result<CheckinDto> {
        self.get_json(&format_compact!("/checkins/{id}")).await
    }

    /// Fetch an arbitrary feed-shaped endpoint by request path
    #[instrument(skip(self))]
    pub async fn get_feed(&self, path: &str) -> Result<Vec<ActivityDto>> {
        let response: FeedResponse = self.get_json(path).await?;
        Ok(response.into_activity())
    }

    /// Update configuration, rebuilding the HTTP client
    pub fn update_config(&self, config: ClientConfig) -> Result<()> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.request.timeout)
            .build()
            .map_err(ClientError::Http)?;

        *self.config.write().unwrap() = config;
        *self.client.write().unwrap() = client;

        Ok(())
    }

    /// Get current configuration
    pub fn config(&self) -> ClientConfig {
        self.config.read().unwrap().clone()
    }

    pub fn is_configured(&self) -> bool {
        self.config
            .read()
            .map(|c| c.validate().is_ok())
            .unwrap_or(false)
    }

    /// Perform an authenticated GET request and deserialize the JSON response
    async fn get_json<T>(&self, path: &str) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let response = self.authenticated_request(path).send().await?;
        self.handle_response(response).await
    }

    /// Create an authenticated request builder for a path under the base URL
    fn authenticated_request(&self, path: &str) -> RequestBuilder {
        let client = self.client.read().unwrap();
        let config = self.config.read().unwrap();
        let url = format_compact!("{}{}", config.base_url, path);

        let mut request = client
            .get(url.as_str())
            .header("X-Gowalla-API-Key", config.api_key.as_str())
            .header("Accept", "application/json")
            .header("User-Agent", "gowalla-client");

        if let Some(credentials) = &config.credentials {
            request = request.basic_auth(
                credentials.username.as_str(),
                Some(credentials.password.as_str()),
            );
        }

        request
    }

    /// Handle an HTTP response and deserialize the JSON body
    async fn handle_response<T>(&self, response: Response) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let url_path = response.url().path().to_string();
        let status = response.status();
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs);
        let body = response.text().await?;

        if status.is_success() {
            serde_json::from_str(&body).map_err(|e| {
                debug!(endpoint = %url_path, error = %e, "Failed to parse response body");
                ClientError::json_parse(url_path, "Failed to parse response", e)
            })
        } else {
            self.handle_error_response(status.as_u16(), retry_after, &body)
        }
    }

    /// Map error responses from the Gowalla API
    fn handle_error_response<T>(
        &self,
        status: u16,
        retry_after: Option<Duration>,
        body: &str,
    ) -> Result<T> {
        match status {
            401 | 403 => Err(ClientError::Authentication),
            404 => Err(ClientError::not_found("Resource")),
            429 => Err(ClientError::rate_limit(retry_after)),
            _ => {
                if let Ok(api_error) = serde_json::from_str::<GowallaApiError>(body) {
                    Err(ClientError::api(format_compact!(
                        "HTTP {}: {}",
                        status,
                        api_error.error
                    )))
                } else {
                    Err(ClientError::api(format_compact!("HTTP {}: {}", status, body)))
                }
            },
        }
    }
}

#[async_trait]
impl FeedSource for GowallaApi {
    async fn fetch_feed(&self, target: &PollTarget) -> Result<Vec<ActivityDto>> {
        self.get_feed(&target.request_path()).await
    }
}
