//! Google Calendar and UserInfo REST client.
//!
//! Every call sends the access token as a bearer header. Non-success
//! statuses become [`GoogleError::api`] with the status and raw body; there
//! are no retries and no partial results.

use chrono::TimeZone;
use lifely_core::{Calendar, CalendarEvent, TimeWindow, UserInfo};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::config::GoogleConfig;
use crate::error::{GoogleError, GoogleResult};

/// Page size requested from events.list (the API maximum).
pub const EVENTS_PAGE_SIZE: usize = 2500;

/// Progress callback receiving the cumulative number of events fetched.
pub type ProgressFn<'a> = &'a mut (dyn FnMut(usize) + Send);

/// Authenticated client for the Calendar v3 and UserInfo endpoints.
#[derive(Debug, Clone)]
pub struct GoogleCalendarClient {
    http_client: reqwest::Client,
    access_token: String,
    calendar_api: String,
    userinfo_url: String,
    max_pages: usize,
}

impl GoogleCalendarClient {
    /// Creates a client that authenticates with `access_token`.
    ///
    /// Fails with a configuration error when `config` does not validate.
    pub fn new(access_token: impl Into<String>, config: &GoogleConfig) -> GoogleResult<Self> {
        config.validate().map_err(GoogleError::configuration)?;
        let http_client = config.http_client().map_err(|e| {
            GoogleError::configuration("failed to create HTTP client").with_source(e)
        })?;

        Ok(Self {
            http_client,
            access_token: access_token.into(),
            calendar_api: config.endpoints.calendar_api.trim_end_matches('/').to_string(),
            userinfo_url: config.endpoints.userinfo.clone(),
            max_pages: config.max_pages,
        })
    }

    /// Updates the access token (after refresh).
    pub fn set_access_token(&mut self, token: impl Into<String>) {
        self.access_token = token.into();
    }

    /// Fetches the signed-in user's profile.
    pub async fn fetch_user_info(&self) -> GoogleResult<UserInfo> {
        let user: UserInfo = self.get_json(&self.userinfo_url, &[]).await?;
        debug!("fetched user info for {}", user.email);
        Ok(user)
    }

    /// Lists the calendars in the user's calendar list.
    ///
    /// A response without an `items` field is an empty list.
    pub async fn list_calendars(&self) -> GoogleResult<Vec<Calendar>> {
        let url = format!("{}/users/me/calendarList", self.calendar_api);
        let list: CalendarListResponse = self.get_json(&url, &[]).await?;
        debug!("fetched {} calendars", list.items.len());
        Ok(list.items)
    }

    /// Fetches every event of `year` from the primary calendar.
    ///
    /// The year is taken in the machine's local time zone. Recurring events
    /// are expanded into instances and results come back ordered by start
    /// time. `on_progress` is called after each page with the running total.
    pub async fn fetch_calendar_events(
        &self,
        year: i32,
        on_progress: Option<ProgressFn<'_>>,
    ) -> GoogleResult<Vec<CalendarEvent>> {
        let window = TimeWindow::for_year(year)
            .ok_or_else(|| GoogleError::configuration(format!("year {} is out of range", year)))?;
        self.fetch_events_in(&window, on_progress).await
    }

    /// Like [`fetch_calendar_events`](Self::fetch_calendar_events) with the
    /// year taken in `tz`.
    pub async fn fetch_calendar_events_in<Tz: TimeZone>(
        &self,
        year: i32,
        tz: &Tz,
        on_progress: Option<ProgressFn<'_>>,
    ) -> GoogleResult<Vec<CalendarEvent>> {
        let window = TimeWindow::for_year_in(year, tz)
            .ok_or_else(|| GoogleError::configuration(format!("year {} is out of range", year)))?;
        self.fetch_events_in(&window, on_progress).await
    }

    /// Pages through the primary calendar's events within `window`.
    pub async fn fetch_events_in(
        &self,
        window: &TimeWindow,
        mut on_progress: Option<ProgressFn<'_>>,
    ) -> GoogleResult<Vec<CalendarEvent>> {
        let url = format!("{}/calendars/primary/events", self.calendar_api);
        let time_min = window.start_rfc3339();
        let time_max = window.end_rfc3339();
        let page_size = EVENTS_PAGE_SIZE.to_string();

        let mut all_events = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            if pages == self.max_pages {
                warn!(
                    "giving up after {} pages with {} events",
                    pages,
                    all_events.len()
                );
                return Err(GoogleError::pagination_limit(self.max_pages));
            }

            let mut query: Vec<(&str, &str)> = vec![
                ("timeMin", time_min.as_str()),
                ("timeMax", time_max.as_str()),
                ("singleEvents", "true"),
                ("orderBy", "startTime"),
                ("maxResults", page_size.as_str()),
            ];
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }

            let page: EventListResponse = self.get_json(&url, &query).await?;
            pages += 1;

            all_events.extend(page.items);
            if let Some(callback) = on_progress.as_mut() {
                callback(all_events.len());
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        info!(
            "fetched {} events in {} page(s) between {} and {}",
            all_events.len(),
            pages,
            time_min,
            time_max
        );
        Ok(all_events)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> GoogleResult<T> {
        let response = self
            .http_client
            .get(url)
            .bearer_auth(&self.access_token)
            .query(query)
            .send()
            .await
            .map_err(|e| GoogleError::from_transport("request failed", e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GoogleError::from_transport("failed to read response", e))?;

        if !status.is_success() {
            debug!("GET {} returned {}", url, status);
            return Err(GoogleError::api(status.as_u16(), body));
        }

        serde_json::from_str(&body).map_err(|e| {
            GoogleError::invalid_response(format!("failed to parse response: {}", e))
        })
    }
}

/// Response from the events.list endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventListResponse {
    #[serde(default)]
    items: Vec<CalendarEvent>,
    next_page_token: Option<String>,
}

/// Response from the calendarList endpoint.
#[derive(Debug, Deserialize)]
struct CalendarListResponse {
    #[serde(default)]
    items: Vec<Calendar>,
}
