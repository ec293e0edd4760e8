//! Activity catalogue: browse, search, and pick a template for a room.

use std::str::FromStr;

use tracing::info;

use crate::api::{Activity, ActivityType, ApiClient};
use crate::error::Result;
use crate::router::Route;
use crate::storage::LocalStore;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TypeFilter {
    #[default]
    All,
    Only(ActivityType),
}

impl FromStr for TypeFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            Ok(TypeFilter::All)
        } else {
            Ok(TypeFilter::Only(ActivityType::from(s.to_string())))
        }
    }
}

impl TypeFilter {
    pub fn matches(&self, activity: &Activity) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Only(t) => &activity.activity_type == t,
        }
    }
}

/// Activities whose name or description contains `query` (case-insensitive)
/// and whose type passes `filter`. A blank query matches everything.
pub fn filter_activities<'a>(activities: &'a [Activity], query: &str, filter: &TypeFilter) -> Vec<&'a Activity> {
    let q = query.trim().to_lowercase();
    activities
        .iter()
        .filter(|a| {
            q.is_empty()
                || a.name.to_lowercase().contains(&q)
                || a.description.to_lowercase().contains(&q)
        })
        .filter(|a| filter.matches(a))
        .collect()
}

#[derive(Debug, Default)]
pub struct Catalogue {
    activities: Vec<Activity>,
    query: String,
    filter: TypeFilter,
    loading: bool,
    error: Option<String>,
}

impl Catalogue {
    pub fn new() -> Self {
        Self {
            loading: true,
            ..Self::default()
        }
    }

    pub async fn load(&mut self, api: &ApiClient) {
        self.loading = true;
        self.error = None;
        match api.list_activities().await {
            Ok(activities) => self.activities = activities,
            Err(e) => self.error = Some(e.to_string()),
        }
        self.loading = false;
    }

    pub fn set_activities(&mut self, activities: Vec<Activity>) {
        self.activities = activities;
        self.loading = false;
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn set_filter(&mut self, filter: TypeFilter) {
        self.filter = filter;
    }

    pub fn visible(&self) -> Vec<&Activity> {
        filter_activities(&self.activities, &self.query, &self.filter)
    }

    pub fn find(&self, id: u64) -> Option<&Activity> {
        self.activities.iter().find(|a| a.id == id)
    }

    pub fn all(&self) -> &[Activity] {
        &self.activities
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn filter(&self) -> &TypeFilter {
        &self.filter
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Remember `activity_id` as the room's chosen template and return to the
/// room dashboard, where it can be started.
pub fn select(store: &mut LocalStore, room_code: &str, activity_id: u64) -> Result<Route> {
    store.set_selected_activity(room_code, activity_id)?;
    info!(room = %room_code, activity_id, "activity selected");
    Ok(Route::Dashboard {
        code: crate::router::normalize_code(room_code),
    })
}
