//! Static path → view table.

/// A navigable view. Room codes are carried upper-cased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    RoomsHub,
    Dashboard { code: String },
    Catalogue { code: String },
    Workspace { code: String },
}

/// Path patterns, in match order. Shown by `sst routes`.
pub const ROUTE_TABLE: &[(&str, &str)] = &[
    ("/", "login"),
    ("/rooms", "rooms hub"),
    ("/rooms/:code", "room dashboard"),
    ("/rooms/:code/activities", "activity catalogue"),
    ("/rooms/:code/activity", "activity workspace"),
];

impl Route {
    /// Resolve a path. A trailing slash is tolerated; unknown paths and empty
    /// room codes give `None`.
    pub fn parse(path: &str) -> Option<Route> {
        let path = path.trim();
        let segments: Vec<&str> = path
            .trim_start_matches('/')
            .trim_end_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        match segments.as_slice() {
            [] => Some(Route::Login),
            ["rooms"] => Some(Route::RoomsHub),
            ["rooms", code] => Some(Route::Dashboard { code: normalize_code(code) }),
            ["rooms", code, "activities"] => Some(Route::Catalogue { code: normalize_code(code) }),
            ["rooms", code, "activity"] => Some(Route::Workspace { code: normalize_code(code) }),
            _ => None,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Login => "/".to_string(),
            Route::RoomsHub => "/rooms".to_string(),
            Route::Dashboard { code } => format!("/rooms/{code}"),
            Route::Catalogue { code } => format!("/rooms/{code}/activities"),
            Route::Workspace { code } => format!("/rooms/{code}/activity"),
        }
    }

    pub fn room_code(&self) -> Option<&str> {
        match self {
            Route::Dashboard { code } | Route::Catalogue { code } | Route::Workspace { code } => {
                Some(code)
            }
            Route::Login | Route::RoomsHub => None,
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path())
    }
}

/// Room codes are case-insensitive on the server; keep them upper-case locally.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}
