//! The pages of the app addressed by path, the same paths the web version
//! shows in the address bar and the server uses in the links it emails

use std::fmt::Display;

use car_notes_shared::{
    errors::RouteParseError, id::DbId, list_query::CarListQuery, req_args::EmailLinkParams,
    user::User,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home(CarListQuery),
    AddCar,
    EditCar(DbId),
    DeleteAccount,
    Admin(CarListQuery),
    AdminEditCar(DbId),
    Register,
    Login,
    Activate(EmailLinkParams),
    RequestPasswordChange,
    ConfirmPasswordChange(EmailLinkParams),
    NotFound(String),
}

impl Default for Route {
    fn default() -> Self {
        Self::Home(CarListQuery::new())
    }
}

impl Route {
    /// Parses a path with an optional query string such as `/edit/3` or
    /// `/?brand=Audi&page=2`
    pub fn from_path(path: &str) -> Result<Self, RouteParseError> {
        let (path_only, search) = path.split_once('?').unwrap_or((path, ""));
        let segments: Vec<&str> = path_only.split('/').filter(|x| !x.is_empty()).collect();
        let result = match segments.as_slice() {
            [] => Self::Home(CarListQuery::from_search(search)),
            ["addCar"] => Self::AddCar,
            ["edit", id] => Self::EditCar(parse_id(id)?),
            ["deleteAccount"] => Self::DeleteAccount,
            ["admin"] => Self::Admin(CarListQuery::from_search(search)),
            ["admin", "edit", id] => Self::AdminEditCar(parse_id(id)?),
            ["register"] => Self::Register,
            ["login"] => Self::Login,
            ["activate", uid, token] => Self::Activate(EmailLinkParams::new(*uid, *token)),
            ["requestChangeForgottenPassword"] => Self::RequestPasswordChange,
            ["confirmChangeForgottenPassword", uid, token] => {
                Self::ConfirmPasswordChange(EmailLinkParams::new(*uid, *token))
            }
            _ => return Err(RouteParseError::UnknownPath(path.to_string())),
        };
        Ok(result)
    }

    /// Same as [`Self::from_path`] but unknown paths lead to the not found
    /// page
    pub fn from_path_or_not_found(path: &str) -> Self {
        Self::from_path(path).unwrap_or_else(|e| {
            tracing::info!(?e, "no route for path");
            Self::NotFound(path.to_string())
        })
    }

    /// Accepts a full link (as received by email) or just the path
    pub fn from_link(link: &str) -> Result<Self, RouteParseError> {
        let link = link.trim();
        let path = match link.split_once("://") {
            Some((_scheme, rest)) => rest.find('/').map_or("/", |start| &rest[start..]),
            None => link,
        };
        Self::from_path(path)
    }

    pub fn to_path(&self) -> String {
        match self {
            Route::Home(query) => format!("/?{}", query.to_query_string()),
            Route::AddCar => "/addCar".to_string(),
            Route::EditCar(id) => format!("/edit/{id}"),
            Route::DeleteAccount => "/deleteAccount".to_string(),
            Route::Admin(query) => format!("/admin?{}", query.to_query_string()),
            Route::AdminEditCar(id) => format!("/admin/edit/{id}"),
            Route::Register => "/register".to_string(),
            Route::Login => "/login".to_string(),
            Route::Activate(link) => format!("/activate/{}/{}/", link.uid, link.token),
            Route::RequestPasswordChange => "/requestChangeForgottenPassword".to_string(),
            Route::ConfirmPasswordChange(link) => {
                format!("/confirmChangeForgottenPassword/{}/{}/", link.uid, link.token)
            }
            Route::NotFound(path) => path.clone(),
        }
    }

    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            Route::Home(_)
                | Route::AddCar
                | Route::EditCar(_)
                | Route::DeleteAccount
                | Route::Admin(_)
                | Route::AdminEditCar(_)
        )
    }

    pub fn requires_staff(&self) -> bool {
        matches!(self, Route::Admin(_) | Route::AdminEditCar(_))
    }

    /// Pages that make no sense once logged in
    pub fn is_guest_only(&self) -> bool {
        matches!(self, Route::Login | Route::Register)
    }

    /// Returns where to go instead if the user may not see this route
    pub fn redirect_for(&self, user: Option<&User>) -> Option<Route> {
        match user {
            None if self.requires_login() => Some(Route::Login),
            None => None,
            Some(_) if self.is_guest_only() => Some(Route::default()),
            Some(user) if self.requires_staff() && !user.is_admin() => Some(Route::default()),
            Some(user) if user.is_admin() => match self {
                Route::Home(query) => Some(Route::Admin(query.clone())),
                _ => None,
            },
            Some(_) => None,
        }
    }

    /// Applies redirects until the route is allowed
    pub fn guarded(self, user: Option<&User>) -> Route {
        let mut result = self;
        // No chain of redirects is longer than two
        for _ in 0..3 {
            match result.redirect_for(user) {
                Some(redirect) => result = redirect,
                None => break,
            }
        }
        result
    }
}

impl Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_path())
    }
}

fn parse_id(value: &str) -> Result<DbId, RouteParseError> {
    value.parse().map_err(|source| RouteParseError::InvalidId {
        value: value.to_string(),
        source,
    })
}
