//! Stores settings that are not expected to need to change but grouped together
//! for discoverability and reuse. Each constant should be prefixed by the module
//! name to allow importing the constant only and still be readable

pub mod client {
    /// Used when neither the command line nor the configuration sources
    /// provide a server address
    pub const CLIENT_DEFAULT_SERVER_URL: &str = "http://localhost:8000/api";
    pub const CLIENT_CONFIG_FILE_NAME: &str = "car_notes_client.toml";
}

pub mod csrf {
    /// Name of the cookie the server stores the token in
    pub const CSRF_COOKIE_NAME: &str = "csrftoken";
    /// Header the token must be echoed back in for mutating requests
    pub const CSRF_HEADER_NAME: &str = "X-CSRFToken";
}

pub mod car {
    pub const CAR_FIELD_MAX_LENGTH: usize = 255;
    /// Joins multiple selected values of the same filter in the query string
    pub const CAR_FILTER_SEPARATOR: char = '-';
    pub const CAR_FIRST_PAGE: u32 = 1;
}

pub mod path {
    mod path_spec;
    pub use path_spec::PathSpec;
    pub const PATH_AUTH_ACTIVATE_ACCOUNT: PathSpec =
        PathSpec::post("/auth/activate_account/{uid}/{token}/");
    pub const PATH_AUTH_CONFIRM_PASSWORD_CHANGE: PathSpec =
        PathSpec::put("/auth/confirm_change_known_password/{uid}/{token}/");
    pub const PATH_AUTH_CSRF_COOKIE: PathSpec = PathSpec::post("/auth/csrf_cookie/");
    pub const PATH_AUTH_DELETE_ACCOUNT: PathSpec = PathSpec::delete("/auth/delete_account/");
    pub const PATH_AUTH_IS_AUTHENTICATED: PathSpec = PathSpec::post("/auth/is_authenticated/");
    pub const PATH_AUTH_LOGIN: PathSpec = PathSpec::post("/auth/login/");
    pub const PATH_AUTH_LOGOUT: PathSpec = PathSpec::post("/auth/logout/");
    pub const PATH_AUTH_LOGOUT_ALL: PathSpec = PathSpec::post("/auth/logout_all/");
    pub const PATH_AUTH_REGISTER: PathSpec = PathSpec::post("/auth/register/");
    pub const PATH_AUTH_REQUEST_PASSWORD_CHANGE: PathSpec =
        PathSpec::post("/auth/request_change_known_password/");
    pub const PATH_CARS_ADMIN_DELETE: PathSpec = PathSpec::delete("/cars/admin/{id}/");
    pub const PATH_CARS_ADMIN_LIST: PathSpec = PathSpec::get("/cars/admin/");
    pub const PATH_CARS_CREATE: PathSpec = PathSpec::post("/cars/");
    pub const PATH_CARS_DELETE: PathSpec = PathSpec::delete("/cars/{id}/");
    pub const PATH_CARS_DETAIL: PathSpec = PathSpec::get("/cars/{id}/");
    pub const PATH_CARS_FILTERS: PathSpec = PathSpec::get("/cars/filters/");
    pub const PATH_CARS_LIST: PathSpec = PathSpec::get("/cars/");
    pub const PATH_CARS_UPDATE: PathSpec = PathSpec::put("/cars/{id}/");
}
