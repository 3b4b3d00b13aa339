//! In memory state of the fake server
//!
//! Emails are not sent, they are kept in an outbox so tests can follow the
//! links in them.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex, MutexGuard,
};

use car_notes_shared::{
    car::{Car, CarFields, CarFilterOptions},
    const_config::{car::CAR_FILTER_SEPARATOR, path::PathSpec},
    id::DbId,
    paginated::Paginated,
    req_args::EmailLinkParams,
    user::User,
};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::{errors::BackendError, session_state::SessionInfo};

/// Number of cars per page, as configured on the real server
pub const PAGE_SIZE: u32 = 9;

const MSG_CAR_NOT_FOUND_FOR_USER: &str =
    "Car note with the given car id and user id does not exist";
const MSG_CAR_NOT_FOUND: &str = "Car note with the given car id does not exist";

#[derive(Debug, Default)]
pub struct FakeBackend {
    state: Mutex<BackendState>,
    /// Answer requests without a valid session with 401 instead of 403
    is_unauthenticated_401: AtomicBool,
}

#[derive(Debug, Default)]
struct BackendState {
    users: Vec<StoredUser>,
    cars: Vec<Car>,
    last_id: u64,
    outbox: Vec<SentEmail>,
    requests: Vec<RecordedRequest>,
}

#[derive(Debug)]
struct StoredUser {
    user: User,
    password: String,
    is_active: bool,
    /// Sessions created before the last "logout all" hold an older value
    session_generation: u64,
    /// Token of the most recently emailed link, cleared once used
    link_token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailKind {
    Activation,
    PasswordChange,
}

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub kind: EmailKind,
    pub link: EmailLinkParams,
}

/// A request as it arrived, before any checks were applied
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Path without the [`crate::API_PREFIX`]
    pub path: String,
    pub query: String,
    pub csrf_header: Option<String>,
}

/// The filters of a list request, each may hold several values joined by
/// [`CAR_FILTER_SEPARATOR`]
#[derive(Debug, Default, Clone, serde::Deserialize)]
pub(crate) struct CarFilter {
    pub brand: Option<String>,
    pub motor: Option<String>,
}

impl FakeBackend {
    fn lock(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().expect("mutex poisoned")
    }

    /// Stores a user directly, without going through registration
    pub fn add_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
        is_staff: bool,
        is_active: bool,
    ) -> User {
        let mut guard = self.lock();
        let id = guard.next_id();
        let user = User {
            id,
            username: username.to_string(),
            email: Some(email.to_string()),
            first_name: String::new(),
            last_name: String::new(),
            is_staff,
            is_superuser: false,
            date_joined: Utc::now(),
            last_login: None,
        };
        guard.users.push(StoredUser {
            user: user.clone(),
            password: password.to_string(),
            is_active,
            session_generation: 0,
            link_token: None,
        });
        user
    }

    /// Stores a car directly for the owner, bypassing validation
    pub fn add_car(&self, owner: DbId, fields: CarFields) -> Car {
        self.lock().insert_car(owner, fields)
    }

    pub fn car_count(&self) -> usize {
        self.lock().cars.len()
    }

    pub fn user_exists(&self, id: DbId) -> bool {
        self.lock().user(id).is_some()
    }

    pub fn sent_emails(&self) -> Vec<SentEmail> {
        self.lock().outbox.clone()
    }

    /// The link of the last email of the kind sent to the address
    pub fn last_link_sent_to(&self, email: &str, kind: EmailKind) -> Option<EmailLinkParams> {
        self.lock()
            .outbox
            .iter()
            .rev()
            .find(|x| x.to == email && x.kind == kind)
            .map(|x| x.link.clone())
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    /// Requests received for the endpoint, including rejected ones
    pub fn requests_to(
        &self,
        path_spec: &PathSpec,
        path_params: &[(&str, &str)],
    ) -> Vec<RecordedRequest> {
        let method = path_spec.method.to_string();
        let path = path_spec.with_params(path_params);
        self.lock()
            .requests
            .iter()
            .filter(|x| x.method == method && x.path == path)
            .cloned()
            .collect()
    }

    pub fn request_count(&self, path_spec: &PathSpec, path_params: &[(&str, &str)]) -> usize {
        self.requests_to(path_spec, path_params).len()
    }

    /// Servers that send a `WWW-Authenticate` challenge reject requests
    /// without a session with 401 rather than 403
    pub fn reject_unauthenticated_with_401(&self) {
        self.is_unauthenticated_401.store(true, Ordering::Relaxed);
    }

    pub(crate) fn not_authenticated(&self) -> BackendError {
        if self.is_unauthenticated_401.load(Ordering::Relaxed) {
            BackendError::Unauthorized
        } else {
            BackendError::NotAuthenticated
        }
    }

    pub(crate) fn record_request(&self, request: RecordedRequest) {
        self.lock().requests.push(request);
    }

    /// Returns the user if the session is still valid
    pub(crate) fn session_user(&self, info: &SessionInfo) -> Option<User> {
        self.lock()
            .user(info.user_id)
            .filter(|x| x.is_active && x.session_generation == info.generation)
            .map(|x| x.user.clone())
    }

    /// Accepts either the email or the username along with the password
    pub(crate) fn login(
        &self,
        email_or_username: &str,
        password: &str,
    ) -> Option<(User, SessionInfo)> {
        let mut guard = self.lock();
        let stored = guard.users.iter_mut().find(|x| {
            x.user.email.as_deref() == Some(email_or_username)
                || x.user.username == email_or_username
        })?;
        if !stored.is_active || stored.password != password {
            return None;
        }
        stored.user.last_login = Some(Utc::now());
        let info = SessionInfo {
            user_id: stored.user.id,
            generation: stored.session_generation,
        };
        Some((stored.user.clone(), info))
    }

    /// Invalidates every session of the user
    pub(crate) fn end_all_sessions(&self, user_id: DbId) {
        if let Some(stored) = self.lock().user_mut(user_id) {
            stored.session_generation += 1;
            info!(?user_id, "all sessions ended");
        }
    }

    /// Creates an inactive user and emails the activation link
    ///
    /// If the email is already registered only a new link is sent, the
    /// existing user is left unchanged
    pub(crate) fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<(), BackendError> {
        let mut guard = self.lock();
        if let Some(existing) = guard.user_id_by_email(email) {
            guard.send_link(existing, EmailKind::Activation);
            return Ok(());
        }
        if guard.users.iter().any(|x| x.user.username == username) {
            return Err(BackendError::field(
                "username",
                "A user with that username already exists.",
            ));
        }
        drop(guard);
        let user = self.add_user(username, email, password, false, false);
        self.lock().send_link(user.id, EmailKind::Activation);
        Ok(())
    }

    /// Returns `true` if the link was valid and the account is now active
    pub(crate) fn activate(&self, link: &EmailLinkParams) -> bool {
        let mut guard = self.lock();
        let Some(stored) = guard.user_by_link_mut(link) else {
            return false;
        };
        stored.is_active = true;
        stored.link_token = None;
        true
    }

    /// Sends the link if there is a user with the email, does nothing
    /// otherwise
    pub(crate) fn request_password_change(&self, email: &str) {
        let mut guard = self.lock();
        if let Some(id) = guard.user_id_by_email(email) {
            guard.send_link(id, EmailKind::PasswordChange);
        }
    }

    pub(crate) fn is_valid_link(&self, link: &EmailLinkParams) -> bool {
        self.lock().user_by_link_mut(link).is_some()
    }

    /// Returns `false` if the link is not valid
    pub(crate) fn change_password(&self, link: &EmailLinkParams, new_password: &str) -> bool {
        let mut guard = self.lock();
        let Some(stored) = guard.user_by_link_mut(link) else {
            return false;
        };
        stored.password = new_password.to_string();
        stored.link_token = None;
        true
    }

    /// Removes the user and all of their cars if the password matches
    pub(crate) fn delete_account(&self, user_id: DbId, password: &str) -> Result<(), BackendError> {
        let mut guard = self.lock();
        let Some(stored) = guard.user(user_id) else {
            return Err(self.not_authenticated());
        };
        if stored.password != password {
            return Err(BackendError::field("password", "Wrong password."));
        }
        guard.users.retain(|x| x.user.id != user_id);
        guard.cars.retain(|x| x.user != user_id);
        info!(?user_id, "account deleted");
        Ok(())
    }

    /// One page of the cars of `owner` newest first
    pub(crate) fn list_cars(&self, owner: DbId, filter: &CarFilter, page: i64) -> Paginated<Car> {
        paginate(self.matching_cars(Some(owner), filter), page)
    }

    /// The cars of every user newest first, not paginated
    pub(crate) fn all_cars(&self, filter: &CarFilter) -> Vec<Car> {
        self.matching_cars(None, filter)
    }

    fn matching_cars(&self, owner: Option<DbId>, filter: &CarFilter) -> Vec<Car> {
        let guard = self.lock();
        let mut cars: Vec<Car> = guard
            .cars
            .iter()
            .filter(|x| owner.map_or(true, |owner| x.user == owner))
            .filter(|x| filter.matches(x))
            .cloned()
            .collect();
        cars.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        cars
    }

    pub(crate) fn filter_options(&self, owner: DbId) -> CarFilterOptions {
        let guard = self.lock();
        let owned = guard.cars.iter().filter(|x| x.user == owner);
        let mut brands: Vec<String> = owned.clone().map(|x| x.brand.clone()).collect();
        let mut motors: Vec<String> = owned.map(|x| x.motor.clone()).collect();
        for values in [&mut brands, &mut motors] {
            values.sort();
            values.dedup();
        }
        CarFilterOptions { brands, motors }
    }

    pub(crate) fn car(&self, owner: DbId, id: DbId) -> Result<Car, BackendError> {
        self.lock()
            .cars
            .iter()
            .find(|x| x.id == id && x.user == owner)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(MSG_CAR_NOT_FOUND_FOR_USER.to_string()))
    }

    pub(crate) fn create_car(&self, owner: DbId, fields: CarFields) -> CarFields {
        let car = self.lock().insert_car(owner, fields);
        CarFields::from(&car)
    }

    /// Only the owner may update a car
    pub(crate) fn update_car(
        &self,
        owner: DbId,
        id: DbId,
        fields: CarFields,
    ) -> Result<(), BackendError> {
        let mut guard = self.lock();
        let car = guard
            .cars
            .iter_mut()
            .find(|x| x.id == id && x.user == owner)
            .ok_or_else(|| BackendError::NotFound(MSG_CAR_NOT_FOUND_FOR_USER.to_string()))?;
        car.brand = fields.brand;
        car.model = fields.model;
        car.motor = fields.motor;
        car.updated_at = Utc::now();
        Ok(())
    }

    /// Deletes the car of `owner` or if [`None`] the car of any user
    pub(crate) fn delete_car(&self, owner: Option<DbId>, id: DbId) -> Result<(), BackendError> {
        let mut guard = self.lock();
        let before = guard.cars.len();
        guard
            .cars
            .retain(|x| !(x.id == id && owner.map_or(true, |owner| x.user == owner)));
        if guard.cars.len() == before {
            let msg = if owner.is_some() {
                MSG_CAR_NOT_FOUND_FOR_USER
            } else {
                MSG_CAR_NOT_FOUND
            };
            return Err(BackendError::NotFound(msg.to_string()));
        }
        Ok(())
    }
}

impl BackendState {
    fn next_id(&mut self) -> DbId {
        self.last_id += 1;
        self.last_id.into()
    }

    fn user(&self, id: DbId) -> Option<&StoredUser> {
        self.users.iter().find(|x| x.user.id == id)
    }

    fn user_mut(&mut self, id: DbId) -> Option<&mut StoredUser> {
        self.users.iter_mut().find(|x| x.user.id == id)
    }

    fn user_id_by_email(&self, email: &str) -> Option<DbId> {
        self.users
            .iter()
            .find(|x| x.user.email.as_deref() == Some(email))
            .map(|x| x.user.id)
    }

    fn user_by_link_mut(&mut self, link: &EmailLinkParams) -> Option<&mut StoredUser> {
        let id: DbId = link.uid.parse().ok()?;
        self.user_mut(id)
            .filter(|x| x.link_token.as_deref() == Some(link.token.as_str()))
    }

    /// Replaces any earlier link so only the newest one is valid
    fn send_link(&mut self, user_id: DbId, kind: EmailKind) {
        let token = Uuid::new_v4().simple().to_string();
        let Some(stored) = self.user_mut(user_id) else {
            return;
        };
        stored.link_token = Some(token.clone());
        let Some(to) = stored.user.email.clone() else {
            return;
        };
        info!(?kind, %to, "email sent");
        self.outbox.push(SentEmail {
            to,
            kind,
            link: EmailLinkParams::new(user_id.to_string(), token),
        });
    }

    fn insert_car(&mut self, owner: DbId, fields: CarFields) -> Car {
        let now = Utc::now();
        let car = Car {
            id: self.next_id(),
            user: owner,
            brand: fields.brand,
            model: fields.model,
            motor: fields.motor,
            created_at: now,
            updated_at: now,
        };
        self.cars.push(car.clone());
        car
    }
}

impl CarFilter {
    /// Both filters must match when both are given
    fn matches(&self, car: &Car) -> bool {
        [&self.brand, &self.motor]
            .into_iter()
            .flatten()
            .filter(|x| !x.is_empty())
            .all(|filter| filter_matches(filter, car))
    }
}

/// Any of the values may be part of either the brand or the motor
fn filter_matches(filter: &str, car: &Car) -> bool {
    filter
        .split(CAR_FILTER_SEPARATOR)
        .any(|value| car.brand.contains(value) || car.motor.contains(value))
}

/// The first page always exists, even if there are no items. Pages out of
/// range are answered with the last page.
fn paginate(items: Vec<Car>, page: i64) -> Paginated<Car> {
    let count = items.len() as u64;
    let pages = (count.div_ceil(u64::from(PAGE_SIZE)) as u32).max(1);
    let page = u32::try_from(page)
        .ok()
        .filter(|x| (1..=pages).contains(x))
        .unwrap_or(pages);
    let data = items
        .into_iter()
        .skip(((page - 1) * PAGE_SIZE) as usize)
        .take(PAGE_SIZE as usize)
        .collect();
    Paginated {
        count,
        pages,
        page,
        page_size: PAGE_SIZE,
        data,
    }
}

/// Anything that is not a number is read as the first page
pub(crate) fn parse_page(page: Option<&str>) -> i64 {
    page.and_then(|x| x.parse().ok()).unwrap_or(1)
}
