use anyhow::Context;
use car_notes_shared::{
    const_config::{
        csrf::CSRF_HEADER_NAME,
        path::{
            PathSpec, PATH_AUTH_IS_AUTHENTICATED, PATH_AUTH_LOGOUT, PATH_AUTH_LOGOUT_ALL,
        },
    },
    errors::{is_auth_failure_status, ApiError, ErrorBody},
    user::{User, UserEnvelope},
};
use closure_traits::{ChannelCallBack, ChannelCallBackOutput};
use futures::channel::oneshot;
use reqwest::StatusCode;
use std::{
    any::Any,
    fmt::Debug,
    sync::{Arc, Mutex, MutexGuard},
};
use tracing::{info, warn};

use crate::{
    cache::{CacheTag, QueryCache, QueryKey, QueryState},
    session::SessionStore,
};

pub mod api;

/// Use as the arguments of requests that do not send any
pub const NO_ARGS: Option<&()> = None;

#[derive(Debug, Clone)]
pub struct Client {
    api_client: reqwest::Client,
    #[cfg(not(target_arch = "wasm32"))]
    cookie_jar: Arc<reqwest::cookie::Jar>,
    inner: Arc<Mutex<ClientInner>>,
}

#[derive(Debug)]
struct ClientInner {
    server_address: String,
    session: SessionStore,
    cache: QueryCache,
}

impl Default for Client {
    fn default() -> Self {
        Self::new(
            car_notes_shared::const_config::client::CLIENT_DEFAULT_SERVER_URL.to_string(),
        )
    }
}

impl ClientInner {
    #[tracing::instrument]
    fn new(server_address: String) -> Self {
        Self {
            server_address,
            session: Default::default(),
            cache: Default::default(),
        }
    }
}

/// Side effect of a request that succeeded, applied before the caller is
/// notified
#[derive(Debug)]
pub(crate) enum OnSuccess {
    Nothing,
    Invalidate(Vec<CacheTag>),
    EndSession,
}

/// What to do with the response of a query once it arrives
pub(crate) struct PendingQuery<T> {
    key: QueryKey,
    path_spec: PathSpec,
    path: String,
    provides: fn(Option<&T>) -> Vec<CacheTag>,
}

impl Client {
    /// `server_address` is the base all endpoint paths are appended to, for
    /// example `http://localhost:8000/api`
    #[tracing::instrument(name = "NEW CLIENT-CORE")]
    pub fn new(server_address: String) -> Self {
        let server_address = server_address.trim_end_matches('/').to_string();

        #[cfg(not(target_arch = "wasm32"))]
        let cookie_jar = Arc::new(reqwest::cookie::Jar::default());
        #[cfg(not(target_arch = "wasm32"))]
        let builder = reqwest::Client::builder().cookie_provider(Arc::clone(&cookie_jar));
        #[cfg(target_arch = "wasm32")]
        let builder = reqwest::Client::builder();

        let api_client = builder.build().expect("Unable to create reqwest client");
        Self {
            api_client,
            #[cfg(not(target_arch = "wasm32"))]
            cookie_jar,
            inner: Arc::new(Mutex::new(ClientInner::new(server_address))),
        }
    }

    pub fn server_address(&self) -> String {
        self.lock_inner().server_address.clone()
    }

    pub fn user(&self) -> Option<Arc<User>> {
        self.lock_inner().session.user()
    }

    pub fn is_logged_in(&self) -> bool {
        self.lock_inner().session.is_logged_in()
    }

    /// Returns `true` if there is no cached query data
    pub fn is_cache_empty(&self) -> bool {
        self.lock_inner().cache.is_empty()
    }

    /// Clears the session and all cached data then tells the server, without
    /// waiting for or checking the response
    #[tracing::instrument]
    pub fn logout_no_wait(&self) {
        self.end_session();
        self.send_request_no_wait(PATH_AUTH_LOGOUT, &[], NO_ARGS);
    }

    fn end_session(&self) {
        let mut guard = self.lock_inner();
        guard.session.clear();
        guard.cache.purge();
    }

    fn store_user(&self, user: User) -> Arc<User> {
        self.lock_inner().session.set_user(user)
    }

    fn lock_inner(&self) -> MutexGuard<'_, ClientInner> {
        self.inner.lock().expect("mutex poisoned")
    }

    /// Returns the value of the CSRF cookie if the server has set one
    pub fn csrf_token(&self) -> Option<String> {
        #[cfg(not(target_arch = "wasm32"))]
        {
            crate::csrf::read_token(&self.cookie_jar, &self.server_address())
        }
        #[cfg(target_arch = "wasm32")]
        {
            crate::csrf::read_token()
        }
    }

    #[tracing::instrument(skip(args, on_done))]
    // WARNING: Must skip args as it my contain sensitive info and "safe" versions
    // would usually already be logged by the caller
    fn initiate_request<T, F, O>(
        &self,
        path_spec: PathSpec,
        path: &str,
        args: Option<&T>,
        on_done: F,
    ) where
        T: serde::Serialize + ?Sized,
        F: ChannelCallBack<O>,
        O: ChannelCallBackOutput,
    {
        let is_mutating = path_spec.is_mutating();
        let mut request = self
            .api_client
            .request(path_spec.method, self.path_to_url(path));
        if let Some(args) = args {
            request = if is_mutating {
                request.json(args)
            } else {
                request.query(args)
            };
        }
        if let Some(token) = self.csrf_token() {
            request = request.header(CSRF_HEADER_NAME, token);
        }
        #[cfg(target_arch = "wasm32")]
        {
            request = request.fetch_credentials_include();
        }
        reqwest_cross::fetch(request, on_done)
    }

    /// Ends the session if the response shows the server no longer accepts it
    ///
    /// The original result is left for the caller to process as usual
    fn intercept_auth_failure(
        &self,
        path_spec: &PathSpec,
        response: &reqwest::Result<reqwest::Response>,
    ) {
        let Ok(response) = response else {
            return;
        };
        if is_auth_failure_status(response.status().as_u16())
            && is_intercepted_path(path_spec)
        {
            warn!(
                status = ?response.status(),
                path = path_spec.path,
                "authorization failed, ending session"
            );
            self.logout_no_wait();
        }
    }

    /// Sends the request and returns the body parsed from json
    fn send_request_expect_json<F, T, U>(
        &self,
        path_spec: PathSpec,
        path_params: &[(&str, &str)],
        args: Option<&T>,
        on_success: OnSuccess,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<U>>
    where
        T: serde::Serialize + ?Sized,
        F: UiCallBack,
        U: Send + Debug + serde::de::DeserializeOwned + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let client = self.clone();
        let spec = path_spec.clone();
        let on_done = move |resp: reqwest::Result<reqwest::Response>| async move {
            client.intercept_auth_failure(&spec, &resp);
            let msg = process_json_body(resp).await;
            if msg.is_ok() {
                client.apply(on_success);
            }
            send_to_caller(tx, msg);
            ui_notify();
        };
        let path = path_spec.with_params(path_params);
        self.initiate_request(path_spec, &path, args, on_done);
        rx
    }

    /// Same as [`Self::send_request_expect_json`] but for responses without a
    /// body
    fn send_request_expect_empty<F, T>(
        &self,
        path_spec: PathSpec,
        path_params: &[(&str, &str)],
        args: Option<&T>,
        on_success: OnSuccess,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<()>>
    where
        T: serde::Serialize + ?Sized,
        F: UiCallBack,
    {
        let (tx, rx) = oneshot::channel();
        let client = self.clone();
        let spec = path_spec.clone();
        let on_done = move |resp: reqwest::Result<reqwest::Response>| async move {
            client.intercept_auth_failure(&spec, &resp);
            let msg = process_empty(resp).await;
            if msg.is_ok() {
                client.apply(on_success);
            }
            send_to_caller(tx, msg);
            ui_notify();
        };
        let path = path_spec.with_params(path_params);
        self.initiate_request(path_spec, &path, args, on_done);
        rx
    }

    /// For the requests that return the user of the session
    ///
    /// The user is stored on success. If `end_session_on_failure` is set any
    /// failure ends the session, otherwise the session is left as is.
    fn send_request_expect_user<F, T>(
        &self,
        path_spec: PathSpec,
        args: Option<&T>,
        end_session_on_failure: bool,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<Arc<User>>>
    where
        T: serde::Serialize + ?Sized,
        F: UiCallBack,
    {
        let (tx, rx) = oneshot::channel();
        let client = self.clone();
        let spec = path_spec.clone();
        let on_done = move |resp: reqwest::Result<reqwest::Response>| async move {
            client.intercept_auth_failure(&spec, &resp);
            let msg = match process_json_body::<UserEnvelope>(resp).await {
                Ok(envelope) => Ok(client.store_user(envelope.user)),
                Err(e) => {
                    if end_session_on_failure {
                        client.logout_no_wait();
                    }
                    Err(e)
                }
            };
            send_to_caller(tx, msg);
            ui_notify();
        };
        let path = path_spec.path;
        self.initiate_request(path_spec, path, args, on_done);
        rx
    }

    fn send_request_no_wait<T>(
        &self,
        path_spec: PathSpec,
        path_params: &[(&str, &str)],
        args: Option<&T>,
    ) where
        T: serde::Serialize + ?Sized,
    {
        let path = path_spec.with_params(path_params);
        self.initiate_request(path_spec, &path, args, |_| async {});
    }

    /// Reads the query through the cache, sending a request only if the
    /// cache needs one
    fn query<F, T, U>(
        &self,
        pending: PendingQuery<U>,
        args: Option<&T>,
        ui_notify: F,
    ) -> QueryState<U>
    where
        T: serde::Serialize + ?Sized,
        F: UiCallBack,
        U: Send + Sync + Debug + serde::de::DeserializeOwned + 'static,
    {
        let (state, ticket) = self.lock_inner().cache.read::<U>(&pending.key);
        let Some(ticket) = ticket else {
            return state;
        };
        let client = self.clone();
        let PendingQuery {
            key: _,
            path_spec,
            path,
            provides,
        } = pending;
        let spec = path_spec.clone();
        let on_done = move |resp: reqwest::Result<reqwest::Response>| async move {
            client.intercept_auth_failure(&spec, &resp);
            let result = process_json_body::<U>(resp).await;
            let tags = provides(result.as_ref().ok());
            let outcome = result
                .map(|data| Arc::new(data) as Arc<dyn Any + Send + Sync>)
                .map_err(|e| format!("{e:#}"));
            client.lock_inner().cache.complete(ticket, outcome, tags);
            ui_notify();
        };
        self.initiate_request(path_spec, &path, args, on_done);
        state
    }

    fn apply(&self, on_success: OnSuccess) {
        match on_success {
            OnSuccess::Nothing => {}
            OnSuccess::Invalidate(tags) => {
                let count = self.lock_inner().cache.invalidate(&tags);
                info!(?tags, count, "invalidated cached queries");
            }
            OnSuccess::EndSession => self.end_session(),
        }
    }

    #[tracing::instrument(ret)]
    fn path_to_url(&self, path: &str) -> String {
        format!("{}{path}", &self.lock_inner().server_address)
    }
}

/// Requests that already end the session themselves are not intercepted
fn is_intercepted_path(path_spec: &PathSpec) -> bool {
    ![
        PATH_AUTH_LOGOUT.path,
        PATH_AUTH_LOGOUT_ALL.path,
        PATH_AUTH_IS_AUTHENTICATED.path,
    ]
    .contains(&path_spec.path)
}

/// The caller may have stopped waiting (for example the page was left) which
/// is not an error
fn send_to_caller<T>(tx: oneshot::Sender<anyhow::Result<T>>, msg: anyhow::Result<T>) {
    if tx.send(msg).is_err() {
        info!("receiver dropped before the response arrived");
    }
}

#[tracing::instrument(ret, err(Debug))]
async fn process_empty(response: reqwest::Result<reqwest::Response>) -> anyhow::Result<()> {
    let (response, status) = extract_response(response)?;
    if status.is_success() {
        Ok(())
    } else {
        Err(handle_error(response).await)
    }
}

#[tracing::instrument(ret, err(Debug))]
async fn process_json_body<T>(response: reqwest::Result<reqwest::Response>) -> anyhow::Result<T>
where
    T: Debug + serde::de::DeserializeOwned,
{
    let (response, status) = extract_response(response)?;
    if status.is_success() {
        Ok(response
            .json()
            .await
            .context("failed to parse result as json")?)
    } else {
        Err(handle_error(response).await)
    }
}

/// Response bodies of failed requests are kept as [`ApiError`] so callers
/// can get per field messages
#[tracing::instrument(ret)]
async fn handle_error(response: reqwest::Response) -> anyhow::Error {
    let status = response.status();
    debug_assert!(
        !status.is_success(),
        "this is supposed to be an error, right? Status code is: {status}"
    );
    let body = match response.text().await {
        Ok(text) => ErrorBody::parse(&text),
        Err(e) => {
            return anyhow::Error::from(e).context(format!(
                "failed to get response body. Status code: {status}"
            ))
        }
    };
    ApiError::new(status.as_u16(), body).into()
}

/// Provides a way to standardize the error message
#[tracing::instrument(ret, err(Debug))]
fn extract_response(
    response: reqwest::Result<reqwest::Response>,
) -> anyhow::Result<(reqwest::Response, StatusCode)> {
    if response.is_err() {
        info!("Response is err: {:#?}", response);
    }
    let response = response.context("failed to send request")?;
    let status = response.status();
    Ok((response, status))
}

pub trait UiCallBack: 'static + Send + FnOnce() {}
impl<T> UiCallBack for T where T: 'static + Send + FnOnce() {}

#[cfg(not(target_arch = "wasm32"))]
pub mod closure_traits {
    pub trait ChannelCallBack<O>:
        'static + Send + FnOnce(reqwest::Result<reqwest::Response>) -> O
    {
    }
    impl<T, O> ChannelCallBack<O> for T where
        T: 'static + Send + FnOnce(reqwest::Result<reqwest::Response>) -> O
    {
    }
    pub trait ChannelCallBackOutput: futures::Future<Output = ()> + Send {}
    impl<T> ChannelCallBackOutput for T where T: futures::Future<Output = ()> + Send {}
}

#[cfg(target_arch = "wasm32")]
pub mod closure_traits {
    pub trait ChannelCallBack<O>:
        'static + FnOnce(reqwest::Result<reqwest::Response>) -> O
    {
    }
    impl<T, O> ChannelCallBack<O> for T where
        T: 'static + FnOnce(reqwest::Result<reqwest::Response>) -> O
    {
    }
    pub trait ChannelCallBackOutput: futures::Future<Output = ()> {}
    impl<T> ChannelCallBackOutput for T where T: futures::Future<Output = ()> {}
}
