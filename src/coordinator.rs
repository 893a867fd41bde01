use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::api::ConnectApi;
use crate::auth::{AuthFlow, AuthStage, AuthState};

/// Which screen group the app shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Route {
    #[default]
    Login,
    Otp,
    Menu,
}

/// Observes the auth flow and switches the active route: login screens until
/// an OTP is pending, then the OTP screen, then the menu once authenticated.
/// On authentication the session token is installed on the shared gateway so
/// menu requests carry it.
pub struct AppCoordinator<A: ConnectApi + 'static> {
    auth: Arc<AuthFlow<A>>,
    api: Arc<A>,
    tx: Arc<watch::Sender<Route>>,
    watcher: Mutex<Option<JoinHandle<()>>>,
}

impl<A: ConnectApi + 'static> AppCoordinator<A> {
    pub fn new(auth: Arc<AuthFlow<A>>, api: Arc<A>) -> Self {
        let (tx, _) = watch::channel(Route::default());
        let tx = Arc::new(tx);

        let watcher = {
            let mut auth_rx = auth.subscribe();
            let tx = tx.clone();
            let api = api.clone();
            tokio::spawn(async move {
                loop {
                    apply_auth_state(&auth_rx.borrow_and_update().clone(), &tx, api.as_ref());
                    if auth_rx.changed().await.is_err() {
                        break;
                    }
                }
            })
        };

        Self {
            auth,
            api,
            tx,
            watcher: Mutex::new(Some(watcher)),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Route> {
        self.tx.subscribe()
    }

    pub fn route(&self) -> Route {
        *self.tx.borrow()
    }

    /// Drop the session: clear the gateway token, reset the auth flow and
    /// return to the login screen.
    pub fn logout(&self) {
        info!("Logging out");
        self.api.set_auth_token(None);
        self.auth.reset();
        self.tx.send_if_modified(|route| {
            let changed = *route != Route::Login;
            *route = Route::Login;
            changed
        });
    }
}

fn apply_auth_state<A: ConnectApi>(state: &AuthState, tx: &watch::Sender<Route>, api: &A) {
    let route = match state.stage {
        AuthStage::Idle | AuthStage::PhoneSubmitting => Route::Login,
        AuthStage::OtpPending | AuthStage::Verifying => Route::Otp,
        AuthStage::Authenticated => Route::Menu,
    };

    if state.stage == AuthStage::Authenticated {
        if let Some(token) = state.session.as_ref().and_then(|s| s.auth_token.clone()) {
            api.set_auth_token(Some(token));
        }
    }

    tx.send_if_modified(|current| {
        if *current != route {
            debug!("Route change: {:?} -> {:?}", current, route);
            *current = route;
            true
        } else {
            false
        }
    });
}

impl<A: ConnectApi + 'static> Drop for AppCoordinator<A> {
    fn drop(&mut self) {
        if let Some(watcher) = self.watcher.lock().unwrap().take() {
            watcher.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockConnectApi;

    const PHONE: &str = "5551234567";

    async fn settle() {
        // Let the watcher task observe the latest auth state
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }

    fn setup() -> (
        Arc<MockConnectApi>,
        Arc<AuthFlow<MockConnectApi>>,
        AppCoordinator<MockConnectApi>,
    ) {
        let api = Arc::new(MockConnectApi::new());
        let auth = Arc::new(AuthFlow::new(api.clone(), 30));
        let coordinator = AppCoordinator::new(auth.clone(), api.clone());
        (api, auth, coordinator)
    }

    #[tokio::test]
    async fn test_initial_route_is_login() {
        let (_, _, coordinator) = setup();
        settle().await;
        assert_eq!(coordinator.route(), Route::Login);
    }

    #[tokio::test]
    async fn test_route_follows_auth_progress() {
        let (api, auth, coordinator) = setup();

        auth.submit_phone(PHONE).await;
        settle().await;
        assert_eq!(coordinator.route(), Route::Otp);

        auth.verify_otp("123456").await;
        settle().await;
        assert_eq!(coordinator.route(), Route::Menu);

        // The session token now rides on every gateway request
        let token = api.auth_token().expect("token installed on gateway");
        assert!(token.starts_with("token-"));
    }

    #[tokio::test]
    async fn test_logout_clears_token_and_returns_to_login() {
        let (api, auth, coordinator) = setup();
        auth.submit_phone(PHONE).await;
        auth.verify_otp("123456").await;
        settle().await;
        assert_eq!(coordinator.route(), Route::Menu);

        coordinator.logout();
        settle().await;

        assert_eq!(coordinator.route(), Route::Login);
        assert_eq!(api.auth_token(), None);
        assert_eq!(auth.state().stage, AuthStage::Idle);
    }

    #[tokio::test]
    async fn test_failed_login_stays_on_login_route() {
        let (api, auth, coordinator) = setup();
        api.fail
            .login
            .store(true, std::sync::atomic::Ordering::SeqCst);

        auth.submit_phone(PHONE).await;
        settle().await;

        assert_eq!(coordinator.route(), Route::Login);
    }
}
