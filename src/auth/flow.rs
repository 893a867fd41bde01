use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::cooldown::ResendCooldown;
use super::session::Session;
use crate::api::models::{LoginRequest, ResendOtpRequest, User, VerifyOtpRequest};
use crate::api::ConnectApi;
use crate::error::ConnectError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthStage {
    #[default]
    Idle,
    PhoneSubmitting,
    OtpPending,
    Verifying,
    /// Terminal for this flow; only `reset` leaves it.
    Authenticated,
}

/// Resend gate as the view renders it: a ticking countdown and whether the
/// resend button is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResendState {
    pub remaining_secs: u32,
    pub can_resend: bool,
}

/// Everything the login and OTP screens render. A failure never escapes the
/// flow; it lands here as the prior recoverable stage plus `error`.
#[derive(Debug, Clone, Default)]
pub struct AuthState {
    pub stage: AuthStage,
    pub session: Option<Session>,
    pub user: Option<User>,
    pub error: Option<String>,
    pub resend: ResendState,
}

/// Sequences phone submission, OTP verification and resend against the
/// gateway, publishing state snapshots through a watch channel the view
/// layer subscribes to.
pub struct AuthFlow<A: ConnectApi> {
    api: Arc<A>,
    tx: Arc<watch::Sender<AuthState>>,
    cooldown: ResendCooldown,
}

impl<A: ConnectApi> AuthFlow<A> {
    pub fn new(api: Arc<A>, cooldown_secs: u32) -> Self {
        let (tx, _) = watch::channel(AuthState::default());
        Self {
            api,
            tx: Arc::new(tx),
            cooldown: ResendCooldown::new(cooldown_secs),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.tx.subscribe()
    }

    pub fn state(&self) -> AuthState {
        self.tx.borrow().clone()
    }

    /// Validate and submit the phone number. Only meaningful from `Idle`;
    /// once authenticated this is a no-op.
    pub async fn submit_phone(&self, number: &str) {
        if self.state().stage != AuthStage::Idle {
            debug!("Ignoring phone submission in stage {:?}", self.state().stage);
            return;
        }
        if let Err(e) = validate_phone_number(number) {
            debug!("Rejected phone number before sending: {}", e);
            self.tx.send_modify(|state| state.error = Some(e.to_string()));
            return;
        }

        self.tx.send_modify(|state| {
            state.stage = AuthStage::PhoneSubmitting;
            state.error = None;
        });

        info!("Submitting phone number for login");
        let request = LoginRequest {
            phone_number: number.to_string(),
        };
        match self.api.login(&request).await {
            Ok(response) => {
                info!("OTP sent, session {}", response.session_id);
                self.tx.send_modify(|state| {
                    state.session = Some(Session::new(
                        number,
                        &response.session_id,
                        response.expires_in_seconds,
                    ));
                    state.stage = AuthStage::OtpPending;
                });
                self.cooldown.start(self.tx.clone());
            }
            Err(e) => {
                warn!("Login request failed: {}", e);
                self.tx.send_modify(|state| {
                    state.stage = AuthStage::Idle;
                    state.error = Some(e.user_message());
                });
            }
        }
    }

    /// Validate and verify the entered OTP. On success the flow reaches
    /// `Authenticated`; on rejection it returns to `OtpPending` with the
    /// error set and the entered code left for the user to correct.
    pub async fn verify_otp(&self, code: &str) {
        let snapshot = self.state();
        if snapshot.stage != AuthStage::OtpPending {
            debug!("Ignoring OTP verification in stage {:?}", snapshot.stage);
            return;
        }
        let Some(session) = snapshot.session else {
            warn!("No session while OTP pending");
            return;
        };
        if let Err(e) = validate_otp(code) {
            debug!("Rejected OTP before sending: {}", e);
            self.tx.send_modify(|state| state.error = Some(e.to_string()));
            return;
        }

        self.tx.send_modify(|state| {
            state.stage = AuthStage::Verifying;
            state.error = None;
        });

        let request = VerifyOtpRequest {
            session_id: session.session_id.clone(),
            phone_number: session.phone_number.clone(),
            otp: code.to_string(),
        };
        match self.api.verify_otp(&request).await {
            Ok(response) => {
                info!("OTP verified, user {} authenticated", response.user.id);
                self.cooldown.cancel();
                self.tx.send_modify(|state| {
                    if let Some(session) = state.session.as_mut() {
                        session.auth_token = Some(response.token.clone());
                        session.otp_verified = true;
                    }
                    state.user = Some(response.user.clone());
                    state.stage = AuthStage::Authenticated;
                });
            }
            Err(e) => {
                warn!("OTP verification failed: {}", e);
                self.tx.send_modify(|state| {
                    state.stage = AuthStage::OtpPending;
                    state.error = Some(e.user_message());
                });
            }
        }
    }

    /// Request a fresh OTP. Ignored while the cooldown is still ticking; a
    /// successful resend restarts it, a failed one leaves it alone.
    pub async fn resend_otp(&self) {
        let snapshot = self.state();
        if snapshot.stage != AuthStage::OtpPending || !snapshot.resend.can_resend {
            debug!("Resend not available yet");
            return;
        }
        let Some(session) = snapshot.session else {
            warn!("No session while OTP pending");
            return;
        };

        let request = ResendOtpRequest {
            session_id: session.session_id.clone(),
            phone_number: session.phone_number.clone(),
        };
        match self.api.resend_otp(&request).await {
            Ok(response) if response.success => {
                info!("OTP resent");
                if let Some(new_id) = response.session_id {
                    self.tx.send_modify(|state| {
                        if let Some(session) = state.session.as_mut() {
                            session.session_id = new_id.clone();
                        }
                    });
                }
                self.cooldown.start(self.tx.clone());
            }
            Ok(_) => {
                warn!("Server declined to resend OTP");
                self.tx.send_modify(|state| {
                    state.error = Some("Could not resend the code. Please try again.".to_string());
                });
            }
            Err(e) => {
                warn!("Resend request failed: {}", e);
                self.tx
                    .send_modify(|state| state.error = Some(e.user_message()));
            }
        }
    }

    /// Drop the session and return to a fresh `Idle` state (logout path).
    pub fn reset(&self) {
        info!("Resetting auth flow");
        self.cooldown.cancel();
        self.tx.send_modify(|state| *state = AuthState::default());
    }
}

fn validate_phone_number(number: &str) -> Result<(), ConnectError> {
    let digits = number.chars().filter(char::is_ascii_digit).count();
    if digits < 10 {
        return Err(ConnectError::Validation(
            "Please enter a valid phone number".to_string(),
        ));
    }
    Ok(())
}

fn validate_otp(code: &str) -> Result<(), ConnectError> {
    if code.len() != 6 || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(ConnectError::Validation(
            "Please enter a valid 6-digit OTP".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::api::mock::{MockConnectApi, REJECTED_OTP};

    const COOLDOWN_SECS: u32 = 30;
    const PHONE: &str = "5551234567";
    const OTP: &str = "123456";

    fn flow_with(api: Arc<MockConnectApi>) -> Arc<AuthFlow<MockConnectApi>> {
        Arc::new(AuthFlow::new(api, COOLDOWN_SECS))
    }

    async fn authenticated_flow() -> (Arc<MockConnectApi>, Arc<AuthFlow<MockConnectApi>>) {
        let api = Arc::new(MockConnectApi::new());
        let flow = flow_with(api.clone());
        flow.submit_phone(PHONE).await;
        flow.verify_otp(OTP).await;
        assert_eq!(flow.state().stage, AuthStage::Authenticated);
        (api, flow)
    }

    #[test]
    fn test_phone_validation_counts_digits_only() {
        assert!(validate_phone_number("555-123-4567").is_ok());
        assert!(validate_phone_number("(555) 123 4567").is_ok());
        assert!(validate_phone_number("555123456").is_err());
        assert!(validate_phone_number("abcdefghij").is_err());
    }

    #[test]
    fn test_otp_validation_requires_six_digits() {
        assert!(validate_otp("123456").is_ok());
        assert!(validate_otp("12345").is_err());
        assert!(validate_otp("1234567").is_err());
        assert!(validate_otp("12a456").is_err());
    }

    #[tokio::test]
    async fn test_short_phone_never_reaches_gateway() {
        let api = Arc::new(MockConnectApi::new());
        let flow = flow_with(api.clone());

        flow.submit_phone("555123").await;

        assert_eq!(api.login_calls(), 0);
        let state = flow.state();
        assert_eq!(state.stage, AuthStage::Idle);
        assert_eq!(
            state.error.as_deref(),
            Some("Please enter a valid phone number")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_phone_transitions_through_submitting() {
        let api = Arc::new(MockConnectApi::new().with_delay(Duration::from_millis(100)));
        let flow = flow_with(api.clone());

        let task = {
            let flow = flow.clone();
            tokio::spawn(async move { flow.submit_phone(PHONE).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(flow.state().stage, AuthStage::PhoneSubmitting);

        task.await.unwrap();
        let state = flow.state();
        assert_eq!(state.stage, AuthStage::OtpPending);
        let session = state.session.unwrap();
        assert!(!session.session_id.is_empty());
        assert_eq!(session.phone_number, PHONE);
        assert!(!session.otp_verified);
        // Cooldown armed on entering OtpPending
        assert_eq!(state.resend.remaining_secs, COOLDOWN_SECS);
        assert!(!state.resend.can_resend);
    }

    #[tokio::test]
    async fn test_failed_login_returns_to_idle_and_is_retryable() {
        let api = Arc::new(MockConnectApi::new());
        api.fail.login.store(true, std::sync::atomic::Ordering::SeqCst);
        let flow = flow_with(api.clone());

        flow.submit_phone(PHONE).await;
        let state = flow.state();
        assert_eq!(state.stage, AuthStage::Idle);
        assert!(state.error.is_some());
        assert!(state.session.is_none());

        api.fail.login.store(false, std::sync::atomic::Ordering::SeqCst);
        flow.submit_phone(PHONE).await;
        assert_eq!(flow.state().stage, AuthStage::OtpPending);
        assert_eq!(api.login_calls(), 2);
    }

    #[tokio::test]
    async fn test_bad_otp_shape_never_reaches_gateway() {
        let api = Arc::new(MockConnectApi::new());
        let flow = flow_with(api.clone());
        flow.submit_phone(PHONE).await;

        flow.verify_otp("12345").await;
        flow.verify_otp("12a456").await;

        assert_eq!(api.verify_calls(), 0);
        let state = flow.state();
        assert_eq!(state.stage, AuthStage::OtpPending);
        assert_eq!(
            state.error.as_deref(),
            Some("Please enter a valid 6-digit OTP")
        );
    }

    #[tokio::test]
    async fn test_verify_before_submit_is_ignored() {
        let api = Arc::new(MockConnectApi::new());
        let flow = flow_with(api.clone());

        flow.verify_otp(OTP).await;

        assert_eq!(api.verify_calls(), 0);
        assert_eq!(flow.state().stage, AuthStage::Idle);
    }

    #[tokio::test]
    async fn test_verify_success_is_terminal() {
        let (api, flow) = authenticated_flow().await;

        let state = flow.state();
        let session = state.session.unwrap();
        assert!(session.otp_verified);
        assert!(session.auth_token.is_some());
        assert_eq!(state.user.unwrap().phone_number, PHONE);

        // Authenticated is terminal: further submissions are ignored
        flow.submit_phone(PHONE).await;
        assert_eq!(api.login_calls(), 1);
        assert_eq!(flow.state().stage, AuthStage::Authenticated);
    }

    #[tokio::test]
    async fn test_rejected_otp_keeps_flow_recoverable() {
        let api = Arc::new(MockConnectApi::new());
        let flow = flow_with(api.clone());
        flow.submit_phone(PHONE).await;

        flow.verify_otp(REJECTED_OTP).await;
        let state = flow.state();
        assert_eq!(state.stage, AuthStage::OtpPending);
        assert_eq!(state.error.as_deref(), Some("Invalid OTP"));

        flow.verify_otp(OTP).await;
        assert_eq!(flow.state().stage, AuthStage::Authenticated);
        assert_eq!(api.verify_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resend_blocked_until_cooldown_elapses() {
        let api = Arc::new(MockConnectApi::new());
        let flow = flow_with(api.clone());
        flow.submit_phone(PHONE).await;
        let original_session = flow.state().session.unwrap().session_id;

        flow.resend_otp().await;
        assert_eq!(api.resend_calls(), 0);

        tokio::time::sleep(Duration::from_millis(30_100)).await;
        assert!(flow.state().resend.can_resend);

        flow.resend_otp().await;
        assert_eq!(api.resend_calls(), 1);

        let state = flow.state();
        // Server rotated the session id and the cooldown restarted
        assert_ne!(state.session.unwrap().session_id, original_session);
        assert_eq!(state.resend.remaining_secs, COOLDOWN_SECS);
        assert!(!state.resend.can_resend);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_resend_does_not_reset_cooldown() {
        let api = Arc::new(MockConnectApi::new());
        let flow = flow_with(api.clone());
        flow.submit_phone(PHONE).await;

        tokio::time::sleep(Duration::from_millis(30_100)).await;
        api.fail.resend.store(true, std::sync::atomic::Ordering::SeqCst);
        flow.resend_otp().await;

        let state = flow.state();
        assert_eq!(api.resend_calls(), 1);
        assert!(state.error.is_some());
        assert!(state.resend.can_resend, "timer must stay elapsed on failure");
    }

    #[tokio::test]
    async fn test_reset_returns_to_fresh_idle() {
        let (api, flow) = authenticated_flow().await;

        flow.reset();
        let state = flow.state();
        assert_eq!(state.stage, AuthStage::Idle);
        assert!(state.session.is_none());
        assert!(state.user.is_none());
        assert!(state.error.is_none());

        // The flow is usable again after a reset
        flow.submit_phone(PHONE).await;
        assert_eq!(flow.state().stage, AuthStage::OtpPending);
        assert_eq!(api.login_calls(), 2);
    }
}
