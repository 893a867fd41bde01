pub mod client;
pub mod endpoint;
pub mod mock;
pub mod models;

pub use client::ApiClient;
pub use endpoint::{Endpoint, HttpMethod};
pub use models::{
    FavoriteRequest, LoginRequest, LoginResponse, ResendOtpRequest, ResendOtpResponse, User,
    VerifyOtpRequest, VerifyOtpResponse,
};

use async_trait::async_trait;

use crate::error::NetworkError;
use crate::menu::{MenuCategory, MenuItem, MenuItemDetail};

/// The gateway seam the flows depend on. `ApiClient` implements it against
/// the real backend; `mock::MockConnectApi` implements it with canned data
/// for development and tests.
#[async_trait]
pub trait ConnectApi: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, NetworkError>;

    async fn verify_otp(
        &self,
        request: &VerifyOtpRequest,
    ) -> Result<VerifyOtpResponse, NetworkError>;

    async fn resend_otp(
        &self,
        request: &ResendOtpRequest,
    ) -> Result<ResendOtpResponse, NetworkError>;

    async fn fetch_categories(&self) -> Result<Vec<MenuCategory>, NetworkError>;

    async fn fetch_items(&self, category_id: &str) -> Result<Vec<MenuItem>, NetworkError>;

    async fn fetch_item_detail(&self, item_id: &str) -> Result<MenuItemDetail, NetworkError>;

    async fn set_favorite(&self, item_id: &str, is_favorite: bool) -> Result<bool, NetworkError>;

    /// Install or clear the bearer token attached to subsequent requests.
    fn set_auth_token(&self, token: Option<String>);
}
