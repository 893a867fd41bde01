//! In-memory gateway double with canned restaurant data. Stands in for the
//! real backend during development and drives the flow tests: every call is
//! counted, failures can be injected per operation, and responses can be
//! delayed to exercise in-flight behavior.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::models::{
    LoginRequest, LoginResponse, ResendOtpRequest, ResendOtpResponse, User, VerifyOtpRequest,
    VerifyOtpResponse,
};
use super::ConnectApi;
use crate::error::NetworkError;
use crate::menu::{MenuCategory, MenuItem, MenuItemDetail, NutritionalInfo};

/// The OTP the mock always rejects, for exercising the wrong-code path.
pub const REJECTED_OTP: &str = "000000";

/// Per-operation failure switches. Setting a flag makes the matching call
/// return a transport error until the flag is cleared.
#[derive(Debug, Default)]
pub struct FailureFlags {
    pub login: AtomicBool,
    pub verify: AtomicBool,
    pub resend: AtomicBool,
    pub categories: AtomicBool,
    pub items: AtomicBool,
    pub detail: AtomicBool,
    pub favorite: AtomicBool,
}

fn fail_if(flag: &AtomicBool) -> Result<(), NetworkError> {
    if flag.load(Ordering::SeqCst) {
        Err(NetworkError::Transport("connection refused".to_string()))
    } else {
        Ok(())
    }
}

#[derive(Debug, Default)]
struct CallCounts {
    login: AtomicUsize,
    verify: AtomicUsize,
    resend: AtomicUsize,
    categories: AtomicUsize,
    items: AtomicUsize,
    detail: AtomicUsize,
    favorite: AtomicUsize,
}

pub struct MockConnectApi {
    delay: Duration,
    categories: Vec<MenuCategory>,
    items: HashMap<String, Vec<MenuItem>>,
    details: HashMap<String, MenuItemDetail>,
    session_counter: AtomicU64,
    item_delays: Mutex<HashMap<String, Duration>>,
    auth_token: Mutex<Option<String>>,
    pub fail: FailureFlags,
    calls: CallCounts,
}

impl MockConnectApi {
    /// A mock pre-loaded with the sample menu and no artificial delay.
    pub fn new() -> Self {
        let (categories, items, details) = sample_menu();
        Self {
            delay: Duration::ZERO,
            categories,
            items,
            details,
            session_counter: AtomicU64::new(0),
            item_delays: Mutex::new(HashMap::new()),
            auth_token: Mutex::new(None),
            fail: FailureFlags::default(),
            calls: CallCounts::default(),
        }
    }

    /// Apply a fixed delay before every response.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Delay item fetches for one category only, overriding the default delay.
    pub fn set_items_delay(&self, category_id: &str, delay: Duration) {
        self.item_delays
            .lock()
            .unwrap()
            .insert(category_id.to_string(), delay);
    }

    pub fn auth_token(&self) -> Option<String> {
        self.auth_token.lock().unwrap().clone()
    }

    pub fn login_calls(&self) -> usize {
        self.calls.login.load(Ordering::SeqCst)
    }

    pub fn verify_calls(&self) -> usize {
        self.calls.verify.load(Ordering::SeqCst)
    }

    pub fn resend_calls(&self) -> usize {
        self.calls.resend.load(Ordering::SeqCst)
    }

    pub fn categories_calls(&self) -> usize {
        self.calls.categories.load(Ordering::SeqCst)
    }

    pub fn items_calls(&self) -> usize {
        self.calls.items.load(Ordering::SeqCst)
    }

    pub fn detail_calls(&self) -> usize {
        self.calls.detail.load(Ordering::SeqCst)
    }

    pub fn favorite_calls(&self) -> usize {
        self.calls.favorite.load(Ordering::SeqCst)
    }

    fn next_session_id(&self) -> String {
        let n = self.session_counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("session-{n}")
    }

    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

impl Default for MockConnectApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConnectApi for MockConnectApi {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, NetworkError> {
        self.calls.login.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        fail_if(&self.fail.login)?;
        debug_assert!(!request.phone_number.is_empty());
        Ok(LoginResponse {
            session_id: self.next_session_id(),
            expires_in_seconds: 300,
        })
    }

    async fn verify_otp(
        &self,
        request: &VerifyOtpRequest,
    ) -> Result<VerifyOtpResponse, NetworkError> {
        self.calls.verify.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        fail_if(&self.fail.verify)?;
        if request.otp == REJECTED_OTP {
            return Err(NetworkError::Http {
                status: 401,
                message: Some("Invalid OTP".to_string()),
            });
        }
        Ok(VerifyOtpResponse {
            token: format!("token-for-{}", request.session_id),
            expires_in_seconds: 3600,
            user: User {
                id: "user-1".to_string(),
                phone_number: request.phone_number.clone(),
                name: None,
                email: None,
            },
        })
    }

    async fn resend_otp(
        &self,
        request: &ResendOtpRequest,
    ) -> Result<ResendOtpResponse, NetworkError> {
        self.calls.resend.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        fail_if(&self.fail.resend)?;
        debug_assert!(!request.session_id.is_empty());
        Ok(ResendOtpResponse {
            success: true,
            session_id: Some(self.next_session_id()),
            expires_in_seconds: 300,
        })
    }

    async fn fetch_categories(&self) -> Result<Vec<MenuCategory>, NetworkError> {
        self.calls.categories.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        fail_if(&self.fail.categories)?;
        Ok(self.categories.clone())
    }

    async fn fetch_items(&self, category_id: &str) -> Result<Vec<MenuItem>, NetworkError> {
        self.calls.items.fetch_add(1, Ordering::SeqCst);
        let delay = self.item_delays.lock().unwrap().get(category_id).copied();
        match delay {
            Some(delay) => tokio::time::sleep(delay).await,
            None => self.pause().await,
        }
        fail_if(&self.fail.items)?;
        match self.items.get(category_id) {
            Some(items) => Ok(items.clone()),
            None => Err(NetworkError::Http {
                status: 404,
                message: Some("Unknown category".to_string()),
            }),
        }
    }

    async fn fetch_item_detail(&self, item_id: &str) -> Result<MenuItemDetail, NetworkError> {
        self.calls.detail.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        fail_if(&self.fail.detail)?;
        match self.details.get(item_id) {
            Some(detail) => Ok(detail.clone()),
            None => Err(NetworkError::Http {
                status: 404,
                message: Some("Unknown menu item".to_string()),
            }),
        }
    }

    async fn set_favorite(&self, _item_id: &str, _is_favorite: bool) -> Result<bool, NetworkError> {
        self.calls.favorite.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        fail_if(&self.fail.favorite)?;
        Ok(true)
    }

    fn set_auth_token(&self, token: Option<String>) {
        *self.auth_token.lock().unwrap() = token;
    }
}

fn item(id: &str, category_id: &str, name: &str, description: &str, price: f64) -> MenuItem {
    MenuItem {
        id: id.to_string(),
        category_id: category_id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        image: Some(format!("{}.jpg", id)),
        price,
        is_favorite: false,
    }
}

#[allow(clippy::type_complexity)]
fn sample_menu() -> (
    Vec<MenuCategory>,
    HashMap<String, Vec<MenuItem>>,
    HashMap<String, MenuItemDetail>,
) {
    let categories = vec![
        MenuCategory {
            id: "1".to_string(),
            name: "Appetizers".to_string(),
            image: Some("appetizers.jpg".to_string()),
            item_count: 2,
        },
        MenuCategory {
            id: "2".to_string(),
            name: "Main Course".to_string(),
            image: Some("mains.jpg".to_string()),
            item_count: 2,
        },
        MenuCategory {
            id: "3".to_string(),
            name: "Desserts".to_string(),
            image: Some("desserts.jpg".to_string()),
            item_count: 1,
        },
        MenuCategory {
            id: "4".to_string(),
            name: "Beverages".to_string(),
            image: Some("beverages.jpg".to_string()),
            item_count: 1,
        },
    ];

    let mut items = HashMap::new();
    items.insert(
        "1".to_string(),
        vec![
            item("101", "1", "Caesar Salad", "Fresh romaine lettuce with creamy dressing", 8.99),
            item("102", "1", "Bruschetta", "Toasted bread with tomatoes and basil", 7.50),
        ],
    );
    items.insert(
        "2".to_string(),
        vec![
            item("201", "2", "Spaghetti Carbonara", "Classic pasta with eggs, cheese, and pancetta", 14.99),
            item("202", "2", "Grilled Salmon", "Fresh salmon with lemon butter sauce", 18.50),
        ],
    );
    items.insert(
        "3".to_string(),
        vec![item("301", "3", "Tiramisu", "Italian coffee-flavored dessert", 7.99)],
    );
    items.insert(
        "4".to_string(),
        vec![item("401", "4", "Fresh Orange Juice", "Freshly squeezed daily", 4.50)],
    );

    let mut details = HashMap::new();
    details.insert(
        "101".to_string(),
        MenuItemDetail {
            id: "101".to_string(),
            category_id: "1".to_string(),
            name: "Caesar Salad".to_string(),
            description: "Fresh romaine lettuce with homemade Caesar dressing, croutons and parmesan.".to_string(),
            image: Some("101.jpg".to_string()),
            price: 8.99,
            ingredients: vec![
                "Romaine lettuce".to_string(),
                "Parmesan cheese".to_string(),
                "Croutons".to_string(),
                "Caesar dressing".to_string(),
            ],
            nutritional_info: Some(NutritionalInfo {
                calories: 320,
                protein: 7.5,
                carbs: 12.0,
                fat: 28.0,
                sugar: 2.5,
                sodium: 720.0,
            }),
            allergens: vec!["Dairy".to_string(), "Gluten".to_string()],
            preparation_time: 10,
            is_favorite: false,
        },
    );
    details.insert(
        "201".to_string(),
        MenuItemDetail {
            id: "201".to_string(),
            category_id: "2".to_string(),
            name: "Spaghetti Carbonara".to_string(),
            description: "Traditional pasta with a silky egg-based sauce, no cream.".to_string(),
            image: Some("201.jpg".to_string()),
            price: 14.99,
            ingredients: vec![
                "Spaghetti pasta".to_string(),
                "Eggs".to_string(),
                "Pecorino Romano cheese".to_string(),
                "Pancetta".to_string(),
            ],
            nutritional_info: Some(NutritionalInfo {
                calories: 750,
                protein: 25.0,
                carbs: 80.0,
                fat: 35.0,
                sugar: 3.0,
                sodium: 950.0,
            }),
            allergens: vec!["Eggs".to_string(), "Dairy".to_string(), "Gluten".to_string()],
            preparation_time: 20,
            is_favorite: false,
        },
    );

    (categories, items, details)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sample_menu_category_counts_match_items() {
        let mock = MockConnectApi::new();
        let categories = mock.fetch_categories().await.unwrap();
        for category in categories {
            let items = mock.fetch_items(&category.id).await.unwrap();
            assert_eq!(items.len() as u32, category.item_count, "category {}", category.id);
        }
    }

    #[tokio::test]
    async fn test_rejected_otp_is_a_domain_error() {
        let mock = MockConnectApi::new();
        let err = mock
            .verify_otp(&VerifyOtpRequest {
                session_id: "session-1".to_string(),
                phone_number: "5551234567".to_string(),
                otp: REJECTED_OTP.to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Invalid OTP");
    }

    #[tokio::test]
    async fn test_session_ids_are_unique() {
        let mock = MockConnectApi::new();
        let request = LoginRequest {
            phone_number: "5551234567".to_string(),
        };
        let first = mock.login(&request).await.unwrap();
        let second = mock.login(&request).await.unwrap();
        assert_ne!(first.session_id, second.session_id);
        assert_eq!(mock.login_calls(), 2);
    }
}
