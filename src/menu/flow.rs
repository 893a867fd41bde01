use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::types::{MenuCategory, MenuItem, MenuItemDetail};
use crate::api::ConnectApi;

/// Lifecycle of one independently loaded region of the menu screen.
#[derive(Debug, Clone, PartialEq)]
pub enum Loadable<T> {
    Unloaded,
    Loading,
    Loaded(T),
    Failed(String),
}

impl<T> Default for Loadable<T> {
    fn default() -> Self {
        Loadable::Unloaded
    }
}

impl<T> Loadable<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Loadable::Loading)
    }

    pub fn loaded(&self) -> Option<&T> {
        match self {
            Loadable::Loaded(value) => Some(value),
            _ => None,
        }
    }
}

/// Everything the menu screens render: the category list, the item list for
/// the selected category, and the detail for the selected item.
#[derive(Debug, Clone, Default)]
pub struct MenuState {
    pub categories: Loadable<Vec<MenuCategory>>,
    pub selected_category: Option<String>,
    pub items: Loadable<Vec<MenuItem>>,
    pub selected_item: Option<String>,
    pub detail: Loadable<MenuItemDetail>,
    /// Failure of an action that has no region of its own (favorite toggle).
    pub error: Option<String>,
}

/// Sequences category, item and detail loads against the gateway. Each
/// region keeps a monotonically increasing generation counter; a load only
/// commits its result while it is still the newest request for that region,
/// so changing selection mid-flight wins over the late response.
pub struct MenuFlow<A: ConnectApi> {
    api: Arc<A>,
    tx: Arc<watch::Sender<MenuState>>,
    categories_gen: AtomicU64,
    items_gen: AtomicU64,
    detail_gen: AtomicU64,
}

impl<A: ConnectApi> MenuFlow<A> {
    pub fn new(api: Arc<A>) -> Self {
        let (tx, _) = watch::channel(MenuState::default());
        Self {
            api,
            tx: Arc::new(tx),
            categories_gen: AtomicU64::new(0),
            items_gen: AtomicU64::new(0),
            detail_gen: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<MenuState> {
        self.tx.subscribe()
    }

    pub fn state(&self) -> MenuState {
        self.tx.borrow().clone()
    }

    /// Load the category list. When nothing is selected yet, the first
    /// returned category is auto-selected and its items load immediately.
    pub async fn load_categories(&self) {
        let generation = self.bump(&self.categories_gen);
        self.tx.send_modify(|state| state.categories = Loadable::Loading);

        info!("Loading menu categories");
        let result = self.api.fetch_categories().await;
        if self.is_stale(&self.categories_gen, generation) {
            debug!("Discarding stale categories response");
            return;
        }

        match result {
            Ok(categories) => {
                let first_unselected = if self.tx.borrow().selected_category.is_none() {
                    categories.first().map(|category| category.id.clone())
                } else {
                    None
                };
                self.tx
                    .send_modify(|state| state.categories = Loadable::Loaded(categories));
                if let Some(id) = first_unselected {
                    info!("Auto-selecting first category {}", id);
                    self.select_category(&id).await;
                }
            }
            Err(e) => {
                warn!("Failed to load categories: {}", e);
                self.tx
                    .send_modify(|state| state.categories = Loadable::Failed(e.user_message()));
            }
        }
    }

    /// Switch the selected category and load its items. Reselecting the
    /// current category does nothing; selecting a different one drops the
    /// current item list.
    pub async fn select_category(&self, category_id: &str) {
        if self.tx.borrow().selected_category.as_deref() == Some(category_id) {
            debug!("Category {} already selected", category_id);
            return;
        }
        self.tx.send_modify(|state| {
            state.selected_category = Some(category_id.to_string());
            state.items = Loadable::Unloaded;
        });
        self.load_items(category_id).await;
    }

    /// Fetch items for a category. Reselecting a category re-fetches; there
    /// is no per-category cache.
    pub async fn load_items(&self, category_id: &str) {
        let generation = self.bump(&self.items_gen);
        self.tx.send_modify(|state| state.items = Loadable::Loading);

        info!("Loading menu items for category {}", category_id);
        let result = self.api.fetch_items(category_id).await;
        if self.is_stale(&self.items_gen, generation) {
            debug!("Discarding stale items response for category {}", category_id);
            return;
        }

        match result {
            Ok(items) => self
                .tx
                .send_modify(|state| state.items = Loadable::Loaded(items)),
            Err(e) => {
                warn!("Failed to load items for category {}: {}", category_id, e);
                self.tx
                    .send_modify(|state| state.items = Loadable::Failed(e.user_message()));
            }
        }
    }

    /// Switch the selected item and load its detail. Reselecting the current
    /// item does nothing.
    pub async fn select_item(&self, item_id: &str) {
        if self.tx.borrow().selected_item.as_deref() == Some(item_id) {
            debug!("Item {} already selected", item_id);
            return;
        }
        self.tx
            .send_modify(|state| state.selected_item = Some(item_id.to_string()));
        self.load_item_detail(item_id).await;
    }

    /// Fetch full detail for an item, replacing any prior detail wholesale.
    pub async fn load_item_detail(&self, item_id: &str) {
        let generation = self.bump(&self.detail_gen);
        self.tx.send_modify(|state| state.detail = Loadable::Loading);

        info!("Loading detail for item {}", item_id);
        let result = self.api.fetch_item_detail(item_id).await;
        if self.is_stale(&self.detail_gen, generation) {
            debug!("Discarding stale detail response for item {}", item_id);
            return;
        }

        match result {
            Ok(detail) => self
                .tx
                .send_modify(|state| state.detail = Loadable::Loaded(detail)),
            Err(e) => {
                warn!("Failed to load detail for item {}: {}", item_id, e);
                self.tx
                    .send_modify(|state| state.detail = Loadable::Failed(e.user_message()));
            }
        }
    }

    /// Flip an item's favorite flag. The local state changes only after the
    /// server confirms; a failure surfaces as `error` and leaves the item
    /// untouched.
    pub async fn toggle_favorite(&self, item_id: &str, is_favorite: bool) {
        self.tx.send_modify(|state| state.error = None);

        match self.api.set_favorite(item_id, is_favorite).await {
            Ok(_) => {
                info!("Favorite for item {} set to {}", item_id, is_favorite);
                self.tx.send_modify(|state| {
                    if let Loadable::Loaded(items) = &mut state.items {
                        if let Some(item) = items.iter_mut().find(|item| item.id == item_id) {
                            item.is_favorite = is_favorite;
                        }
                    }
                    if let Loadable::Loaded(detail) = &mut state.detail {
                        if detail.id == item_id {
                            detail.is_favorite = is_favorite;
                        }
                    }
                });
            }
            Err(e) => {
                warn!("Failed to set favorite for item {}: {}", item_id, e);
                self.tx
                    .send_modify(|state| state.error = Some(e.user_message()));
            }
        }
    }

    /// Reload categories plus whatever is currently selected.
    pub async fn refresh(&self) {
        let snapshot = self.state();
        self.load_categories().await;
        if let Some(category_id) = snapshot.selected_category {
            self.load_items(&category_id).await;
        }
        if let Some(item_id) = snapshot.selected_item {
            self.load_item_detail(&item_id).await;
        }
    }

    fn bump(&self, counter: &AtomicU64) -> u64 {
        counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_stale(&self, counter: &AtomicU64, generation: u64) -> bool {
        counter.load(Ordering::SeqCst) != generation
    }
}
