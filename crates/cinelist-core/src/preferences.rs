use crate::storage::{load_record, save_record, KeyValueStorage, StorageError};
use cinelist_models::{Category, SortFilter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

pub const PREFERENCES_KEY: &str = "category-storage";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceState {
    #[serde(default)]
    pub selected_category: Option<Category>,
    #[serde(default)]
    pub selected_sort: Option<SortFilter>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceEvent {
    CategoryChanged(Category),
    SortChanged(SortFilter),
}

/// The user's chosen feed category and sort order, restored from storage at startup.
///
/// Every mutation persists the whole record. A failed write is logged and returned, but
/// the in-memory value keeps the new selection.
pub struct PreferenceStore {
    storage: Arc<dyn KeyValueStorage>,
    state: PreferenceState,
    events: broadcast::Sender<PreferenceEvent>,
}

impl PreferenceStore {
    pub fn load(storage: Arc<dyn KeyValueStorage>) -> Self {
        let state = match load_record::<PreferenceState>(storage.as_ref(), PREFERENCES_KEY) {
            Ok(Some(state)) => {
                debug!(
                    "Restored preferences: category={:?} sort={:?}",
                    state.selected_category, state.selected_sort
                );
                state
            }
            Ok(None) => PreferenceState::default(),
            Err(e) => {
                warn!("Ignoring unreadable preferences: {}", e);
                PreferenceState::default()
            }
        };
        let (events, _) = broadcast::channel(16);
        Self { storage, state, events }
    }

    /// Fill in whichever selection is still unset with the first option. Existing
    /// selections are left alone.
    pub fn initialize(&mut self) -> Result<(), StorageError> {
        let mut filled = Vec::new();
        if self.state.selected_category.is_none() {
            let category = Category::default();
            self.state.selected_category = Some(category);
            filled.push(PreferenceEvent::CategoryChanged(category));
        }
        if self.state.selected_sort.is_none() {
            let sort = SortFilter::default();
            self.state.selected_sort = Some(sort);
            filled.push(PreferenceEvent::SortChanged(sort));
        }

        if filled.is_empty() {
            return Ok(());
        }
        info!("Initialized default preferences");
        for event in filled {
            self.emit(event);
        }
        self.persist()
    }

    pub fn state(&self) -> &PreferenceState {
        &self.state
    }

    pub fn selected_category(&self) -> Option<Category> {
        self.state.selected_category
    }

    pub fn selected_sort(&self) -> Option<SortFilter> {
        self.state.selected_sort
    }

    /// Current selection with defaults standing in for anything unset
    pub fn active_selection(&self) -> (Category, SortFilter) {
        (
            self.state.selected_category.unwrap_or_default(),
            self.state.selected_sort.unwrap_or_default(),
        )
    }

    pub fn categories(&self) -> &'static [Category] {
        &Category::ALL
    }

    pub fn sort_filters(&self) -> &'static [SortFilter] {
        &SortFilter::ALL
    }

    pub fn set_selected_category(&mut self, category: Category) -> Result<(), StorageError> {
        self.state.selected_category = Some(category);
        self.emit(PreferenceEvent::CategoryChanged(category));
        self.persist()
    }

    pub fn set_selected_sort(&mut self, sort: SortFilter) -> Result<(), StorageError> {
        self.state.selected_sort = Some(sort);
        self.emit(PreferenceEvent::SortChanged(sort));
        self.persist()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PreferenceEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: PreferenceEvent) {
        // No receivers is fine
        let _ = self.events.send(event);
    }

    fn persist(&self) -> Result<(), StorageError> {
        save_record(self.storage.as_ref(), PREFERENCES_KEY, &self.state).map_err(|e| {
            warn!("Failed to persist preferences: {}", e);
            e
        })
    }
}
