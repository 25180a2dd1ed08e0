//! Travel-style category tags and the capped selection used by both
//! creation flows.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    cache::Family,
    client::{ApiClient, ApiError},
};

/// Hard cap on tags per request or proposal.
pub const MAX_SELECTED_TAGS: usize = 5;

/// Flat or hierarchical category tag classifying travel style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeTag {
    pub id: Uuid,
    pub name: String,
    pub level: u8,
    pub parent_id: Option<Uuid>,
}

impl ThemeTag {
    pub async fn list(api: &ApiClient) -> Result<Vec<Self>, ApiError> {
        api.get_cached(Family::Tags, "/document/theme-tags", &[])
            .await
    }
}

/// Ordered tag selection enforcing [`MAX_SELECTED_TAGS`]. Toggling a tag
/// beyond the cap leaves the selection unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSelection {
    selected: Vec<Uuid>,
}

impl TagSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select or deselect `id`. Returns whether the selection changed.
    pub fn toggle(&mut self, id: Uuid) -> bool {
        if let Some(pos) = self.selected.iter().position(|s| *s == id) {
            self.selected.remove(pos);
            return true;
        }
        if self.selected.len() >= MAX_SELECTED_TAGS {
            return false;
        }
        self.selected.push(id);
        true
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.selected.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn ids(&self) -> &[Uuid] {
        &self.selected
    }
}
