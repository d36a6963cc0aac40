//! Channel selection for OAuth import

use serde::{Deserialize, Serialize};

use crate::core::models::ChannelInfo;

/// Set of selected channel ids, kept in the order they were selected
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSelection {
    selected: Vec<String>,
}

impl ChannelSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select an unselected id or deselect a selected one
    pub fn toggle(&mut self, channel_id: &str) -> bool {
        if let Some(position) = self.selected.iter().position(|id| id == channel_id) {
            self.selected.remove(position);
            false
        } else {
            self.selected.push(channel_id.to_string());
            true
        }
    }

    /// Replace the selection with every fetched channel
    pub fn select_all(&mut self, channels: &[ChannelInfo]) {
        self.selected.clear();
        for channel in channels {
            if !self.contains(&channel.id) {
                self.selected.push(channel.id.clone());
            }
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn contains(&self, channel_id: &str) -> bool {
        self.selected.iter().any(|id| id == channel_id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn ids(&self) -> &[String] {
        &self.selected
    }

    /// Selected channels in fetched order (not selection order)
    pub fn pick<'a>(&self, channels: &'a [ChannelInfo]) -> Vec<&'a ChannelInfo> {
        channels
            .iter()
            .filter(|channel| self.contains(&channel.id))
            .collect()
    }
}
