use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StackError};

/// How a dimension filter combines with per-channel toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterPolicy {
    /// Keep manual toggles; a channel is selected when it is toggled on AND
    /// its tag matches the active filter. Clearing the filter restores the
    /// manual selection untouched.
    Intersect,
    /// Overwrite the manual toggles with "tag matches". No filter persists.
    Replace,
}

impl Default for FilterPolicy {
    fn default() -> Self {
        FilterPolicy::Intersect
    }
}

/// One recording channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub name: String,
    /// Row in the signal buffer.
    pub index: usize,
    /// User-controlled toggle.
    pub visible: bool,
    /// Type tag used for bulk dimension filters (e.g. "eeg", "eog").
    pub tag: Option<String>,
}

/// Canonical channel list plus the selection state derived from toggles and
/// the active dimension filter. Never touches rendering.
#[derive(Debug, Clone, Default)]
pub struct ChannelRegistry {
    channels: Vec<Channel>,
    by_name: HashMap<String, usize>,
    filter: Option<String>,
    policy: FilterPolicy,
}

impl ChannelRegistry {
    pub fn new(policy: FilterPolicy) -> Self {
        Self {
            policy,
            ..Default::default()
        }
    }

    /// Replace the channel list. All channels start visible and the filter is
    /// cleared. `loaded_rows` is the row count of the buffer currently loaded,
    /// if any; it must match the number of names.
    pub fn initialize(
        &mut self,
        names: Vec<String>,
        tags: Option<Vec<Option<String>>>,
        loaded_rows: Option<usize>,
    ) -> Result<()> {
        if let Some(rows) = loaded_rows {
            if rows != names.len() {
                return Err(StackError::InvalidState(format!(
                    "{} channel names for a buffer with {rows} rows",
                    names.len()
                )));
            }
        }
        let tags = match tags {
            Some(tags) if tags.len() != names.len() => {
                return Err(StackError::InvalidState(format!(
                    "{} tags for {} channels",
                    tags.len(),
                    names.len()
                )));
            }
            Some(tags) => tags,
            None => vec![None; names.len()],
        };

        let mut by_name = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            if by_name.insert(name.clone(), i).is_some() {
                return Err(StackError::InvalidState(format!("duplicate channel name {name:?}")));
            }
        }

        self.channels = names
            .into_iter()
            .zip(tags)
            .enumerate()
            .map(|(index, (name, tag))| Channel {
                name,
                index,
                visible: true,
                tag,
            })
            .collect();
        self.by_name = by_name;
        self.filter = None;
        tracing::debug!("Channel registry initialized with {} channels", self.channels.len());
        Ok(())
    }

    pub fn set_visible(&mut self, name: &str, visible: bool) -> Result<()> {
        let idx = *self
            .by_name
            .get(name)
            .ok_or_else(|| StackError::UnknownChannel(name.to_string()))?;
        self.channels[idx].visible = visible;
        Ok(())
    }

    /// Turn every channel on and drop any active filter.
    pub fn select_all(&mut self) {
        self.set_all(true);
    }

    /// Turn every channel off and drop any active filter.
    pub fn deselect_all(&mut self) {
        self.set_all(false);
    }

    fn set_all(&mut self, visible: bool) {
        for ch in &mut self.channels {
            ch.visible = visible;
        }
        self.filter = None;
    }

    /// Restrict the selection to channels carrying `tag`; `None` clears the
    /// filter. See [`FilterPolicy`] for how this interacts with toggles.
    pub fn filter_by_dimension(&mut self, tag: Option<&str>) {
        match self.policy {
            FilterPolicy::Intersect => {
                self.filter = tag.map(str::to_string);
            }
            FilterPolicy::Replace => {
                if let Some(tag) = tag {
                    for ch in &mut self.channels {
                        ch.visible = ch.tag.as_deref() == Some(tag);
                    }
                }
                self.filter = None;
            }
        }
    }

    fn passes_filter(&self, ch: &Channel) -> bool {
        match &self.filter {
            Some(tag) => ch.tag.as_deref() == Some(tag.as_str()),
            None => true,
        }
    }

    /// Indices of selected channels, in declaration order.
    pub fn current_selection(&self) -> Vec<usize> {
        self.channels
            .iter()
            .filter(|ch| ch.visible && self.passes_filter(ch))
            .map(|ch| ch.index)
            .collect()
    }

    /// The manual toggle, ignoring any filter.
    pub fn is_visible(&self, name: &str) -> Result<bool> {
        self.channel(name)
            .map(|ch| ch.visible)
            .ok_or_else(|| StackError::UnknownChannel(name.to_string()))
    }

    /// Whether the channel ends up in the selection (toggle and filter).
    pub fn is_selected(&self, name: &str) -> Result<bool> {
        let ch = self.channel(name).ok_or_else(|| StackError::UnknownChannel(name.to_string()))?;
        Ok(ch.visible && self.passes_filter(ch))
    }

    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.by_name.get(name).map(|&i| &self.channels[i])
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn names(&self) -> Vec<String> {
        self.channels.iter().map(|c| c.name.clone()).collect()
    }

    /// Distinct tags in first-seen order.
    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = Vec::new();
        for tag in self.channels.iter().filter_map(|c| c.tag.as_ref()) {
            if !tags.contains(tag) {
                tags.push(tag.clone());
            }
        }
        tags
    }

    pub fn active_filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    pub fn policy(&self) -> FilterPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn tagged(policy: FilterPolicy) -> ChannelRegistry {
        let mut reg = ChannelRegistry::new(policy);
        reg.initialize(
            names(&["Fp1", "Fp2", "EOG", "Cz"]),
            Some(vec![
                Some("eeg".into()),
                Some("eeg".into()),
                Some("eog".into()),
                Some("eeg".into()),
            ]),
            Some(4),
        )
        .unwrap();
        reg
    }

    #[test]
    fn initialize_checks_buffer_rows() {
        let mut reg = ChannelRegistry::default();
        let err = reg.initialize(names(&["a", "b"]), None, Some(3)).unwrap_err();
        assert!(matches!(err, StackError::InvalidState(_)));
        assert!(reg.is_empty());
        reg.initialize(names(&["a", "b"]), None, None).unwrap();
        assert_eq!(reg.current_selection(), vec![0, 1]);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut reg = ChannelRegistry::default();
        let err = reg.initialize(names(&["a", "a"]), None, None).unwrap_err();
        assert!(matches!(err, StackError::InvalidState(_)));
    }

    #[test]
    fn unknown_channel_toggle_fails() {
        let mut reg = tagged(FilterPolicy::Intersect);
        let err = reg.set_visible("Oz", false).unwrap_err();
        assert!(matches!(err, StackError::UnknownChannel(ref n) if n == "Oz"));
        assert_eq!(reg.current_selection(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn select_all_is_idempotent() {
        let mut reg = tagged(FilterPolicy::Intersect);
        reg.set_visible("Fp2", false).unwrap();
        reg.select_all();
        let once = reg.current_selection();
        reg.select_all();
        assert_eq!(reg.current_selection(), once);
        assert_eq!(once, vec![0, 1, 2, 3]);
        reg.deselect_all();
        reg.deselect_all();
        assert!(reg.current_selection().is_empty());
    }

    #[test]
    fn intersect_filter_keeps_manual_toggles() {
        let mut reg = tagged(FilterPolicy::Intersect);
        reg.set_visible("Fp2", false).unwrap();
        reg.filter_by_dimension(Some("eeg"));
        assert_eq!(reg.current_selection(), vec![0, 3]);
        assert!(!reg.is_selected("EOG").unwrap());
        assert!(reg.is_visible("EOG").unwrap());
        assert!(reg.is_visible("Oz").is_err());
        reg.filter_by_dimension(None);
        assert_eq!(reg.current_selection(), vec![0, 2, 3]);
    }

    #[test]
    fn replace_filter_overwrites_toggles() {
        let mut reg = tagged(FilterPolicy::Replace);
        reg.set_visible("Fp2", false).unwrap();
        reg.filter_by_dimension(Some("eeg"));
        assert_eq!(reg.current_selection(), vec![0, 1, 3]);
        reg.filter_by_dimension(None);
        assert_eq!(reg.current_selection(), vec![0, 1, 3]);
        assert_eq!(reg.active_filter(), None);
    }

    #[test]
    fn unknown_tag_gives_empty_selection() {
        let mut reg = tagged(FilterPolicy::Intersect);
        reg.filter_by_dimension(Some("meg"));
        assert!(reg.current_selection().is_empty());
    }

    #[test]
    fn tags_in_first_seen_order() {
        assert_eq!(tagged(FilterPolicy::Intersect).tags(), vec!["eeg", "eog"]);
    }
}
