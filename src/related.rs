use crate::api::LoadError;
use crate::catalog::Item;
use crate::hierarchy;
use crate::panel::{ActionPolicy, ItemPanel, ViewMode};

pub const RELATED_EMPTY_MESSAGE: &str = "No related videos found.";
pub const RELATED_ERROR_MESSAGE: &str = "Error loading related videos. Please try again.";
pub const RELATED_IDLE_MESSAGE: &str = "Play something to see related videos.";

/// Tag carried by a related fetch. Only the latest generation may land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedTicket {
    pub generation: u64,
    pub scope: String,
}

/// Secondary panel listing the siblings of the item being played.
#[derive(Debug, Clone)]
pub struct RelatedPanel {
    scope: Option<String>,
    generation: u64,
    in_flight: bool,
    panel: ItemPanel,
}

impl RelatedPanel {
    pub fn new(mode: ViewMode) -> Self {
        let mut panel = ItemPanel::new(ActionPolicy::PlayOnly, mode);
        panel.show_items(Vec::new(), RELATED_IDLE_MESSAGE);
        Self {
            scope: None,
            generation: 0,
            in_flight: false,
            panel,
        }
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    pub fn panel(&self) -> &ItemPanel {
        &self.panel
    }

    pub fn panel_mut(&mut self) -> &mut ItemPanel {
        &mut self.panel
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight
    }

    /// Scope for a media item: the folder that contains it.
    pub fn scope_for(media_path: &str) -> String {
        hierarchy::parent_path(media_path)
    }

    /// Starts a fetch for `scope` unless it is already the current scope.
    pub fn request(&mut self, scope: &str) -> Option<RelatedTicket> {
        if self.scope.as_deref() == Some(scope) {
            return None;
        }
        self.generation = self.generation.wrapping_add(1);
        self.scope = Some(scope.to_string());
        self.in_flight = true;
        self.panel.show_loading();
        tracing::debug!(scope, generation = self.generation, "related fetch started");
        Some(RelatedTicket {
            generation: self.generation,
            scope: scope.to_string(),
        })
    }

    /// Lands a fetch result. Returns false when the ticket is stale.
    pub fn apply(&mut self, ticket: &RelatedTicket, result: Result<Vec<Item>, LoadError>) -> bool {
        if ticket.generation != self.generation {
            tracing::debug!(
                scope = %ticket.scope,
                generation = ticket.generation,
                current = self.generation,
                "dropping stale related response"
            );
            return false;
        }
        self.in_flight = false;
        match result {
            Ok(items) => self.panel.show_items(items, RELATED_EMPTY_MESSAGE),
            Err(err) => {
                tracing::warn!(scope = %ticket.scope, error = %err, "related load failed");
                self.panel.show_error(RELATED_ERROR_MESSAGE);
            }
        }
        true
    }

    /// Redraws the last fetched set in the new layout. Never refetches.
    pub fn set_mode(&mut self, mode: ViewMode) {
        self.panel.set_mode(mode);
    }
}
