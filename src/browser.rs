use crate::api::LoadError;
use crate::catalog::{Catalog, Item};
use crate::hierarchy;
use crate::navigation::{NavChrome, NavigationError, NavigationState};
use crate::panel::{ActionPolicy, ItemAction, ItemPanel, PanelStatus, ViewMode};

pub const CATALOG_ERROR_MESSAGE: &str = "Error loading directory structure. Please try again.";
pub const EMPTY_LIBRARY_MESSAGE: &str = "The library is empty.";
pub const EMPTY_FOLDER_MESSAGE: &str = "This folder is empty.";

/// The main library panel: catalog, drill-down state, search and the
/// rendered item set. Every transition ends in `refresh`.
#[derive(Debug, Clone)]
pub struct Browser {
    catalog: Catalog,
    nav: NavigationState,
    search: Option<String>,
    panel: ItemPanel,
    load_failed: bool,
}

impl Browser {
    pub fn new(mode: ViewMode) -> Self {
        Self {
            catalog: Catalog::empty(),
            nav: NavigationState::new(),
            search: None,
            panel: ItemPanel::new(ActionPolicy::Browse, mode),
            load_failed: false,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn panel(&self) -> &ItemPanel {
        &self.panel
    }

    pub fn panel_mut(&mut self) -> &mut ItemPanel {
        &mut self.panel
    }

    pub fn current_folder(&self) -> Option<&Item> {
        self.nav.current()
    }

    pub fn history_len(&self) -> usize {
        self.nav.depth()
    }

    pub fn chrome(&self) -> NavChrome {
        self.nav.chrome()
    }

    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.panel.status(), PanelStatus::Loading)
    }

    pub fn begin_load(&mut self) {
        self.load_failed = false;
        self.panel.show_loading();
    }

    /// Applies the single catalog fetch. A failure leaves the catalog empty.
    pub fn apply_catalog(&mut self, result: Result<Vec<Item>, LoadError>) {
        match result {
            Ok(items) => {
                self.catalog = Catalog::from_items(items);
                self.load_failed = false;
                tracing::info!(items = self.catalog.len(), "catalog loaded");
                self.refresh();
            }
            Err(err) => {
                tracing::warn!(error = %err, "catalog load failed");
                self.catalog = Catalog::empty();
                self.load_failed = true;
                self.panel.show_error(CATALOG_ERROR_MESSAGE);
            }
        }
    }

    pub fn visible_items(&self) -> Vec<Item> {
        if let Some(term) = &self.search {
            return hierarchy::filter_by_name(&self.catalog, term);
        }
        match self.nav.current() {
            Some(folder) => hierarchy::children_of(&self.catalog, folder),
            None => hierarchy::root_items(&self.catalog),
        }
    }

    /// Recomputes the visible set and hands it to the panel.
    pub fn refresh(&mut self) {
        if self.load_failed {
            return;
        }
        let empty_message = match (&self.search, self.nav.current()) {
            (Some(term), _) => format!("No items match \"{term}\"."),
            (None, Some(_)) => EMPTY_FOLDER_MESSAGE.to_string(),
            (None, None) => EMPTY_LIBRARY_MESSAGE.to_string(),
        };
        let items = self.visible_items();
        self.panel.show_items(items, empty_message);
    }

    pub fn open_folder(&mut self, folder: &Item) -> Result<(), NavigationError> {
        self.nav.open_folder(folder)?;
        self.search = None;
        self.refresh();
        Ok(())
    }

    /// Returns whether the view changed: a folder was left or an active
    /// search was dropped.
    pub fn back(&mut self) -> bool {
        let had_search = self.search.take().is_some();
        let moved = self.nav.back();
        if moved || had_search {
            self.refresh();
        }
        moved || had_search
    }

    pub fn home(&mut self) {
        self.search = None;
        self.nav.home();
        self.refresh();
    }

    /// Global search with the term as typed. An empty term lists the whole
    /// catalog; `clear_search` goes back to the folder view.
    pub fn search(&mut self, term: &str) {
        self.search = Some(term.to_string());
        self.refresh();
    }

    pub fn clear_search(&mut self) -> bool {
        if self.search.take().is_some() {
            self.refresh();
            true
        } else {
            false
        }
    }

    pub fn set_mode(&mut self, mode: ViewMode) {
        self.panel.set_mode(mode);
    }

    /// Activates the selected tile. Folder opens happen here; plays are
    /// returned to the caller.
    pub fn activate_selected(&mut self) -> Result<Option<ItemAction>, NavigationError> {
        let Some(action) = self.panel.selected_action() else {
            return Ok(None);
        };
        if let ItemAction::OpenFolder(folder) = &action {
            self.open_folder(folder)?;
        }
        Ok(Some(action))
    }
}
