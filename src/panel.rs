//! The item-set + view-mode component shared by the library browser and the
//! related panel.

use serde::{Deserialize, Serialize};

use crate::catalog::{Item, ItemKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Grid,
    List,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            ViewMode::Grid => ViewMode::List,
            ViewMode::List => ViewMode::Grid,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ViewMode::Grid => "grid",
            ViewMode::List => "list",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "grid" => Some(ViewMode::Grid),
            "list" => Some(ViewMode::List),
            _ => None,
        }
    }
}

/// Decides what activating an item does for a given panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionPolicy {
    /// Folders drill down, files play.
    Browse,
    /// Everything plays.
    PlayOnly,
}

impl ActionPolicy {
    pub fn action_for(self, item: &Item) -> ItemAction {
        match (self, item.kind) {
            (ActionPolicy::Browse, ItemKind::Folder) => ItemAction::OpenFolder(item.clone()),
            _ => ItemAction::Play(item.clone()),
        }
    }

    fn icon_for(self, item: &Item) -> &'static str {
        match self {
            ActionPolicy::Browse => item.kind.icon(),
            ActionPolicy::PlayOnly => ItemKind::File.icon(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemAction {
    OpenFolder(Item),
    Play(Item),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub label: String,
    pub icon: &'static str,
    pub action: ItemAction,
}

/// What a panel looks like for one `(items, mode)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPanel {
    pub mode: ViewMode,
    pub tiles: Vec<Tile>,
}

pub fn render(items: &[Item], mode: ViewMode, policy: ActionPolicy) -> RenderedPanel {
    let tiles = items
        .iter()
        .map(|item| Tile {
            label: item.name.clone(),
            icon: policy.icon_for(item),
            action: policy.action_for(item),
        })
        .collect();
    RenderedPanel { mode, tiles }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelStatus {
    Loading,
    Ready,
    Empty(String),
    Failed(String),
}

impl PanelStatus {
    pub fn message(&self) -> Option<&str> {
        match self {
            PanelStatus::Loading => Some(LOADING_MESSAGE),
            PanelStatus::Ready => None,
            PanelStatus::Empty(message) | PanelStatus::Failed(message) => Some(message),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, PanelStatus::Failed(_))
    }
}

pub const LOADING_MESSAGE: &str = "Loading...";

#[derive(Debug, Clone)]
pub struct ItemPanel {
    items: Vec<Item>,
    mode: ViewMode,
    status: PanelStatus,
    policy: ActionPolicy,
    selected: usize,
}

impl ItemPanel {
    pub fn new(policy: ActionPolicy, mode: ViewMode) -> Self {
        Self {
            items: Vec::new(),
            mode,
            status: PanelStatus::Loading,
            policy,
            selected: 0,
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn status(&self) -> &PanelStatus {
        &self.status
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Layout change only, the item set stays as it is.
    pub fn set_mode(&mut self, mode: ViewMode) {
        self.mode = mode;
    }

    /// Replaces the item set. An empty set shows `empty_message` instead.
    pub fn show_items(&mut self, items: Vec<Item>, empty_message: impl Into<String>) {
        self.status = if items.is_empty() {
            PanelStatus::Empty(empty_message.into())
        } else {
            PanelStatus::Ready
        };
        self.items = items;
        self.selected = 0;
    }

    pub fn show_loading(&mut self) {
        self.items.clear();
        self.selected = 0;
        self.status = PanelStatus::Loading;
    }

    pub fn show_error(&mut self, message: impl Into<String>) {
        self.items.clear();
        self.selected = 0;
        self.status = PanelStatus::Failed(message.into());
    }

    pub fn render(&self) -> RenderedPanel {
        render(&self.items, self.mode, self.policy)
    }

    pub fn selected_item(&self) -> Option<&Item> {
        self.items.get(self.selected)
    }

    pub fn selected_action(&self) -> Option<ItemAction> {
        self.selected_item().map(|item| self.policy.action_for(item))
    }

    pub fn select(&mut self, index: usize) {
        if self.items.is_empty() {
            self.selected = 0;
        } else {
            self.selected = index.min(self.items.len() - 1);
        }
    }

    /// Moves the cursor by `delta` tiles, clamped to the item set.
    pub fn move_selection(&mut self, delta: isize) {
        if self.items.is_empty() {
            return;
        }
        let last = self.items.len() as isize - 1;
        let next = (self.selected as isize + delta).clamp(0, last);
        self.selected = next as usize;
    }

    /// Vertical step: one row in list mode, a full row of tiles in grid mode.
    pub fn move_rows(&mut self, rows: isize, columns: usize) {
        let step = match self.mode {
            ViewMode::List => 1,
            ViewMode::Grid => columns.max(1) as isize,
        };
        self.move_selection(rows * step);
    }

    /// Horizontal step: only meaningful in grid mode.
    pub fn move_columns(&mut self, delta: isize) {
        if self.mode == ViewMode::Grid {
            self.move_selection(delta);
        }
    }
}
