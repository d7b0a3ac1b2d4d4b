use crate::catalog::Item;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NavigationError {
    #[error("{0} is not a folder")]
    NotAFolder(String),
}

/// Which drill-down controls are shown. Derived from the state, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NavChrome {
    pub visible: bool,
    pub back_enabled: bool,
    pub home_enabled: bool,
}

/// Current folder plus the stack of folders we came from. `None` is the root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationState {
    current: Option<Item>,
    history: Vec<Option<Item>>,
}

impl NavigationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&Item> {
        self.current.as_ref()
    }

    pub fn depth(&self) -> usize {
        self.history.len()
    }

    pub fn is_root(&self) -> bool {
        self.current.is_none()
    }

    pub fn open_folder(&mut self, folder: &Item) -> Result<(), NavigationError> {
        if !folder.is_folder() {
            return Err(NavigationError::NotAFolder(folder.path.clone()));
        }
        let previous = self.current.replace(folder.clone());
        self.history.push(previous);
        Ok(())
    }

    /// Returns false when there was nothing to go back to.
    pub fn back(&mut self) -> bool {
        match self.history.pop() {
            Some(previous) => {
                self.current = previous;
                true
            }
            None => false,
        }
    }

    pub fn home(&mut self) {
        self.history.clear();
        self.current = None;
    }

    pub fn chrome(&self) -> NavChrome {
        if self.is_root() && self.history.is_empty() {
            return NavChrome::default();
        }
        NavChrome {
            visible: true,
            back_enabled: !self.history.is_empty(),
            home_enabled: !self.is_root(),
        }
    }
}
