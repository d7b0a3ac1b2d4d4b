use std::collections::HashMap;
use std::sync::Arc;

use crate::api::{self, LoadError};
use crate::catalog::{Item, ItemKind};

pub trait CatalogService: Send + Sync {
    fn load_structure(&self) -> Result<Vec<Item>, LoadError>;
}

pub trait RelatedService: Send + Sync {
    fn load_related(&self, folder: &str) -> Result<Vec<Item>, LoadError>;
}

pub struct HttpCatalogService {
    client: Arc<api::Client>,
}

impl HttpCatalogService {
    pub fn new(client: Arc<api::Client>) -> Self {
        Self { client }
    }
}

impl CatalogService for HttpCatalogService {
    fn load_structure(&self) -> Result<Vec<Item>, LoadError> {
        self.client.structure()
    }
}

pub struct HttpRelatedService {
    client: Arc<api::Client>,
}

impl HttpRelatedService {
    pub fn new(client: Arc<api::Client>) -> Self {
        Self { client }
    }
}

impl RelatedService for HttpRelatedService {
    fn load_related(&self, folder: &str) -> Result<Vec<Item>, LoadError> {
        self.client.related(folder)
    }
}

/// Canned catalog for offline runs and tests.
#[derive(Default)]
pub struct MockCatalogService {
    fail: bool,
}

impl MockCatalogService {
    pub fn failing() -> Self {
        Self { fail: true }
    }
}

impl CatalogService for MockCatalogService {
    fn load_structure(&self) -> Result<Vec<Item>, LoadError> {
        if self.fail {
            return Err(LoadError::Unavailable("mock catalog offline".into()));
        }
        Ok(mock_catalog())
    }
}

/// Answers related-item queries from the same canned catalog.
#[derive(Default)]
pub struct MockRelatedService {
    overrides: HashMap<String, Vec<Item>>,
}

impl MockRelatedService {
    pub fn with_folder(mut self, folder: &str, items: Vec<Item>) -> Self {
        self.overrides.insert(folder.to_string(), items);
        self
    }
}

impl RelatedService for MockRelatedService {
    fn load_related(&self, folder: &str) -> Result<Vec<Item>, LoadError> {
        if let Some(items) = self.overrides.get(folder) {
            return Ok(items.clone());
        }
        let prefix = if folder.is_empty() {
            String::new()
        } else {
            format!("{folder}/")
        };
        Ok(mock_catalog()
            .into_iter()
            .filter(|item| item.kind == ItemKind::File)
            .filter(|item| {
                item.path
                    .strip_prefix(&prefix)
                    .is_some_and(|rest| !rest.contains('/'))
            })
            .collect())
    }
}

pub fn mock_catalog() -> Vec<Item> {
    vec![
        Item::new("Movies", "Movies", ItemKind::Folder),
        Item::new("Movies/Arrival.mp4", "Arrival.mp4", ItemKind::File),
        Item::new("Movies/Heat.mkv", "Heat.mkv", ItemKind::File),
        Item::new("Movies/Classics", "Classics", ItemKind::Folder),
        Item::new("Movies/Classics/Metropolis.webm", "Metropolis.webm", ItemKind::File),
        Item::new("Shows", "Shows", ItemKind::Folder),
        Item::new("Shows/Pilot.mkv", "Pilot.mkv", ItemKind::File),
        Item::new("Welcome.mp4", "Welcome.mp4", ItemKind::File),
    ]
}
