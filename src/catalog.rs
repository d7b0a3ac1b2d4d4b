use std::collections::HashSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    #[default]
    File,
    Folder,
}

impl ItemKind {
    pub fn icon(&self) -> &'static str {
        match self {
            ItemKind::Folder => "📁",
            ItemKind::File => "🎬",
        }
    }
}

/// One entry of the server listing. The path doubles as the identity and
/// encodes the nesting depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub path: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: ItemKind,
}

impl Item {
    pub fn new(path: impl Into<String>, name: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            kind,
        }
    }

    pub fn folder(path: impl Into<String>) -> Self {
        let path = path.into();
        let name = last_segment(&path).to_string();
        Self::new(path, name, ItemKind::Folder)
    }

    pub fn file(path: impl Into<String>) -> Self {
        let path = path.into();
        let name = last_segment(&path).to_string();
        Self::new(path, name, ItemKind::File)
    }

    pub fn is_folder(&self) -> bool {
        self.kind == ItemKind::Folder
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Strips the `./` prefixes the server emits for files in the library root.
pub fn normalize_path(raw: &str) -> String {
    let mut path = raw.trim();
    while let Some(rest) = path.strip_prefix("./") {
        path = rest;
    }
    path.to_string()
}

/// The flat listing, in server order. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<Item>,
}

impl Catalog {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_items(items: Vec<Item>) -> Self {
        let mut seen: HashSet<String> = HashSet::with_capacity(items.len());
        let mut kept = Vec::with_capacity(items.len());
        for mut item in items {
            item.path = normalize_path(&item.path);
            if item.path.is_empty() || item.path == "." {
                tracing::debug!(name = %item.name, "skipping catalog entry without a path");
                continue;
            }
            if !seen.insert(item.path.clone()) {
                tracing::warn!(path = %item.path, "duplicate catalog path dropped");
                continue;
            }
            kept.push(item);
        }
        Self { items: kept }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Item> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.path == path)
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Item;
    type IntoIter = std::slice::Iter<'a, Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
