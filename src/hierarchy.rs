//! Derives the folder tree from the flat catalog. Everything here is pure
//! and keeps catalog order.

use crate::catalog::{Catalog, Item};

pub fn depth(path: &str) -> usize {
    path.matches('/').count() + 1
}

pub fn root_items(catalog: &Catalog) -> Vec<Item> {
    catalog
        .iter()
        .filter(|item| depth(&item.path) == 1)
        .cloned()
        .collect()
}

pub fn children_of(catalog: &Catalog, folder: &Item) -> Vec<Item> {
    let prefix = format!("{}/", folder.path);
    let child_depth = depth(&folder.path) + 1;
    catalog
        .iter()
        .filter(|item| item.path.starts_with(&prefix) && depth(&item.path) == child_depth)
        .cloned()
        .collect()
}

/// Case-insensitive substring match over the whole catalog, regardless of
/// which folder is open.
pub fn filter_by_name(catalog: &Catalog, term: &str) -> Vec<Item> {
    let needle = term.to_lowercase();
    catalog
        .iter()
        .filter(|item| item.name.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// Path minus its last segment; empty for root items.
pub fn parent_path(path: &str) -> String {
    match path.rfind('/') {
        Some(idx) => path[..idx].to_string(),
        None => String::new(),
    }
}

pub fn breadcrumb(folder: Option<&Item>) -> Vec<String> {
    match folder {
        Some(item) => item.path.split('/').map(str::to_string).collect(),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ItemKind;

    fn names(items: &[Item]) -> Vec<&str> {
        items.iter().map(|item| item.name.as_str()).collect()
    }

    fn sample() -> Catalog {
        Catalog::from_items(vec![
            Item::new("Movies", "Movies", ItemKind::Folder),
            Item::new("Movies/a.mp4", "a.mp4", ItemKind::File),
            Item::new("Shows", "Shows", ItemKind::Folder),
            Item::new("Movies/Action", "Action", ItemKind::Folder),
            Item::new("Movies/Action/Heat.mkv", "Heat.mkv", ItemKind::File),
            Item::new("Moviesque", "Moviesque", ItemKind::Folder),
            Item::new("Moviesque/b.mp4", "B.MP4", ItemKind::File),
        ])
    }

    #[test]
    fn depth_counts_segments() {
        assert_eq!(depth("Movies"), 1);
        assert_eq!(depth("Movies/a.mp4"), 2);
        assert_eq!(depth("a/b/c/d"), 4);
    }

    #[test]
    fn root_items_keep_catalog_order() {
        let catalog = sample();
        assert_eq!(names(&root_items(&catalog)), ["Movies", "Shows", "Moviesque"]);
    }

    #[test]
    fn children_are_direct_descendants_only() {
        let catalog = sample();
        let movies = catalog.get("Movies").unwrap().clone();
        let children = children_of(&catalog, &movies);
        assert_eq!(names(&children), ["a.mp4", "Action"]);
        assert!(children.iter().all(|item| item.path != "Movies"));
    }

    #[test]
    fn children_require_separator_after_prefix() {
        let catalog = sample();
        let movies = catalog.get("Movies").unwrap().clone();
        let children = children_of(&catalog, &movies);
        assert!(children.iter().all(|item| !item.path.starts_with("Moviesque")));
    }

    #[test]
    fn empty_folder_has_no_children() {
        let catalog = sample();
        let shows = catalog.get("Shows").unwrap().clone();
        assert!(children_of(&catalog, &shows).is_empty());
    }

    #[test]
    fn search_is_global_and_case_insensitive() {
        let catalog = sample();
        assert_eq!(names(&filter_by_name(&catalog, "mp4")), ["a.mp4", "B.MP4"]);
        assert_eq!(names(&filter_by_name(&catalog, "HEAT")), ["Heat.mkv"]);
        assert_eq!(filter_by_name(&catalog, "").len(), catalog.len());
        assert!(filter_by_name(&catalog, "zzz").is_empty());
    }

    #[test]
    fn parent_path_drops_last_segment() {
        assert_eq!(parent_path("Movies/Action/Heat.mkv"), "Movies/Action");
        assert_eq!(parent_path("intro.mp4"), "");
    }

    #[test]
    fn breadcrumb_splits_folder_path() {
        let folder = Item::folder("Movies/Action");
        assert_eq!(breadcrumb(Some(&folder)), ["Movies", "Action"]);
        assert!(breadcrumb(None).is_empty());
    }
}
