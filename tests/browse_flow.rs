use vidtree::api::LoadError;
use vidtree::browser::{Browser, CATALOG_ERROR_MESSAGE, EMPTY_FOLDER_MESSAGE};
use vidtree::catalog::{Item, ItemKind};
use vidtree::data::{mock_catalog, CatalogService, MockCatalogService, MockRelatedService, RelatedService};
use vidtree::panel::{ItemAction, PanelStatus, ViewMode};
use vidtree::related::{RelatedPanel, RELATED_EMPTY_MESSAGE, RELATED_ERROR_MESSAGE};

fn labels(browser: &Browser) -> Vec<String> {
    browser
        .panel()
        .render()
        .tiles
        .into_iter()
        .map(|tile| tile.label)
        .collect()
}

fn loaded_browser(mode: ViewMode) -> Browser {
    let mut browser = Browser::new(mode);
    browser.begin_load();
    browser.apply_catalog(MockCatalogService::default().load_structure());
    browser
}

#[test]
fn drill_down_play_and_related() {
    let mut browser = loaded_browser(ViewMode::Grid);
    assert_eq!(labels(&browser), ["Movies", "Shows", "Welcome.mp4"]);
    assert!(!browser.chrome().visible);

    let opened = browser.activate_selected().unwrap();
    assert!(matches!(opened, Some(ItemAction::OpenFolder(ref item)) if item.path == "Movies"));
    assert_eq!(labels(&browser), ["Arrival.mp4", "Heat.mkv", "Classics"]);
    let chrome = browser.chrome();
    assert!(chrome.visible && chrome.back_enabled && chrome.home_enabled);

    browser.panel_mut().select(1);
    let Some(ItemAction::Play(item)) = browser.activate_selected().unwrap() else {
        panic!("expected a play action");
    };
    assert_eq!(item.path, "Movies/Heat.mkv");
    assert_eq!(browser.current_folder().unwrap().path, "Movies");

    let mut related = RelatedPanel::new(ViewMode::List);
    let ticket = related
        .request(&RelatedPanel::scope_for(&item.path))
        .expect("new scope fetches");
    assert_eq!(ticket.scope, "Movies");
    assert_eq!(related.panel().status(), &PanelStatus::Loading);

    let result = MockRelatedService::default().load_related(&ticket.scope);
    assert!(related.apply(&ticket, result));
    let names: Vec<_> = related.panel().items().iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, ["Arrival.mp4", "Heat.mkv"]);
    assert!(related
        .panel()
        .render()
        .tiles
        .iter()
        .all(|tile| matches!(tile.action, ItemAction::Play(_))));
}

#[test]
fn nested_history_and_home() {
    let mut browser = loaded_browser(ViewMode::List);
    let movies = browser.catalog().get("Movies").unwrap().clone();
    let classics = browser.catalog().get("Movies/Classics").unwrap().clone();
    browser.open_folder(&movies).unwrap();
    browser.open_folder(&classics).unwrap();
    assert_eq!(labels(&browser), ["Metropolis.webm"]);
    assert_eq!(browser.history_len(), 2);

    assert!(browser.back());
    assert_eq!(browser.current_folder().unwrap().path, "Movies");
    assert_eq!(labels(&browser), ["Arrival.mp4", "Heat.mkv", "Classics"]);
    browser.home();
    assert_eq!(browser.history_len(), 0);
    assert_eq!(labels(&browser), ["Movies", "Shows", "Welcome.mp4"]);
    assert!(!browser.back());
}

#[test]
fn empty_folder_shows_message() {
    let mut browser = Browser::new(ViewMode::Grid);
    browser.begin_load();
    browser.apply_catalog(Ok(vec![Item::new("Empty", "Empty", ItemKind::Folder)]));
    let empty = browser.catalog().get("Empty").unwrap().clone();
    browser.open_folder(&empty).unwrap();
    assert_eq!(
        browser.panel().status(),
        &PanelStatus::Empty(EMPTY_FOLDER_MESSAGE.into())
    );
}

#[test]
fn catalog_failure_is_terminal() {
    let mut browser = Browser::new(ViewMode::Grid);
    browser.begin_load();
    browser.apply_catalog(MockCatalogService::failing().load_structure());
    assert!(browser.catalog().is_empty());
    assert_eq!(
        browser.panel().status(),
        &PanelStatus::Failed(CATALOG_ERROR_MESSAGE.into())
    );
    browser.search("heat");
    assert_eq!(
        browser.panel().status(),
        &PanelStatus::Failed(CATALOG_ERROR_MESSAGE.into())
    );
}

#[test]
fn search_spans_the_whole_catalog() {
    let mut browser = loaded_browser(ViewMode::Grid);
    let shows = browser.catalog().get("Shows").unwrap().clone();
    browser.open_folder(&shows).unwrap();
    browser.search("E");
    let expected: Vec<String> = mock_catalog()
        .into_iter()
        .filter(|item| item.name.to_lowercase().contains('e'))
        .map(|item| item.name)
        .collect();
    assert_eq!(labels(&browser), expected);

    browser.set_mode(ViewMode::List);
    assert_eq!(labels(&browser), expected);

    let movies = browser.catalog().get("Movies").unwrap().clone();
    browser.open_folder(&movies).unwrap();
    assert_eq!(browser.search_term(), None);
}

#[test]
fn late_related_response_loses_to_newer_request() {
    let service = MockRelatedService::default();
    let mut related = RelatedPanel::new(ViewMode::Grid);

    let first = related.request(&RelatedPanel::scope_for("Movies/Heat.mkv")).unwrap();
    let second = related.request(&RelatedPanel::scope_for("Shows/Pilot.mkv")).unwrap();

    assert!(related.apply(&second, service.load_related(&second.scope)));
    assert!(!related.apply(&first, service.load_related(&first.scope)));

    assert_eq!(related.scope(), Some("Shows"));
    let names: Vec<_> = related.panel().items().iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, ["Pilot.mkv"]);
}

#[test]
fn related_empty_and_error_states() {
    let service = MockRelatedService::default().with_folder("Quiet", Vec::new());
    let mut related = RelatedPanel::new(ViewMode::Grid);

    let ticket = related.request("Quiet").unwrap();
    related.apply(&ticket, service.load_related("Quiet"));
    assert_eq!(
        related.panel().status(),
        &PanelStatus::Empty(RELATED_EMPTY_MESSAGE.into())
    );

    let ticket = related.request("Down").unwrap();
    related.apply(&ticket, Err(LoadError::Unavailable("offline".into())));
    assert_eq!(
        related.panel().status(),
        &PanelStatus::Failed(RELATED_ERROR_MESSAGE.into())
    );
}
