use super::*;

use shared::{error::ErrorCode, protocol::PresentationStyle};
use tokio_stream::StreamExt;

use crate::test_support::{assert_tree_links, entry, pushed};

fn pages() -> Vec<Page> {
    vec![
        Page::new(0, "Home", || entry("home")),
        Page::new(1, "Search", || entry("search")),
        Page::new(2, "Profile", || entry("profile")),
    ]
}

async fn started_tabs() -> TabHost {
    let pages = pages();
    let current = pages[0].clone();
    let tabs = TabHost::with_context(
        pushed("tabs.frame"),
        pages,
        current,
        NavigationContext::instant(),
    );
    tabs.coordinator().start().await.expect("start tab host");
    tabs
}

#[tokio::test]
async fn start_sets_frame_and_tags_pages() {
    let tabs = started_tabs().await;
    let coordinator = tabs.coordinator();

    assert!(coordinator.is_tab_host());
    assert_eq!(
        coordinator.router().main_route().map(|route| route.identity().to_string()),
        Some("tabs.frame".to_string())
    );
    let tags: Vec<Option<String>> = coordinator.children().iter().map(Coordinator::tag).collect();
    assert_eq!(
        tags,
        vec![Some("0".to_string()), Some("1".to_string()), Some("2".to_string())]
    );
    assert!(tabs.page_coordinators().iter().all(|(_, id)| id.is_some()));
    assert_tree_links(coordinator);
}

#[tokio::test]
async fn page_children_are_started() {
    let tabs = started_tabs().await;
    let search = tabs.coordinator_at(PagePosition(1)).expect("search page");

    assert_eq!(
        search.router().main_route().map(|route| route.identity().to_string()),
        Some("search.main".to_string())
    );
}

#[tokio::test]
async fn set_current_page_ignores_unknown_and_current_pages() {
    let tabs = started_tabs().await;
    let pages = tabs.pages();

    assert!(!tabs.set_current_page(&pages[0]));
    assert!(!tabs.set_current_page(&Page::new(9, "Missing", || entry("missing"))));
    assert!(tabs.set_current_page(&pages[2]));

    assert_eq!(tabs.current_page().position(), PagePosition(2));
    let selected = tabs.selected_coordinator().expect("selected page");
    assert_eq!(selected.tag().as_deref(), Some("2"));
}

#[tokio::test]
async fn selection_fails_without_matching_child() {
    let tabs = started_tabs().await;
    let old_children = tabs.coordinator().children();

    tabs.set_pages(Vec::new(), None).await.expect("clear pages");

    assert!(tabs.coordinator().children().is_empty());
    assert!(old_children.iter().all(|child| !child.is_attached()));
    let err = tabs.selected_coordinator().expect_err("no selected child");
    assert_eq!(err.code(), ErrorCode::CoordinatorSelection);
    assert!(tabs.coordinator().top_coordinator().is_ok());
}

#[tokio::test]
async fn set_pages_replaces_children() {
    let tabs = started_tabs().await;
    let replacement = vec![Page::new(5, "Inbox", || entry("inbox"))];
    let current = replacement[0].clone();

    tabs.set_pages(replacement, Some(current))
        .await
        .expect("replace pages");

    assert_eq!(tabs.coordinator().children().len(), 1);
    let inbox = tabs.selected_coordinator().expect("inbox page");
    assert_eq!(inbox.tag().as_deref(), Some("5"));
    assert_eq!(tabs.pages().len(), 1);
}

#[tokio::test]
async fn badges_are_streamed_to_subscribers() {
    let tabs = started_tabs().await;
    let pages = tabs.pages();
    let mut badges = tabs.badges();

    tabs.set_badge(Some("3".to_string()), &pages[1]);
    tabs.set_badge(None, &pages[1]);

    let first = badges.next().await.expect("badge").expect("not lagged");
    assert_eq!(
        first,
        BadgeUpdate {
            label: Some("3".to_string()),
            page: PagePosition(1),
        }
    );
    let second = badges.next().await.expect("badge").expect("not lagged");
    assert_eq!(second.label, None);
}

#[tokio::test]
async fn top_coordinator_enters_selected_page() {
    let root = entry("root");
    root.start().await.expect("start root");
    let tabs = TabHost::new(pushed("tabs.frame"), pages(), pages()[0].clone());
    root.navigate_to(tabs.coordinator(), PresentationStyle::FullScreenCover, false)
        .await
        .expect("present tabs");

    let home = tabs.coordinator_at(PagePosition(0)).expect("home page");
    assert!(root.top_coordinator().expect("top").ptr_eq(&home));

    let pages = tabs.pages();
    tabs.set_current_page(&pages[1]);
    let search = tabs.coordinator_at(PagePosition(1)).expect("search page");
    assert!(root.top_coordinator().expect("top").ptr_eq(&search));

    let detail = entry("detail");
    search
        .navigate_to(&detail, PresentationStyle::Sheet, false)
        .await
        .expect("present detail");
    assert!(root.top_coordinator().expect("top").ptr_eq(&detail));
    // Entered directly, a tab host descends into its last attached page.
    let profile = tabs.coordinator_at(PagePosition(2)).expect("profile page");
    assert!(tabs.coordinator().top_coordinator().expect("top").ptr_eq(&profile));
}

#[tokio::test]
async fn finishing_a_tab_dismisses_the_whole_host() {
    let root = entry("root");
    root.start().await.expect("start root");
    let tabs = TabHost::new(pushed("tabs.frame"), pages(), pages()[0].clone());
    root.navigate_to(tabs.coordinator(), PresentationStyle::Sheet, false)
        .await
        .expect("present tabs");
    let home = tabs.selected_coordinator().expect("home page");
    let siblings = tabs.coordinator().children();

    home.finish_flow(false, true).await;

    assert!(root.children().is_empty());
    assert!(root.router().modal_stack().is_empty());
    assert!(!tabs.coordinator().is_attached());
    assert!(siblings.iter().all(|sibling| !sibling.is_attached()));
}

#[tokio::test]
async fn plain_coordinators_are_not_tab_hosts() {
    let tabs = started_tabs().await;
    let plain = entry("plain");

    assert!(plain.as_tab_host().is_none());
    assert_eq!(
        tabs.coordinator().as_tab_host().expect("tab host"),
        tabs.clone()
    );
    assert_eq!(tabs.coordinator().snapshot().selected_page, Some(PagePosition(0)));
}

#[tokio::test]
async fn empty_tab_host_is_the_top_of_its_branch() {
    let root = entry("root");
    root.start().await.expect("start root");
    let tabs = TabHost::new(pushed("tabs.frame"), pages(), pages()[0].clone());
    root.navigate_to(tabs.coordinator(), PresentationStyle::Sheet, false)
        .await
        .expect("present tabs");
    tabs.set_pages(Vec::new(), None).await.expect("clear pages");

    assert!(root.top_coordinator().expect("top").ptr_eq(tabs.coordinator()));

    let alert = entry("alert");
    let presented = alert
        .force_presentation(PresentationStyle::Sheet, &root, false)
        .await
        .expect("force presentation");
    assert!(presented);
    assert!(alert.parent().expect("alert parent").ptr_eq(tabs.coordinator()));
}
