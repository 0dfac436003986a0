use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use clap::Parser;
use flow_core::{
    load_settings, load_settings_from, Coordinator, EntryFlow, Flow, NavigationContext, Page,
    PresentationStyle, Route, ScreenContent, TabHost,
};
use shared::domain::PagePosition;
use tokio_stream::StreamExt;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Args {
    /// Settings file; `navigation.toml` is used when present otherwise.
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Skip every transition delay.
    #[arg(long)]
    instant: bool,
    /// Switch to this page, then force-present a detail flow on top of it.
    #[arg(long)]
    deep_link: Option<usize>,
}

fn screen(identity: &'static str, style: PresentationStyle) -> Route {
    Route::new(identity, style, move || ScreenContent::view(identity))
}

/// Library tab: opens on the shelf and restores the recently read list.
struct LibraryFlow;

#[async_trait(?Send)]
impl Flow for LibraryFlow {
    fn label(&self) -> &str {
        "library"
    }

    async fn start(&self, coordinator: &Coordinator) -> anyhow::Result<()> {
        coordinator
            .start_flow(screen("library.shelf", PresentationStyle::Push), false)
            .await;
        coordinator
            .router()
            .navigate(screen("library.recent", PresentationStyle::Push), None, false)
            .await;
        Ok(())
    }
}

fn pages() -> Vec<Page> {
    vec![
        Page::new(0, "Home", || {
            Coordinator::new(EntryFlow::new(
                "home",
                screen("home.feed", PresentationStyle::Push),
            ))
        }),
        Page::new(1, "Library", || Coordinator::new(LibraryFlow)),
        Page::new(2, "Account", || {
            Coordinator::new(EntryFlow::new(
                "account",
                screen("account.overview", PresentationStyle::Push),
            ))
        }),
    ]
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let settings = match &args.settings {
        Some(path) => load_settings_from(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => load_settings(),
    };
    let context = if args.instant {
        NavigationContext {
            event_capacity: settings.event_capacity,
            ..NavigationContext::instant()
        }
    } else {
        NavigationContext::from_settings(&settings)
    };
    info!(timings = ?context.timings, "navigation context ready");

    let root = Coordinator::with_context(
        EntryFlow::new("app", screen("app.launch", PresentationStyle::Push)),
        context,
    );
    root.start().await.context("starting root flow")?;

    let pages = pages();
    let tabs = TabHost::new(
        screen("tabs.frame", PresentationStyle::Push),
        pages.clone(),
        pages[0].clone(),
    );
    let mut badges = tabs.badges();
    root.navigate_to(tabs.coordinator(), PresentationStyle::FullScreenCover, true)
        .await
        .context("presenting tabs")?;

    tabs.set_badge(Some("3".to_string()), &pages[1]);
    if let Some(Ok(update)) = badges.next().await {
        info!(page = %update.page, label = ?update.label, "badge updated");
    }

    let mut detail = None;
    if let Some(position) = args.deep_link {
        let page = pages
            .iter()
            .find(|page| page.position() == PagePosition(position))
            .ok_or_else(|| anyhow!("no page at position {position}"))?;
        tabs.set_current_page(page);

        let flow = Coordinator::new(EntryFlow::new(
            "detail",
            screen("detail.summary", PresentationStyle::Push),
        ));
        flow.force_presentation(PresentationStyle::Sheet, &root, true)
            .await
            .context("deep link presentation")?;
        flow.router()
            .navigate(screen("detail.comments", PresentationStyle::Push), None, true)
            .await;
        info!(page = page.title(), coordinator = %flow.id(), "deep link presented");
        detail = Some(flow);
    }

    let snapshot = root.snapshot();
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    if let Some(flow) = detail {
        if let Some(node) = snapshot.find(flow.id()) {
            info!(push_stack = ?node.push_stack, "closing deep link");
        }
        flow.finish_flow(true, true).await;
    }
    let top = root.top_coordinator()?;
    info!(
        top = %top.id(),
        nodes = root.snapshot().node_count(),
        "session finished"
    );
    Ok(())
}
