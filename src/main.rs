use conversion_session::{
    check_platform_support, select_clipboard_images, Notice, Quality, SessionCommand,
};
use dioxus::prelude::*;

mod bridge;
mod components;
mod config;
mod error;
mod state;

use components::{DownloadSection, DropZone, ImageCard, NoticeList, QualityControl};
use config::AppConfig;
use state::{run_session, UiCommand, UiState};

const MAIN_CSS: Asset = asset!("/assets/main.css");

fn main() {
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .try_init();
    }

    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    let config = use_hook(AppConfig::load);
    let mut state = use_context_provider(|| UiState::new(config.default_quality));

    let session = use_coroutine({
        let config = config.clone();
        move |rx: UnboundedReceiver<UiCommand>| run_session(rx, state, config.clone())
    });

    // Advisory only: the app stays usable without WebP support
    let notice_timeout = config.notice_timeout();
    use_hook(move || {
        if let Err(e) = check_platform_support() {
            log::error!("WebP capability check failed: {}", e);
            state.notify(Notice::webp_unsupported(notice_timeout));
        }
    });

    use_future(move || async move {
        bridge::listen_for_paste(move |items| {
            if let Some(files) = select_clipboard_images(items) {
                session.send(UiCommand::Session(SessionCommand::Ingest(files)));
            }
        })
        .await;
    });

    let cards = state.cards.read().clone();
    let quality = (state.quality)();
    let export_ready = (state.export_ready)();
    let exporting = (state.exporting)();

    rsx! {
        document::Title { "PNG to WebP" }
        document::Link { rel: "stylesheet", href: MAIN_CSS }

        div { class: "container",
            NoticeList {}

            h1 { class: "title", "PNG → WebP Converter" }
            p { class: "subtitle", "Everything happens locally. Your images never leave this device." }

            DropZone {
                on_files: move |files| session.send(UiCommand::Session(SessionCommand::Ingest(files))),
            }

            QualityControl {
                quality,
                on_change: move |q: Quality| {
                    state.quality.set(q);
                    session.send(UiCommand::Session(SessionCommand::SetQuality(q)));
                },
            }

            if export_ready {
                DownloadSection {
                    busy: exporting,
                    on_download: move |_| session.send(UiCommand::Export),
                }
            }

            div { class: "images-container",
                for card in cards {
                    ImageCard { key: "{card.id}", card: card.clone() }
                }
            }
        }
    }
}
