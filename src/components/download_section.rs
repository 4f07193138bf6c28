use dioxus::prelude::*;

/// Shown once every image has a converted result
#[component]
pub fn DownloadSection(busy: bool, on_download: EventHandler<()>) -> Element {
    rsx! {
        div { class: "download-section",
            button {
                class: "btn-primary download-button",
                disabled: busy,
                onclick: move |_| on_download.call(()),
                if busy {
                    span { class: "loading" }
                    " Creating ZIP..."
                } else {
                    "⬇️ Download All as ZIP"
                }
            }
        }
    }
}
