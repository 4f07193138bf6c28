use conversion_session::NoticeKind;
use dioxus::prelude::*;

use crate::state::UiState;

fn notice_class(kind: NoticeKind) -> &'static str {
    match kind {
        NoticeKind::Capability => "error-message capability",
        NoticeKind::UnsupportedInput | NoticeKind::Decode | NoticeKind::Export => "error-message",
    }
}

/// Stack of active notices, newest first; click to dismiss early
#[component]
pub fn NoticeList() -> Element {
    let state = use_context::<UiState>();
    let mut notices = state.notices;
    let entries: Vec<_> = notices.read().iter().cloned().collect();

    rsx! {
        div { class: "notices",
            for (id , notice) in entries {
                div {
                    key: "{id}",
                    class: notice_class(notice.kind),
                    title: "Click to dismiss",
                    onclick: move |_| {
                        notices.write().dismiss(id);
                    },
                    {notice.message.clone()}
                }
            }
        }
    }
}
