use conversion_session::Quality;
use dioxus::prelude::*;

#[component]
pub fn QualityControl(quality: Quality, on_change: EventHandler<Quality>) -> Element {
    let (min, max, value) = (Quality::MIN, Quality::MAX, quality.value());

    rsx! {
        div { class: "card quality-control",
            div { style: "display: flex; justify-content: space-between; align-items: center; margin-bottom: 8px;",
                label { r#for: "quality-slider", style: "font-weight: 600;", "WebP quality" }
                span { class: "quality-value", "{quality}" }
            }
            input {
                id: "quality-slider",
                r#type: "range",
                min: "{min}",
                max: "{max}",
                value: "{value}",
                style: "width: 100%;",
                oninput: move |evt| {
                    match evt.value().parse::<i64>() {
                        Ok(v) => on_change.call(Quality::clamped(v)),
                        Err(e) => log::warn!("Ignoring slider value {:?}: {}", evt.value(), e),
                    }
                },
            }
            p { style: "margin: 8px 0 0 0; font-size: 12px; color: #94a3b8;",
                "Lower values give smaller files. Changing it re-converts every image."
            }
        }
    }
}
