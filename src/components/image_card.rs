use conversion_session::ImageCardView;
use dioxus::prelude::*;

#[component]
pub fn ImageCard(card: ImageCardView) -> Element {
    let sizes = &card.converted.sizes;
    let savings_class = sizes.delta.trend.css_class();
    let savings_label = sizes.delta.label();
    let (original_size, converted_size) = (&sizes.original, &sizes.converted);
    let original_preview = &card.original_preview;
    let converted_preview = &card.converted.preview;
    let dimensions = &card.converted.dimensions;
    let id = card.id;
    let name = &card.name;

    rsx! {
        div { class: "card image-card", "data-id": "{id}",
            div { class: "image-filename", "{name}" }
            div { class: "comparison-view",
                div { class: "image-side",
                    div { class: "image-label", "Original PNG" }
                    img {
                        class: "image-preview",
                        src: "{original_preview}",
                        alt: "Original",
                    }
                }
                div { class: "image-side",
                    div { class: "image-label", "Converted WebP" }
                    img {
                        class: "image-preview",
                        src: "{converted_preview}",
                        alt: "Converted",
                    }
                }
            }
            div { class: "size-info",
                span { class: "size-original", "{original_size}" }
                span { class: "size-arrow", "→" }
                span { class: "size-converted", "{converted_size}" }
                span { class: "{savings_class}", "{savings_label}" }
                span { class: "size-dimensions", "{dimensions}" }
            }
        }
    }
}
