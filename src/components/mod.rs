pub mod download_section;
pub mod drop_zone;
pub mod image_card;
pub mod notices;
pub mod quality_control;

pub use download_section::DownloadSection;
pub use drop_zone::DropZone;
pub use image_card::ImageCard;
pub use notices::NoticeList;
pub use quality_control::QualityControl;
