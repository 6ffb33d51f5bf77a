//! Pure text transforms applied to decoded bodies.

pub mod clean;
pub mod html;
pub mod readable;

pub use clean::clean;
pub use html::html_to_text;
pub use readable::is_readable;
