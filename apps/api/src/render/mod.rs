// Rendering pipeline: resume aggregate -> node tree -> sanitized HTML document.

pub mod node;
pub mod renderer;
pub mod serializer;
pub mod style;

pub use node::{DocumentNode, Node};
pub use renderer::{render, render_header};
pub use serializer::{render_html, to_markup};
pub use style::ResumeStyle;
