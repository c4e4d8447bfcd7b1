//! Dashboard widgets.

pub mod chat_view;
pub mod command_composer;
pub mod pipeline_panel;

pub use chat_view::ChatView;
pub use command_composer::CommandComposer;
pub use pipeline_panel::render_pipeline_panel;
