//! # od-tui
//!
//! Terminal dashboard for opsdesk.
//!
//! Shows the sync pipeline panel next to the task chat and a single input
//! line for commands and messages. The dashboard only exchanges `Op`s and
//! `Event`s with an `od-core` session; it never calls the server itself.

pub mod app;
pub mod event;
pub mod event_handler;
pub mod tui;
pub mod widgets;

pub use app::App;
pub use tui::Tui;

use anyhow::Result;
use od_core::realtime::ConnectionStatus;
use od_protocol::{Event, Op, SyncType};
use tokio::sync::{mpsc, watch};

/// Run the dashboard until the user quits or the session goes away.
///
/// `task_id` is the task the session was started with, if any.
pub async fn run_app(
    op_tx: mpsc::Sender<Op>,
    event_rx: mpsc::Receiver<Event>,
    connection: watch::Receiver<ConnectionStatus>,
    sync_type: SyncType,
    task_id: Option<String>,
) -> Result<()> {
    let mut tui = Tui::init()?;
    tui.clear()?;

    let mut app = App::new(op_tx, event_rx, sync_type)
        .with_task(task_id)
        .with_connection(connection);
    let result = app.run(&mut tui).await;

    tui.restore()?;
    result
}
