use cosmic::iced::{Alignment, Length};
use cosmic::widget::{button, checkbox, column, container, icon, row, text};
use cosmic::Element;

use tick::core::store::TaskStore;
use tick::core::task::Task;

use crate::fl;
use crate::message::Message;

// Column widths for consistent alignment
const COL_CHECK: f32 = 28.0;
const COL_STATUS: f32 = 64.0;
const COL_DELETE: f32 = 40.0;

fn col(width: f32, content: impl Into<Element<'static, Message>>) -> Element<'static, Message> {
    container(content).width(Length::Fixed(width)).into()
}

/// One task: completion checkbox, title, saving marker, delete button.
///
/// Rows stay interactive while a request is in flight; the store queues
/// further clicks on the same task.
pub fn task_row(task: &Task, busy: bool) -> Element<'static, Message> {
    let toggle_id = task.id.clone();
    let delete_id = task.id.clone();

    let check = col(
        COL_CHECK,
        checkbox("", task.completed).on_toggle(move |_| Message::ToggleTask(toggle_id.clone())),
    );

    let title: Element<'static, Message> = if task.completed {
        text::caption(task.title.clone()).width(Length::Fill).into()
    } else {
        text::body(task.title.clone()).width(Length::Fill).into()
    };

    let status: Element<'static, Message> = if busy {
        col(COL_STATUS, text::caption(fl!("task-saving")))
    } else {
        col(COL_STATUS, text::caption(""))
    };

    let delete = col(
        COL_DELETE,
        button::icon(icon::from_name("edit-delete-symbolic")).on_press(Message::DeleteTask(delete_id)),
    );

    row()
        .spacing(8)
        .align_y(Alignment::Center)
        .push(check)
        .push(title)
        .push(status)
        .push(delete)
        .into()
}

pub fn task_list(tasks: &[&Task], store: &TaskStore) -> Element<'static, Message> {
    let mut list = column().spacing(4);
    for task in tasks {
        list = list.push(task_row(task, store.is_busy(&task.id)));
    }
    list.into()
}
