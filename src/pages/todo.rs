use cosmic::iced::{Alignment, Length};
use cosmic::widget::{button, column, container, icon, row, scrollable, text, text_input};
use cosmic::Element;

use tick::core::projection::{FilterMode, TaskCounts, ViewState};
use tick::core::store::{StorePhase, TaskStore};

use crate::components::task_row::task_list;
use crate::fl;
use crate::message::Message;

fn filter_label(mode: FilterMode, counts: &TaskCounts) -> String {
    let label = match mode {
        FilterMode::All => fl!("filter-all"),
        FilterMode::Completed => fl!("filter-completed"),
        FilterMode::Incomplete => fl!("filter-incomplete"),
    };
    format!("{} ({})", label, counts.for_filter(mode))
}

fn status_line(store: &TaskStore) -> String {
    match store.phase() {
        StorePhase::Empty => fl!("status-not-loaded"),
        StorePhase::Pending { in_flight } => {
            fl!("status-pending", count = in_flight.to_string())
        }
        StorePhase::Loaded => match store.last_synced() {
            Some(at) => fl!("status-synced", time = at.format("%H:%M").to_string()),
            None => String::new(),
        },
    }
}

pub fn todo_view<'a>(
    store: &TaskStore,
    view: &ViewState,
    new_task_input: &str,
    error: Option<&str>,
) -> Element<'a, Message> {
    let mut content = column().spacing(12);

    if let Some(error) = error {
        content = content.push(
            row()
                .spacing(8)
                .align_y(Alignment::Center)
                .push(text::body(error.to_string()).width(Length::Fill))
                .push(
                    button::icon(icon::from_name("window-close-symbolic"))
                        .on_press(Message::DismissError),
                ),
        );
    }

    // Add
    let input = text_input::text_input(fl!("todo-placeholder"), new_task_input.to_string())
        .on_input(Message::NewTaskInput)
        .on_submit(|_| Message::SubmitNewTask)
        .width(Length::Fill);
    content = content.push(
        row()
            .spacing(8)
            .push(input)
            .push(button::suggested(fl!("todo-add")).on_press(Message::SubmitNewTask)),
    );

    // Search & filter
    let counts = TaskCounts::of(store.tasks());
    let mut filters = row().spacing(4);
    for mode in FilterMode::ALL {
        let label = filter_label(*mode, &counts);
        let btn = if view.filter == *mode {
            button::suggested(label)
        } else {
            button::standard(label)
        };
        filters = filters.push(btn.on_press(Message::SetFilter(*mode)));
    }
    content = content.push(
        row()
            .spacing(8)
            .align_y(Alignment::Center)
            .push(
                text_input::text_input(fl!("todo-search"), view.search.clone())
                    .on_input(Message::SearchChanged)
                    .width(Length::Fill),
            )
            .push(filters),
    );

    content = content.push(text::caption(status_line(store)));

    let shown = store.view(view);
    if shown.is_empty() {
        content = content.push(
            container(text::body(fl!("todo-empty")))
                .padding(32)
                .center_x(Length::Fill),
        );
    } else {
        content = content.push(task_list(&shown, store));
    }

    container(scrollable(content.padding(16).width(Length::Fill)))
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}
