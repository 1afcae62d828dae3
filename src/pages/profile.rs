use cosmic::iced::{Alignment, Length};
use cosmic::widget::{column, container, row, scrollable, text};
use cosmic::Element;

use tick::core::projection::{FilterMode, project};
use tick::core::store::{StorePhase, TaskStore};
use tick::remote::auth::UserSummary;

use crate::fl;
use crate::message::Message;

fn detail<'a>(label: String, value: Option<&str>) -> Element<'a, Message> {
    row()
        .spacing(16)
        .align_y(Alignment::Center)
        .push(text::body(label).width(Length::Fixed(96.0)))
        .push(text::body(value.unwrap_or("-").to_string()))
        .into()
}

/// Read-only account details and the tasks still open.
pub fn profile_view<'a>(
    user: Option<&UserSummary>,
    store: &TaskStore,
    error: Option<&str>,
) -> Element<'a, Message> {
    let mut content = column().spacing(12);

    if let Some(error) = error {
        content = content.push(text::body(error.to_string()));
    }

    let heading = user
        .and_then(UserSummary::display_name)
        .map(str::to_string)
        .unwrap_or_else(|| fl!("profile-title"));
    content = content.push(text::title3(heading));
    content = content.push(detail(fl!("profile-name"), user.and_then(|u| u.name.as_deref())));
    content = content.push(detail(fl!("profile-email"), user.and_then(|u| u.email.as_deref())));

    content = content.push(text::title4(fl!("profile-pending")));
    let pending = project(store.tasks(), FilterMode::Incomplete, "");
    if store.phase() == StorePhase::Empty {
        content = content.push(text::caption(fl!("status-not-loaded")));
    } else if pending.is_empty() {
        content = content.push(text::body(fl!("profile-no-pending")));
    } else {
        let mut list = column().spacing(4);
        for task in pending {
            list = list.push(text::body(format!("• {}", task.title)));
        }
        content = content.push(list);
    }

    container(scrollable(content.padding(16).width(Length::Fill)))
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}
