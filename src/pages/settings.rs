use cosmic::iced::{Alignment, Length};
use cosmic::widget::{button, column, container, row, scrollable, text, text_input};
use cosmic::Element;

use tick::config::{DEFAULT_API_URL, TickConfig};
use tick::remote::auth::UserSummary;

use crate::message::Message;

pub fn settings_view<'a>(
    config: &TickConfig,
    api_url_input: &str,
    user: Option<&UserSummary>,
    logged_in: bool,
) -> Element<'a, Message> {
    let mut content = column().spacing(12);

    // --- Server ---
    content = content.push(text::title4(crate::fl!("settings-server")));
    content = content.push(
        row()
            .spacing(8)
            .push(
                text_input::text_input(DEFAULT_API_URL, api_url_input.to_string())
                    .on_input(Message::SetApiUrl)
                    .on_submit(|_| Message::ApplyApiUrl)
                    .width(Length::Fill),
            )
            .push(button::standard(crate::fl!("settings-apply")).on_press(Message::ApplyApiUrl)),
    );
    if api_url_input.trim_end_matches('/') != config.server_key() {
        content = content.push(text::caption(crate::fl!("settings-server-unsaved")));
    }

    // --- Debug logging ---
    content = content.push(
        row()
            .spacing(8)
            .align_y(Alignment::Center)
            .push(text::body(crate::fl!("settings-debug-logging")).width(Length::Fill))
            .push(
                cosmic::widget::toggler(config.debug_logging)
                    .on_toggle(|_| Message::ToggleDebugLogging),
            ),
    );

    // --- Account ---
    content = content.push(text::title4(crate::fl!("settings-account")));
    if logged_in {
        let who = user
            .and_then(UserSummary::display_name)
            .map(str::to_string)
            .unwrap_or_else(|| crate::fl!("settings-signed-in"));
        content = content.push(
            row()
                .spacing(8)
                .align_y(Alignment::Center)
                .push(text::body(who).width(Length::Fill))
                .push(button::destructive(crate::fl!("settings-logout")).on_press(Message::Logout)),
        );
    } else {
        content = content.push(text::body(crate::fl!("settings-signed-out")));
    }

    container(scrollable(content.padding(16).width(Length::Fill)))
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}
