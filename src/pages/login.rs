use cosmic::iced::{Alignment, Length};
use cosmic::widget::{button, column, container, text, text_input};
use cosmic::{Element, theme};

use crate::application::AuthForm;
use crate::fl;
use crate::message::{AuthField, AuthMode, Message};

pub fn login_view<'a>(form: &AuthForm, busy: bool, error: Option<&str>) -> Element<'a, Message> {
    let signup = form.mode == AuthMode::Signup;

    let heading = if signup { fl!("auth-signup-title") } else { fl!("auth-login-title") };
    let mut content = column()
        .spacing(12)
        .align_x(Alignment::Center)
        .max_width(420.0)
        .push(text::title3(heading));

    if let Some(error) = error {
        content = content.push(text::body(error.to_string()));
    }

    if signup {
        content = content.push(
            text_input::text_input(fl!("auth-name"), form.name.clone())
                .on_input(|v| Message::AuthInput(AuthField::Name, v))
                .width(Length::Fill),
        );
    }

    content = content.push(
        text_input::text_input(fl!("auth-email"), form.email.clone())
            .on_input(|v| Message::AuthInput(AuthField::Email, v))
            .width(Length::Fill),
    );
    content = content.push(
        text_input::secure_input(fl!("auth-password"), form.password.clone(), None::<Message>, true)
            .on_input(|v| Message::AuthInput(AuthField::Password, v))
            .on_submit(|_| Message::SubmitAuth)
            .width(Length::Fill),
    );

    let submit_label = if signup { fl!("auth-signup") } else { fl!("auth-login") };
    let mut submit = button::suggested(submit_label).width(Length::Fill);
    if !busy && form.is_complete() {
        submit = submit.on_press(Message::SubmitAuth);
    }
    content = content.push(submit);

    let (switch_label, switch_to) = if signup {
        (fl!("auth-have-account"), AuthMode::Login)
    } else {
        (fl!("auth-no-account"), AuthMode::Signup)
    };
    content = content.push(
        button::custom(text::caption(switch_label))
            .class(theme::Button::Text)
            .on_press(Message::SetAuthMode(switch_to)),
    );

    container(content.padding(32))
        .center_x(Length::Fill)
        .center_y(Length::Fill)
        .into()
}
