use car_notes_shared::errors::{ApiError, ErrorBody};
use secrecy::{ExposeSecret as _, SecretString};

pub fn get_text_height(ui: &mut egui::Ui) -> f32 {
    egui::TextStyle::Body
        .resolve(ui.style())
        .size
        .max(ui.spacing().interact_size.y)
}

pub fn ui_password_edit(
    ui: &mut egui::Ui,
    password: &mut SecretString,
    hint_text: &str,
) -> egui::Response {
    let mut temp = password.expose_secret().to_owned();
    let result = ui.add(
        egui::TextEdit::singleline(&mut temp)
            .password(true)
            .hint_text(hint_text),
    );
    *password = SecretString::from(temp);
    result
}

/// Single line text edit with the messages reported for `field` below it
pub fn ui_text_field(
    ui: &mut egui::Ui,
    value: &mut String,
    hint_text: &str,
    errors: &ErrorBody,
    field: &str,
) -> egui::Response {
    let result = ui.add(egui::TextEdit::singleline(value).hint_text(hint_text));
    ui_field_errors(ui, errors, field);
    result
}

pub fn ui_field_errors(ui: &mut egui::Ui, errors: &ErrorBody, field: &str) {
    if let Some(messages) = errors.field(field) {
        for msg in messages {
            ui.colored_label(ui.visuals().error_fg_color, msg);
        }
    }
}

/// Shows every message of the body, fields are prefixed with their name
pub fn ui_error_body(ui: &mut egui::Ui, errors: &ErrorBody) {
    for line in errors.display_lines() {
        ui.colored_label(ui.visuals().error_fg_color, line);
    }
}

/// The messages of `errors` that are not for one of `fields`
pub fn other_errors(errors: &ErrorBody, fields: &[&str]) -> ErrorBody {
    match errors {
        ErrorBody::Fields(map) => {
            let mut result = ErrorBody::Empty;
            for (field, messages) in map.iter().filter(|(k, _)| !fields.contains(&k.as_str())) {
                for msg in messages {
                    result.push_field_error(field.as_str(), msg.as_str());
                }
            }
            result
        }
        other => other.clone(),
    }
}

/// Recovers the body sent by the server or describes the failure as a single
/// message if the request did not get a response
pub fn error_body(err: &anyhow::Error) -> ErrorBody {
    match err.downcast_ref::<ApiError>() {
        Some(api_error) if !api_error.body.is_empty() => api_error.body.clone(),
        _ => ErrorBody::Detail(format!("{err:#}")),
    }
}

/// Returns true if enter was pressed while the response had focus
pub fn submitted(ui: &egui::Ui, response: &egui::Response) -> bool {
    response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn other_errors_skips_shown_fields() {
        let mut errors = ErrorBody::field_error("brand", "This field may not be blank.");
        errors.push_field_error("non_field_errors", "Something else.");
        assert_eq!(
            other_errors(&errors, &["brand", "model"]),
            ErrorBody::field_error("non_field_errors", "Something else.")
        );
        assert!(other_errors(&errors, &["brand", "non_field_errors"]).is_empty());
    }

    #[test]
    fn other_errors_keeps_detail() {
        let errors = ErrorBody::Detail("Could not log in.".into());
        assert_eq!(other_errors(&errors, &["email"]), errors);
    }

    #[test]
    fn api_error_body_kept() {
        let body = ErrorBody::field_error("password", "Wrong password.");
        let err = anyhow::Error::from(ApiError::new(400, body.clone()));
        assert_eq!(error_body(&err), body);
    }

    #[test]
    fn empty_api_error_body_described_by_status() {
        let err = anyhow::Error::from(ApiError::new(500, ErrorBody::Empty));
        assert_eq!(
            error_body(&err),
            ErrorBody::Detail("request failed with status code: 500 and no body".into())
        );
    }

    #[test]
    fn other_errors_include_context() {
        let err = anyhow::anyhow!("connection refused").context("failed to send request");
        assert_eq!(
            error_body(&err),
            ErrorBody::Detail("failed to send request: connection refused".into())
        );
    }
}
