use crate::core::app::{App, SessionContext, SessionOverrides};
use crate::core::config::Config;
use crate::ui::theme::Theme;

/// An app with default settings. The base URL is passed as an override so
/// the environment cannot leak into tests.
pub fn create_test_app() -> App {
    let session = SessionContext::resolve(
        &Config::default(),
        SessionOverrides {
            model: None,
            base_url: Some("https://example.invalid/v1".to_string()),
        },
        "test-key".to_string(),
    )
    .expect("default config resolves");
    App::new(session, Theme::dark_default())
}
