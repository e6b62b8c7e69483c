use tracing::warn;

/// Locales shipped in `locales/`
pub const AVAILABLE_LOCALES: [&str; 2] = ["en", "fi"];

/// Set the locale used for user-visible messages.
///
/// Accepts tags like `fi-FI` by falling back to the language part; unknown locales keep English.
pub fn set_locale(locale: &str) {
    let language = locale.split(['-', '_']).next().unwrap_or(locale);

    if AVAILABLE_LOCALES.contains(&language) {
        rust_i18n::set_locale(language);
    } else {
        warn!("Unsupported locale {}, using en", locale);
        rust_i18n::set_locale("en");
    }
}
