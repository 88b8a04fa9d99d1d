//! Qt documentation lookup.

use crate::services::cmake_cache::QtVersionFamily;

const DOC_BASE_URL: &str = "https://doc.qt.io";

/// Documentation page for a class or topic, e.g. `QString` → `.../qstring.html`.
///
/// Defaults to the Qt 5 docs when the version family is unknown.
pub fn help_url(term: &str, family: Option<QtVersionFamily>) -> String {
    let major = family.unwrap_or(QtVersionFamily::Qt5).major();
    format!(
        "{}/qt-{}/{}.html",
        DOC_BASE_URL,
        major,
        term.trim().to_lowercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_help_url_lowercases_term() {
        assert_eq!(
            help_url("QString", None),
            "https://doc.qt.io/qt-5/qstring.html"
        );
    }

    #[test]
    fn test_help_url_qt6() {
        assert_eq!(
            help_url(" QWidget ", Some(QtVersionFamily::Qt6)),
            "https://doc.qt.io/qt-6/qwidget.html"
        );
    }
}
