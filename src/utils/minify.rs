//! HTML minification.
//!
//! Wraps the `minify_html` crate; the renderer decides per instance whether
//! minification is enabled (`--skip-minify` turns it off).

use std::borrow::Cow;

/// Minify HTML when `enabled`, otherwise hand the input back untouched.
///
/// Returns `Cow::Borrowed` if minify disabled, `Cow::Owned` if minified.
pub fn minify(html: &[u8], enabled: bool) -> Cow<'_, [u8]> {
    if enabled {
        Cow::Owned(minify_html_inner(html))
    } else {
        Cow::Borrowed(html)
    }
}

/// Minify HTML content using `minify_html` crate.
fn minify_html_inner(html: &[u8]) -> Vec<u8> {
    let mut cfg = minify_html::Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.keep_comments = false;
    cfg.minify_css = true;
    cfg.minify_js = true;
    cfg.remove_bangs = true;
    cfg.remove_processing_instructions = true;
    minify_html::minify(html, &cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minify_html_basic() {
        let html = b"<html>\n  <head>\n  </head>\n  <body>\n    <p>Hello</p>\n  </body>\n</html>";
        let result = minify(html, true);
        let result_str = String::from_utf8_lossy(&result);

        assert!(!result_str.contains("\n  "));
        assert!(result_str.contains("<p>Hello</p>"));
    }

    #[test]
    fn test_minify_html_preserves_content() {
        let result = minify(b"<p>Hello World</p>", true);
        assert!(String::from_utf8_lossy(&result).contains("Hello World"));
    }

    #[test]
    fn test_minify_html_disabled() {
        let html = b"<html>\n  <body>\n  </body>\n</html>";
        let result = minify(html, false);

        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(&*result, html);
    }

    #[test]
    fn test_minify_html_shrinks() {
        let html = b"<html>\n  <body>\n    <div class=\"content\">  text  </div>\n  </body>\n</html>";
        assert!(minify(html, true).len() < minify(html, false).len());
    }

    #[test]
    fn test_minify_is_deterministic() {
        let html = b"<section class=\"content\">\n <h1 class=\"title\">T</h1>\n</section>";
        assert_eq!(minify(html, true), minify(html, true));
    }
}
