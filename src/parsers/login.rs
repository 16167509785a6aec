use crate::error::{CheckinError, Result};
use scraper::{Html, Selector};

/// Validates the login page and collects its hidden form fields.
///
/// The page must carry the `#email` and `#passwd` inputs. Hidden inputs
/// (CSRF tokens and the like) are returned so the submit can echo them.
pub fn parse_login_form(html: &str) -> Result<Vec<(String, String)>> {
    let document = Html::parse_document(html);

    for id in ["#email", "#passwd"] {
        let selector = Selector::parse(id).unwrap();
        if document.select(&selector).next().is_none() {
            return Err(CheckinError::ElementNotFound(format!("Login input {}", id)));
        }
    }

    let hidden_selector = Selector::parse("input[type=\"hidden\"][name]").unwrap();
    let hidden = document
        .select(&hidden_selector)
        .filter_map(|input| {
            let name = input.value().attr("name")?;
            let value = input.value().attr("value").unwrap_or_default();
            Some((name.to_string(), value.to_string()))
        })
        .collect();

    Ok(hidden)
}

/// Whether a page is the login form rather than an authenticated page.
pub fn is_login_page(html: &str) -> bool {
    let document = Html::parse_document(html);
    let selector = Selector::parse("#passwd").unwrap();
    document.select(&selector).next().is_some()
}
