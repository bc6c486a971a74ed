use url::Url;

/// The transient camera/viewport parameter. Blacklisted by default: a
/// shared embed should open at the map's own default view, not wherever
/// the author's camera happened to be.
pub const VIEW_PARAM: &str = "view";

/// Legacy alias the viewer accepts for `embed=true`; never re-emitted.
const HIDE_UI_PARAM: &str = "hideUI";

const EMBED_PARAM: &str = "embed";

/// Policy knobs for [`embed_url`].
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct EmbedOptions {
    /// Keep the `view` parameter (percent-encoded) instead of stripping it.
    pub keep_view: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbedError {
    InvalidUrl(String),
}

impl std::fmt::Display for EmbedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbedError::InvalidUrl(reason) => write!(f, "not a valid absolute URL: {reason}"),
        }
    }
}

impl std::error::Error for EmbedError {}

/// Produces the sanitized embed URL for a viewer URL.
///
/// The output query always starts with `embed=true`; every other parameter
/// keeps its value and relative order, re-encoded with standard
/// percent-encoding. `view` is dropped unless `options.keep_view` is set.
///
/// Pure: same input, same output; no network access.
pub fn embed_url(input: &str, options: EmbedOptions) -> Result<String, EmbedError> {
    let mut url = Url::parse(input).map_err(|e| EmbedError::InvalidUrl(e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(EmbedError::InvalidUrl(
            "URL has no host/path structure".to_string(),
        ));
    }

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    {
        let mut query = url.query_pairs_mut();
        query.clear();
        query.append_pair(EMBED_PARAM, "true");
        for (key, value) in &pairs {
            if key == EMBED_PARAM || key == HIDE_UI_PARAM {
                continue;
            }
            if key == VIEW_PARAM && !options.keep_view {
                continue;
            }
            query.append_pair(key, value);
        }
    }

    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_view_and_forces_embed_first() {
        let out = embed_url(
            "https://host/?view=10,10,5&poi=Castle&map=world-1",
            EmbedOptions::default(),
        )
        .unwrap();
        assert_eq!(out, "https://host/?embed=true&poi=Castle&map=world-1");
    }

    #[test]
    fn keep_view_policy_percent_encodes() {
        let out = embed_url(
            "https://host/?view=10,10,5&poi=Castle&map=world-1",
            EmbedOptions { keep_view: true },
        )
        .unwrap();
        assert_eq!(
            out,
            "https://host/?embed=true&view=10%2C10%2C5&poi=Castle&map=world-1"
        );
    }

    #[test]
    fn preserves_parameter_order_and_values() {
        let out = embed_url(
            "https://host/viewer?map=world-1&poi=Old%20Cairn&zoom=3",
            EmbedOptions::default(),
        )
        .unwrap();
        assert_eq!(
            out,
            "https://host/viewer?embed=true&map=world-1&poi=Old+Cairn&zoom=3"
        );
    }

    #[test]
    fn existing_embed_and_alias_are_not_duplicated() {
        let out = embed_url(
            "https://host/?embed=false&hideUI=true&map=world-1",
            EmbedOptions::default(),
        )
        .unwrap();
        assert_eq!(out, "https://host/?embed=true&map=world-1");
    }

    #[test]
    fn url_without_query_gains_one() {
        let out = embed_url("https://host/viewer", EmbedOptions::default()).unwrap();
        assert_eq!(out, "https://host/viewer?embed=true");
    }

    #[test]
    fn rejects_relative_and_garbage_input() {
        assert!(matches!(
            embed_url("/viewer?map=world-1", EmbedOptions::default()),
            Err(EmbedError::InvalidUrl(_))
        ));
        assert!(matches!(
            embed_url("not a url at all", EmbedOptions::default()),
            Err(EmbedError::InvalidUrl(_))
        ));
    }

    #[test]
    fn is_deterministic() {
        let input = "https://host/?a=1&view=2,2&b=3";
        let first = embed_url(input, EmbedOptions::default()).unwrap();
        let second = embed_url(input, EmbedOptions::default()).unwrap();
        assert_eq!(first, second);
    }
}
