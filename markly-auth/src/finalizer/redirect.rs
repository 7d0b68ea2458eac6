use url::{form_urlencoded, Url};

use crate::error::AuthError;

/// What an incoming page URL carries from an OAuth redirect
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectArtifacts {
    /// The dedicated callback route, handled elsewhere
    CallbackRoute,
    /// Ordinary page load
    None,
    /// Authorization code flow: `?code=...`
    Code(String),
    /// Provider failure reported in the query: `?error_description=...`
    Denied(String),
    /// Implicit flow: `#access_token=...` or `#error_description=...`
    Fragment(FragmentParams),
}

impl RedirectArtifacts {
    pub fn inspect(location: &Url, callback_path: &str) -> Self {
        if location.path() == callback_path {
            return Self::CallbackRoute;
        }

        let mut code = None;
        let mut denied = None;
        for (key, value) in location.query_pairs() {
            match key.as_ref() {
                "code" if !value.is_empty() => code = Some(value.into_owned()),
                "error_description" if !value.is_empty() => denied = Some(value.into_owned()),
                _ => {}
            }
        }

        if let Some(code) = code {
            return Self::Code(code);
        }
        if let Some(description) = denied {
            return Self::Denied(description);
        }

        match location.fragment().map(FragmentParams::parse) {
            Some(params) if params.is_redirect() => Self::Fragment(params),
            _ => Self::None,
        }
    }
}

/// Key/value pairs of a URL hash fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentParams {
    pairs: Vec<(String, String)>,
}

/// Tokens extracted from an implicit-flow fragment
#[derive(Debug, PartialEq, Eq)]
pub struct FragmentTokens {
    pub access_token: String,
    pub refresh_token: String,
}

impl FragmentParams {
    pub fn parse(fragment: &str) -> Self {
        let pairs = form_urlencoded::parse(fragment.trim_start_matches('#').as_bytes())
            .into_owned()
            .collect();
        Self { pairs }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn is_redirect(&self) -> bool {
        self.get("access_token").is_some() || self.get("error_description").is_some()
    }

    /// A provider error wins over any tokens; the refresh token is optional
    pub fn tokens(&self) -> Result<FragmentTokens, AuthError> {
        if let Some(description) = self.get("error_description") {
            return Err(AuthError::Provider(description.to_string()));
        }

        let access_token = self
            .get("access_token")
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingAccessToken)?;

        Ok(FragmentTokens {
            access_token: access_token.to_string(),
            refresh_token: self.get("refresh_token").unwrap_or_default().to_string(),
        })
    }
}

/// The location with every redirect artifact removed: only the path survives
pub fn scrubbed(location: &Url) -> Url {
    let mut clean = location.clone();
    clean.set_query(None);
    clean.set_fragment(None);
    clean
}
