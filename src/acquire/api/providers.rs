use crate::model::SourceDescriptor;

/// Known REST providers. Anything unrecognized goes through `Generic`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderId {
    Remotive,
    Adzuna,
    Generic,
}

/// Ordered field aliases; the first present, non-empty value wins. Dotted
/// paths reach into nested objects.
#[derive(Debug)]
pub struct FieldMap {
    pub title: &'static [&'static str],
    pub company: &'static [&'static str],
    pub description: &'static [&'static str],
    pub url: &'static [&'static str],
}

/// Query parameter a credential travels in, and the env var it may come from.
#[derive(Debug)]
pub struct Credential {
    pub param: &'static str,
    pub env: &'static str,
}

#[derive(Debug)]
pub struct ProviderSpec {
    pub id: ProviderId,
    pub signature: Option<&'static str>,
    pub base_url: Option<&'static str>,
    pub search_keys: &'static [&'static str],
    pub limit_key: &'static str,
    pub limit_cap: Option<usize>,
    pub container_key: Option<&'static str>,
    pub fields: FieldMap,
    /// Fixed `source` value; `None` tags jobs with the descriptor name.
    pub tag: Option<&'static str>,
    pub credentials: &'static [Credential],
    /// Send a desktop User-Agent and `Accept: application/json`.
    pub browser_headers: bool,
}

impl ProviderSpec {
    /// Keys our own values occupy; caller params never overwrite them.
    pub fn reserved_keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.search_keys
            .iter()
            .copied()
            .chain(std::iter::once(self.limit_key))
            .chain(self.credentials.iter().map(|c| c.param))
    }

    pub fn limit_for(&self, max_results: usize) -> usize {
        self.limit_cap.map_or(max_results, |cap| max_results.min(cap))
    }
}

pub static REMOTIVE: ProviderSpec = ProviderSpec {
    id: ProviderId::Remotive,
    signature: Some("remotive"),
    base_url: Some("https://remotive.com/api/remote-jobs"),
    search_keys: &["search"],
    limit_key: "limit",
    limit_cap: None,
    container_key: Some("jobs"),
    fields: FieldMap {
        title: &["title"],
        company: &["company_name"],
        description: &["description"],
        url: &["url"],
    },
    tag: Some("remotive"),
    credentials: &[],
    browser_headers: false,
};

pub static ADZUNA: ProviderSpec = ProviderSpec {
    id: ProviderId::Adzuna,
    signature: Some("adzuna"),
    base_url: Some("https://api.adzuna.com/v1/api/jobs/us/search/1"),
    search_keys: &["what"],
    limit_key: "results_per_page",
    limit_cap: Some(50),
    container_key: Some("results"),
    fields: FieldMap {
        title: &["title"],
        company: &["company.display_name"],
        description: &["description"],
        url: &["redirect_url"],
    },
    tag: Some("adzuna"),
    credentials: &[
        Credential { param: "app_id", env: "ADZUNA_APP_ID" },
        Credential { param: "app_key", env: "ADZUNA_APP_KEY" },
    ],
    browser_headers: true,
};

pub static GENERIC: ProviderSpec = ProviderSpec {
    id: ProviderId::Generic,
    signature: None,
    base_url: None,
    search_keys: &["query", "q"],
    limit_key: "limit",
    limit_cap: None,
    container_key: None,
    fields: FieldMap {
        title: &["title", "name", "position"],
        company: &["company_name", "company", "company.display_name", "employer"],
        description: &["description", "summary", "snippet"],
        url: &["url", "redirect_url", "link", "apply_url"],
    },
    tag: None,
    credentials: &[],
    browser_headers: false,
};

// Signature providers in match order.
static KNOWN: &[&ProviderSpec] = &[&REMOTIVE, &ADZUNA];

impl ProviderId {
    /// First known provider whose signature appears in the endpoint or name.
    pub fn select(source: &SourceDescriptor) -> Self {
        KNOWN
            .iter()
            .find(|spec| spec.signature.is_some_and(|sig| source.mentions(sig)))
            .map_or(ProviderId::Generic, |spec| spec.id)
    }

    pub fn spec(self) -> &'static ProviderSpec {
        match self {
            ProviderId::Remotive => &REMOTIVE,
            ProviderId::Adzuna => &ADZUNA,
            ProviderId::Generic => &GENERIC,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderId::Remotive => "remotive",
            ProviderId::Adzuna => "adzuna",
            ProviderId::Generic => "generic",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SourceKind;

    fn src(name: &str, endpoint: &str) -> SourceDescriptor {
        SourceDescriptor {
            id: None,
            name: name.into(),
            endpoint: endpoint.into(),
            kind: SourceKind::Api,
            headers: Default::default(),
            params: Default::default(),
        }
    }

    #[test]
    fn selects_by_endpoint_or_name() {
        assert_eq!(ProviderId::select(&src("Remote jobs", "https://remotive.com/api/remote-jobs")), ProviderId::Remotive);
        assert_eq!(ProviderId::select(&src("ADZUNA US", "")), ProviderId::Adzuna);
        assert_eq!(ProviderId::select(&src("Board", "https://jobs.example.com/api")), ProviderId::Generic);
    }

    #[test]
    fn adzuna_reserves_credentials_and_caps_limit() {
        let spec = ProviderId::Adzuna.spec();
        let reserved: Vec<_> = spec.reserved_keys().collect();
        assert_eq!(reserved, vec!["what", "results_per_page", "app_id", "app_key"]);
        assert_eq!(spec.limit_for(200), 50);
        assert_eq!(ProviderId::Remotive.spec().limit_for(200), 200);
    }
}
