use crate::constants::*;
use crate::discovery::is_mailto;
use crate::error::{Error, FailureKind, Result};
use crate::html::{extract_text, Element, HtmlDocument};
use crate::mailto;
use crate::models::{
    CandidateKind, Config, FormDescriptor, FormMethod, UnsubscribeCandidate, UnsubscribeMethod,
    UnsubscribeOutcome,
};
use crate::patterns::{confirms_unsubscribe, is_unsubscribe_form};
use reqwest::{
    cookie::Jar, header::REFERER, redirect::Policy, Client, ClientBuilder, RequestBuilder,
    StatusCode,
};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// A fetched page after redirects.
struct Page {
    status: StatusCode,
    url: Url,
    body: String,
}

impl Page {
    fn confirms_unsubscribe(&self) -> bool {
        confirms_unsubscribe(&extract_text(&self.body))
    }

    /// Non-2xx pages become [`Error::Status`] carrying the start of the body.
    fn ensure_success(self) -> Result<Self> {
        if self.status.is_success() {
            return Ok(self);
        }
        Err(Error::Status {
            status: self.status,
            body: self.body.chars().take(STATUS_BODY_PREVIEW).collect(),
        })
    }
}

/// What the direct GET tier decided.
enum GetVerdict {
    Done(UnsubscribeOutcome),
    Ambiguous,
}

/// Executes unsubscribe candidates.
///
/// Holds configuration only. Every [`execute`](Self::execute) call builds its
/// own HTTP session and cookie jar, so one client can serve any number of
/// concurrent attempts.
#[derive(Debug, Clone)]
pub struct UnsubscribeClient {
    config: Config,
}

impl UnsubscribeClient {
    pub fn new(config: Option<Config>) -> Result<Self> {
        let config = config.unwrap_or_default();
        if let Some(proxy) = &config.proxy_url {
            reqwest::Proxy::all(proxy).map_err(Error::Http)?;
        }
        Ok(Self { config })
    }

    pub fn builder() -> UnsubscribeClientBuilder {
        UnsubscribeClientBuilder::default()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Attempts one candidate and reports a best-effort verdict. Never fails:
    /// network errors, timeouts and bad URLs all come back as a failed outcome.
    pub async fn execute(&self, candidate: &UnsubscribeCandidate) -> UnsubscribeOutcome {
        if candidate.kind == CandidateKind::Mailto || is_mailto(&candidate.url) {
            return prepare_mailto(&candidate.url);
        }

        let url = match parse_target(&candidate.url) {
            Ok(url) => url,
            Err(e) => {
                warn!(url = %candidate.url, "rejecting unsubscribe target: {e}");
                return failed(UnsubscribeMethod::Get, &e, None);
            }
        };

        let client = match self.session() {
            Ok(client) => client,
            Err(e) => return failed(UnsubscribeMethod::Get, &e, host_of(&url)),
        };

        match self.try_get(&client, &url).await {
            GetVerdict::Done(outcome) => outcome,
            GetVerdict::Ambiguous => {
                debug!(url = %url, "no confirmation after GET, looking for a form");
                self.try_form(&client, &url).await
            }
        }
    }

    /// Runs candidates in order and stops at the first success.
    pub async fn execute_all(&self, candidates: &[UnsubscribeCandidate]) -> Vec<UnsubscribeOutcome> {
        let mut outcomes = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let outcome = self.execute(candidate).await;
            let done = outcome.succeeded;
            outcomes.push(outcome);
            if done {
                break;
            }
        }
        outcomes
    }

    async fn try_get(&self, client: &Client, url: &Url) -> GetVerdict {
        let page = match self
            .send(client.get(url.clone()))
            .await
            .and_then(Page::ensure_success)
        {
            Ok(page) => page,
            Err(e) => {
                warn!(url = %url, tier = "get", "request failed: {e}");
                return GetVerdict::Done(failed(UnsubscribeMethod::Get, &e, host_of(url)));
            }
        };
        let detail = Some(format!("HTTP {} from {}", page.status.as_u16(), host_or_url(&page.url)));

        if page.confirms_unsubscribe() {
            info!(url = %url, tier = "get", "unsubscribe confirmed");
            return GetVerdict::Done(UnsubscribeOutcome::success(
                UnsubscribeMethod::Get,
                "Unsubscribe confirmed by the page",
                detail,
            ));
        }
        GetVerdict::Ambiguous
    }

    async fn try_form(&self, client: &Client, url: &Url) -> UnsubscribeOutcome {
        let page = match self
            .send(client.get(url.clone()))
            .await
            .and_then(Page::ensure_success)
        {
            Ok(page) => page,
            Err(e) => {
                warn!(url = %url, tier = "form", "page fetch failed: {e}");
                return failed(UnsubscribeMethod::Form, &e, host_of(url));
            }
        };

        let Some(form) =
            find_unsubscribe_form(&page.body, &page.url, url, &self.config.placeholder_email)
        else {
            info!(url = %url, tier = "form", "no unsubscribe form on page");
            return UnsubscribeOutcome::failure(
                UnsubscribeMethod::Form,
                FailureKind::NoFormFound,
                "no suitable form found",
                host_of(url),
            );
        };

        let action = match Url::parse(&form.action) {
            Ok(action) => action,
            Err(e) => {
                return failed(
                    UnsubscribeMethod::Form,
                    &Error::InvalidUrl(format!("{}: {e}", form.action)),
                    None,
                )
            }
        };
        let target = format!(
            "{} {}",
            if form.method == FormMethod::Get { "GET" } else { "POST" },
            action
        );
        debug!(form = %target, fields = form.fields.len(), "submitting unsubscribe form");

        let request = match form.method {
            FormMethod::Get => client.get(action).query(&form.fields),
            FormMethod::Post => client.post(action).form(&form.fields),
        }
        .headers(build_headers(&[], FORM_HEADERS))
        .header(REFERER, url.as_str());

        let response = match self.send(request).await.and_then(Page::ensure_success) {
            Ok(response) => response,
            Err(e) => {
                warn!(form = %target, "form submission failed: {e}");
                return failed(UnsubscribeMethod::Form, &e, Some(target));
            }
        };
        let detail = Some(format!("{target} -> HTTP {}", response.status.as_u16()));

        if response.confirms_unsubscribe() {
            info!(form = %target, "unsubscribe confirmed after form submission");
            UnsubscribeOutcome::success(
                UnsubscribeMethod::Form,
                "Unsubscribe form submitted and confirmed",
                detail,
            )
        } else {
            UnsubscribeOutcome::failure(
                UnsubscribeMethod::Form,
                FailureKind::AmbiguousResult,
                "Form submitted but the response did not confirm the unsubscribe",
                detail,
            )
        }
    }

    /// One request/response exchange, body included, bounded by the configured timeout.
    async fn send(&self, request: RequestBuilder) -> Result<Page> {
        let timeout = self.config.timeout;
        let exchange = async {
            let resp = request.send().await?;
            let status = resp.status();
            let url = resp.url().clone();
            let body = resp.text().await?;
            Ok::<_, Error>(Page { status, url, body })
        };
        tokio::time::timeout(timeout, exchange)
            .await
            .map_err(|_| Error::Timeout(timeout))?
    }

    fn session(&self) -> Result<Client> {
        let jar = Arc::new(Jar::default());
        let user_agent = self
            .config
            .user_agent
            .clone()
            .unwrap_or_else(|| random_user_agent().to_string());

        let mut builder = ClientBuilder::new()
            .cookie_provider(jar)
            .default_headers(default_headers())
            .user_agent(user_agent)
            .redirect(Policy::limited(self.config.max_redirects))
            .connect_timeout(self.config.timeout);

        if let Some(proxy) = &self.config.proxy_url {
            builder = builder.proxy(reqwest::Proxy::all(proxy).map_err(Error::Http)?);
        } else if !self.config.system_proxy {
            builder = builder.no_proxy();
        }

        builder.build().map_err(Error::Http)
    }
}

/// Builder mirroring the [`Config`] knobs.
#[derive(Debug, Default)]
pub struct UnsubscribeClientBuilder {
    config: Config,
}

impl UnsubscribeClientBuilder {
    pub fn timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = Some(user_agent.into());
        self
    }

    pub fn proxy(mut self, proxy_url: impl Into<String>) -> Self {
        self.config.proxy_url = Some(proxy_url.into());
        self
    }

    pub fn system_proxy(mut self, enabled: bool) -> Self {
        self.config.system_proxy = enabled;
        self
    }

    pub fn placeholder_email(mut self, email: impl Into<String>) -> Self {
        self.config.placeholder_email = email.into();
        self
    }

    pub fn build(self) -> Result<UnsubscribeClient> {
        UnsubscribeClient::new(Some(self.config))
    }
}

fn prepare_mailto(uri: &str) -> UnsubscribeOutcome {
    match mailto::parse_mailto(uri) {
        Ok(instructions) => {
            info!(address = %instructions.address, "mailto unsubscribe prepared, nothing sent");
            UnsubscribeOutcome::success(
                UnsubscribeMethod::Mailto,
                mailto::describe(&instructions),
                Some(format!("mailto {}", instructions.address)),
            )
        }
        Err(e) => failed(UnsubscribeMethod::Mailto, &e, None),
    }
}

fn parse_target(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| Error::InvalidUrl(format!("{raw}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::InvalidUrl(format!("unsupported scheme in {raw}")));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(Error::InvalidUrl(format!("no hostname in {raw}")));
    }
    Ok(url)
}

fn failed(method: UnsubscribeMethod, err: &Error, detail: Option<String>) -> UnsubscribeOutcome {
    let kind = err.failure_kind();
    let message = match (kind, err) {
        (_, Error::Status { status, .. }) => format!("Server returned HTTP {}", status.as_u16()),
        (FailureKind::Timeout, Error::Timeout(_)) => format!("Request {err}"),
        (FailureKind::Timeout, _) => format!("Request timed out: {err}"),
        (FailureKind::InvalidUrl, _) => format!("Invalid unsubscribe target: {err}"),
        _ => format!("Network failure: {err}"),
    };
    UnsubscribeOutcome::failure(method, kind, message, detail)
}

fn host_of(url: &Url) -> Option<String> {
    url.host_str().map(str::to_string)
}

fn host_or_url(url: &Url) -> String {
    host_of(url).unwrap_or_else(|| url.to_string())
}

/// Picks the first form on the page that mentions unsubscribing or confirming
/// and fills its inputs.
pub(crate) fn find_unsubscribe_form(
    html: &str,
    page_url: &Url,
    original_url: &Url,
    placeholder_email: &str,
) -> Option<FormDescriptor> {
    let doc = HtmlDocument::parse(html);
    let form = doc
        .find_elements("form")
        .into_iter()
        .find(|form| is_unsubscribe_form(&form.outer_html()))?;

    let action = form
        .attr("action")
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .and_then(|a| page_url.join(a).ok())
        .unwrap_or_else(|| original_url.clone());

    let method = match form.attr("method") {
        Some(m) if m.trim().eq_ignore_ascii_case("get") => FormMethod::Get,
        _ => FormMethod::Post,
    };

    let fields = form
        .find_elements("input")
        .iter()
        .filter_map(|input| {
            let name = input.attr("name")?.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), field_value(input, name, placeholder_email)))
        })
        .collect();

    Some(FormDescriptor {
        action: action.to_string(),
        method,
        fields,
    })
}

fn field_value(input: &Element<'_>, name: &str, placeholder_email: &str) -> String {
    let kind = input.attr("type").unwrap_or("text").trim().to_ascii_lowercase();
    let existing = input.attr("value").unwrap_or_default();
    let name = name.to_ascii_lowercase();
    match kind.as_str() {
        "submit" | "button" if existing.is_empty() => SUBMIT_FALLBACK_VALUE.to_string(),
        "submit" | "button" | "hidden" => existing.to_string(),
        _ if name.contains("email") => placeholder_email.to_string(),
        _ if name.contains("confirm") => CONFIRM_FIELD_VALUE.to_string(),
        _ => existing.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn first_matching_form_is_filled() {
        let html = r#"
            <form action="/search" method="get"><input name="q" value=""></form>
            <form action="/unsubscribe/confirm">
              <input type="hidden" name="csrf" value="abc123">
              <input type="email" name="Email_Address">
              <input type="checkbox" name="confirm_removal">
              <input type="text" name="reason" value="too many">
              <input type="submit" name="go">
              <input type="text" value="no name">
            </form>
            <form action="/other"><input type="submit" value="Unsubscribe"></form>
        "#;
        let page = url("https://news.example/u/1?t=x");
        let form = find_unsubscribe_form(html, &page, &page, PLACEHOLDER_EMAIL).unwrap();
        assert_eq!(form.action, "https://news.example/unsubscribe/confirm");
        assert_eq!(form.method, FormMethod::Post);
        assert_eq!(
            form.fields,
            vec![
                ("csrf".to_string(), "abc123".to_string()),
                ("Email_Address".to_string(), "user@example.com".to_string()),
                ("confirm_removal".to_string(), "1".to_string()),
                ("reason".to_string(), "too many".to_string()),
                ("go".to_string(), "Unsubscribe".to_string()),
            ]
        );
    }

    #[test]
    fn hidden_fields_named_email_keep_their_value() {
        let html = r#"<form><input type="hidden" name="email" value="real@x.example">
            <button>Unsubscribe</button></form>"#;
        let page = url("https://x.example/u");
        let form = find_unsubscribe_form(html, &page, &page, PLACEHOLDER_EMAIL).unwrap();
        assert_eq!(form.fields, vec![("email".into(), "real@x.example".into())]);
    }

    #[test]
    fn missing_action_falls_back_to_original_url() {
        let html = r#"<form method="GET"><input type="submit" value="Confirm"></form>"#;
        let original = url("https://x.example/u?id=7");
        let landed = url("https://x.example/landing");
        let form = find_unsubscribe_form(html, &landed, &original, PLACEHOLDER_EMAIL).unwrap();
        assert_eq!(form.action, "https://x.example/u?id=7");
        assert_eq!(form.method, FormMethod::Get);
    }

    #[test]
    fn relative_action_resolves_against_landing_page() {
        let html = r#"<form action="done"><input type="submit" value="Afmelden"></form>"#;
        let original = url("https://x.example/u?id=7");
        let landed = url("https://y.example/lists/leave");
        let form = find_unsubscribe_form(html, &landed, &original, PLACEHOLDER_EMAIL).unwrap();
        assert_eq!(form.action, "https://y.example/lists/done");
    }

    #[test]
    fn pages_without_matching_forms() {
        let page = url("https://x.example/");
        assert!(find_unsubscribe_form("<p>hi</p>", &page, &page, PLACEHOLDER_EMAIL).is_none());
        let html = r#"<form action="/login"><input name="user"><input type="password" name="pw"></form>"#;
        assert!(find_unsubscribe_form(html, &page, &page, PLACEHOLDER_EMAIL).is_none());
    }

    #[test]
    fn targets_need_http_and_a_host() {
        assert!(parse_target("https://x.example/u").is_ok());
        assert!(matches!(parse_target("not a url"), Err(Error::InvalidUrl(_))));
        assert!(matches!(parse_target("ftp://x.example/u"), Err(Error::InvalidUrl(_))));
        assert!(matches!(parse_target("file:///etc/passwd"), Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn failed_outcome_messages() {
        let outcome = failed(
            UnsubscribeMethod::Get,
            &Error::Timeout(std::time::Duration::from_secs(10)),
            None,
        );
        assert_eq!(outcome.message, "Request timed out after 10 seconds");
        assert_eq!(outcome.failure, Some(FailureKind::Timeout));

        let outcome = failed(
            UnsubscribeMethod::Form,
            &Error::Status {
                status: StatusCode::SERVICE_UNAVAILABLE,
                body: "down".into(),
            },
            None,
        );
        assert_eq!(outcome.message, "Server returned HTTP 503");
        assert_eq!(outcome.failure, Some(FailureKind::HttpStatus));
    }

    #[test]
    fn error_pages_become_status_errors() {
        let page = Page {
            status: StatusCode::NOT_FOUND,
            url: url("https://x.example/u"),
            body: "x".repeat(STATUS_BODY_PREVIEW * 2),
        };
        match page.ensure_success() {
            Err(Error::Status { status, body }) => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(body.len(), STATUS_BODY_PREVIEW);
            }
            _ => panic!("expected a status error"),
        }
    }

    #[tokio::test]
    async fn mailto_is_prepared_not_sent() {
        let client = UnsubscribeClient::new(None).unwrap();
        let candidate =
            UnsubscribeCandidate::mailto("mailto:off@list.example?subject=unsubscribe", "Unsubscribe");
        let outcome = client.execute(&candidate).await;
        assert!(outcome.succeeded);
        assert_eq!(outcome.method, UnsubscribeMethod::Mailto);
        assert!(outcome.message.contains("off@list.example"));
    }

    #[tokio::test]
    async fn malformed_target_is_an_outcome_not_an_error() {
        let client = UnsubscribeClient::new(None).unwrap();
        let outcome = client
            .execute(&UnsubscribeCandidate::link("https://", "Unsubscribe"))
            .await;
        assert!(!outcome.succeeded);
        assert_eq!(outcome.failure, Some(FailureKind::InvalidUrl));
    }
}
