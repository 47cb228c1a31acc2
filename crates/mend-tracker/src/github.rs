//! GitHub Issues implementation of [`IssueTracker`].

use crate::client::{IssueRef, IssueState, IssueTracker, TrackerError};
use crate::sync::SYNC_LABEL;
use serde::Deserialize;
use serde_json::json;

const API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("mend/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct GithubIssue {
    number: u64,
    title: String,
    state: String,
}

impl From<GithubIssue> for IssueRef {
    fn from(issue: GithubIssue) -> Self {
        IssueRef {
            id: issue.number,
            title: issue.title,
            state: if issue.state == "closed" {
                IssueState::Closed
            } else {
                IssueState::Open
            },
        }
    }
}

/// GitHub REST client scoped to one repository.
#[derive(Debug, Clone)]
pub struct GithubTracker {
    http: reqwest::Client,
    token: String,
    /// `owner/repo`.
    repo: String,
    api_base: String,
}

impl GithubTracker {
    pub fn new(token: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            token: token.into(),
            repo: repo.into(),
            api_base: API_BASE.to_owned(),
        }
    }

    /// Point the client at a non-default API host (test servers).
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    fn issues_url(&self) -> String {
        format!("{}/repos/{}/issues", self.api_base, self.repo)
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", USER_AGENT)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, TrackerError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(TrackerError::Api {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[async_trait::async_trait]
impl IssueTracker for GithubTracker {
    async fn find_issue_by_title(&self, title: &str) -> Result<Option<IssueRef>, TrackerError> {
        let response = self
            .request(self.http.get(self.issues_url()))
            .query(&[
                ("labels", SYNC_LABEL),
                ("state", "all"),
                ("per_page", "100"),
            ])
            .send()
            .await?;
        let issues: Vec<GithubIssue> = Self::check(response).await?.json().await?;
        Ok(issues
            .into_iter()
            .find(|issue| issue.title == title)
            .map(IssueRef::from))
    }

    async fn create_issue(
        &self,
        title: &str,
        body: &str,
        labels: &[String],
    ) -> Result<IssueRef, TrackerError> {
        let response = self
            .request(self.http.post(self.issues_url()))
            .json(&json!({
                "title": title,
                "body": body,
                "labels": labels,
            }))
            .send()
            .await?;
        let issue: GithubIssue = Self::check(response).await?.json().await?;
        Ok(issue.into())
    }

    async fn update_issue(
        &self,
        id: u64,
        body: &str,
        state: IssueState,
    ) -> Result<(), TrackerError> {
        let response = self
            .request(self.http.patch(format!("{}/{id}", self.issues_url())))
            .json(&json!({
                "body": body,
                "state": state.as_str(),
            }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}
