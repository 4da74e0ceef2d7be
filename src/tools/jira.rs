use super::params::JiraCreateParams;
use super::{Capability, CapabilityError, ToolError};
use crate::config::JiraConfig;
use crate::shared::logging::{EngineLog, LogLevel};
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use serde_json::{json, Map, Value};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
struct JiraCredentials {
    base_url: String,
    email: String,
    api_token: String,
}

/// `jira.create`: files a ticket through the Jira Cloud REST API v3.
#[derive(Clone)]
pub struct JiraClient {
    base_url: Option<String>,
    email: Option<String>,
    api_token: Option<String>,
    default_project: String,
    issue_type: String,
    agent: ureq::Agent,
    log: EngineLog,
}

fn present(value: &Option<String>) -> Option<String> {
    value.clone().filter(|v| !v.trim().is_empty())
}

/// Jira v3 takes descriptions as Atlassian Document Format.
pub fn description_document(description: &str) -> Value {
    let paragraph = if description.is_empty() {
        json!({ "type": "paragraph", "content": [] })
    } else {
        json!({
            "type": "paragraph",
            "content": [{ "type": "text", "text": description }],
        })
    };
    json!({ "type": "doc", "version": 1, "content": [paragraph] })
}

impl JiraClient {
    pub fn new(config: &JiraConfig, timeout: Duration, log: EngineLog) -> Self {
        Self {
            base_url: config.base_url.clone(),
            email: config.email.clone(),
            api_token: config.api_token.clone(),
            default_project: config.default_project.clone(),
            issue_type: config.issue_type.clone(),
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            log,
        }
    }

    fn credentials(&self) -> Result<JiraCredentials, CapabilityError> {
        let base_url = present(&self.base_url);
        let email = present(&self.email);
        let api_token = present(&self.api_token);
        match (base_url, email, api_token) {
            (Some(base_url), Some(email), Some(api_token)) => Ok(JiraCredentials {
                base_url,
                email,
                api_token,
            }),
            (base_url, email, api_token) => {
                let missing: Vec<&str> = [
                    ("JIRA_BASE_URL", base_url.is_none()),
                    ("JIRA_EMAIL", email.is_none()),
                    ("JIRA_API_TOKEN", api_token.is_none()),
                ]
                .into_iter()
                .filter(|(_, missing)| *missing)
                .map(|(key, _)| key)
                .collect();
                Err(CapabilityError::NotConfigured(format!(
                    "Missing required environment variables: {}",
                    missing.join(", ")
                )))
            }
        }
    }

    pub fn issue_payload(&self, params: &JiraCreateParams) -> Value {
        let project_key = params
            .project_key
            .clone()
            .unwrap_or_else(|| self.default_project.clone());
        json!({
            "fields": {
                "project": { "key": project_key },
                "summary": params.summary,
                "description": description_document(&params.description),
                "issuetype": { "name": self.issue_type },
            }
        })
    }

    pub fn create_issue(&self, params: &JiraCreateParams) -> Result<String, CapabilityError> {
        let credentials = self.credentials().inspect_err(|err| {
            self.log.error("jira.create", &err.to_string());
        })?;
        let url = format!(
            "{}/rest/api/3/issue",
            credentials.base_url.trim_end_matches('/')
        );
        let auth = BASE64_STANDARD.encode(format!(
            "{}:{}",
            credentials.email, credentials.api_token
        ));
        let payload = self.issue_payload(params);

        self.log.record(
            LogLevel::Info,
            "jira.create",
            &format!("Creating Jira ticket: {}", params.summary),
            &[("project", payload["fields"]["project"]["key"].clone())],
        );

        let result = self
            .agent
            .post(&url)
            .set("Accept", "application/json")
            .set("Authorization", &format!("Basic {auth}"))
            .send_json(payload);

        let (status, body) = match result {
            Ok(response) => {
                let status = response.status();
                let body = response
                    .into_string()
                    .map_err(|e| CapabilityError::Request(e.to_string()))?;
                (status, body)
            }
            Err(ureq::Error::Status(status, response)) => {
                (status, response.into_string().unwrap_or_default())
            }
            Err(err) => {
                self.log
                    .error("jira.create", &format!("Request failed: {err}"));
                return Err(CapabilityError::Request(err.to_string()));
            }
        };

        if status != 201 {
            let message =
                format!("Failed to create Jira ticket. Status: {status}, Response: {body}");
            self.log.error("jira.create", &message);
            return Err(CapabilityError::Rejected(message));
        }

        let created: Value = serde_json::from_str(&body).unwrap_or(Value::String(body));
        self.log.record(
            LogLevel::Info,
            "jira.create",
            "Successfully created Jira ticket",
            &[("key", created.get("key").cloned().unwrap_or(Value::Null))],
        );
        Ok(match created {
            Value::String(text) => text,
            other => other.to_string(),
        })
    }
}

impl Capability for JiraClient {
    fn invoke(&self, params: &Map<String, Value>) -> Result<String, ToolError> {
        let params = JiraCreateParams::from_params(params)?;
        Ok(self.create_issue(&params)?)
    }
}
