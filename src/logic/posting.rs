// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! HTTP boundary: multipart post submission and post deletion.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use reqwest::blocking::{Client, multipart};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::models::candidate::CandidateFile;

/// Server-assigned post identifier.
pub type PostId = u64;

/// Everything sent with one post.
#[derive(Clone, Debug)]
pub struct NewPost {
    pub text: String,
    pub poster: String,
    pub board: String,
    pub thread_id: Option<PostId>,
    /// Multipart field name shared by all file parts.
    pub file_field: String,
    pub files: Vec<CandidateFile>,
}

/// Successful submission; `id` is present when the server echoed the created post.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostCreated {
    pub id: Option<PostId>,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    /// The server answered with an error status and (usually) a message list.
    #[error("server rejected the request (HTTP {status}): {}", .messages.join("; "))]
    Rejected { status: u16, messages: Vec<String> },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to read attachment {}: {source}", .path.display())]
    Attachment {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SubmitError {
    /// Human-readable lines for the form's error block.
    pub fn messages(&self) -> Vec<String> {
        match self {
            SubmitError::Rejected { messages, .. } => messages.clone(),
            other => vec![other.to_string()],
        }
    }
}

/// Blocking client for the posting and deletion endpoints.
#[derive(Clone, Debug)]
pub struct PostingClient {
    http: Client,
    base_url: String,
    posting_path: String,
    delete_path: String,
}

impl PostingClient {
    /// Build a client from server settings. Redirects are not followed; a 3xx counts as success.
    pub fn new(server: &ServerConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(server.timeout_secs))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: server.base_url.trim_end_matches('/').to_string(),
            posting_path: server.posting_path.clone(),
            delete_path: server.delete_path.clone(),
        })
    }

    pub fn posting_url(&self) -> String {
        join_url(&self.base_url, &self.posting_path)
    }

    pub fn delete_url(&self, id: PostId) -> String {
        join_url(
            &self.base_url,
            &self.delete_path.replace("{id}", &id.to_string()),
        )
    }

    /// Send a post as `multipart/form-data`.
    ///
    /// # Errors
    ///
    /// [`SubmitError::Rejected`] for 4xx/5xx answers, [`SubmitError::Attachment`] when a
    /// file cannot be opened, [`SubmitError::Transport`] for network failures.
    pub fn submit(&self, post: &NewPost) -> Result<PostCreated, SubmitError> {
        let url = self.posting_url();
        info!(%url, files = post.files.len(), board = %post.board, "submitting post");

        let form = build_form(post)?;
        let response = self.http.post(&url).multipart(form).send()?;
        let status = response.status();
        let body = response.text().unwrap_or_default();

        if is_success(status) {
            let created = PostCreated {
                id: parse_created_id(&body),
            };
            info!(status = status.as_u16(), id = ?created.id, "post accepted");
            Ok(created)
        } else {
            let messages = parse_error_payload(status.as_u16(), &body);
            warn!(status = status.as_u16(), ?messages, "post rejected");
            Err(SubmitError::Rejected {
                status: status.as_u16(),
                messages,
            })
        }
    }

    /// Delete a post. No request body is sent.
    pub fn delete(&self, id: PostId) -> Result<(), SubmitError> {
        let url = self.delete_url(id);
        info!(%url, id, "deleting post");

        let response = self.http.delete(&url).send()?;
        let status = response.status();
        if is_success(status) {
            return Ok(());
        }
        let body = response.text().unwrap_or_default();
        let messages = parse_error_payload(status.as_u16(), &body);
        warn!(status = status.as_u16(), ?messages, "delete rejected");
        Err(SubmitError::Rejected {
            status: status.as_u16(),
            messages,
        })
    }
}

/// Assemble the multipart body: text fields, one part per file, then the hidden identifiers.
pub fn build_form(post: &NewPost) -> Result<multipart::Form, SubmitError> {
    let mut form = multipart::Form::new()
        .text("text", post.text.clone())
        .text("poster", post.poster.clone());

    for file in &post.files {
        let part = multipart::Part::file(file.path()).map_err(|source| {
            SubmitError::Attachment {
                path: file.path().to_path_buf(),
                source,
            }
        })?;
        let part = part.file_name(file.name().to_string()).mime_str(file.mime())?;
        form = form.part(post.file_field.clone(), part);
    }

    form = form.text("board", post.board.clone());
    if let Some(thread_id) = post.thread_id {
        form = form.text("threadId", thread_id.to_string());
    }
    Ok(form)
}

/// Flatten an error payload into display lines.
///
/// Understands `{"errors": "..."}`, `{"errors": [...]}`, and field maps such as
/// `{"file": ["file too large"]}`. Anything else becomes `HTTP <status>`.
pub fn parse_error_payload(status: u16, body: &str) -> Vec<String> {
    let mut messages = Vec::new();
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        match value.get("errors") {
            Some(errors) => collect_messages(errors, &mut messages),
            None => collect_messages(&value, &mut messages),
        }
    }
    if messages.is_empty() {
        messages.push(format!("HTTP {status}"));
    }
    messages
}

/// Pull a numeric `id` out of a JSON success body.
pub fn parse_created_id(body: &str) -> Option<PostId> {
    serde_json::from_str::<Value>(body)
        .ok()?
        .get("id")?
        .as_u64()
}

fn collect_messages(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(text) if !text.trim().is_empty() => out.push(text.clone()),
        Value::Array(items) => items.iter().for_each(|item| collect_messages(item, out)),
        Value::Object(map) => map.values().for_each(|item| collect_messages(item, out)),
        _ => {}
    }
}

fn is_success(status: StatusCode) -> bool {
    status.is_success() || status.is_redirection()
}

fn join_url(base: &str, path: &str) -> String {
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}
