//! Fetch WMS capabilities from live environments.
//!
//! Credential files live at `envs/.<group>.<env>.env`. For each one we log in
//! to obtain a JWT, request GetCapabilities, and save the JSON response to
//! `input/<group>/<env>.json`, where the group collector picks it up.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use indexmap::IndexMap;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Url;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{FetchError, FetchStage, Result};
use crate::logging::HARVEST_FETCH;

const LOGIN_TIMEOUT: Duration = Duration::from_secs(30);
const CAPABILITIES_TIMEOUT: Duration = Duration::from_secs(60);

/// Login response fields probed for a JWT, in priority order.
const TOKEN_CANDIDATES: [&str; 6] = [
    "token",
    "access_token",
    "accessToken",
    "jwt",
    "id_token",
    "idToken",
];

pub type EnvVars = IndexMap<String, String>;

/// Body posted to `LOGIN_URL`.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// One credential file.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvEntry {
    pub group: String,
    pub env_name: String,
    pub vars: EnvVars,
}

impl EnvEntry {
    /// Reads an arbitrary env file. Names not following `.<group>.<env>.env`
    /// fall back to the parent directory as group and the stem as env name.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (env_name, group) = match parse_env_filename(&file_name) {
            Some(parsed) => parsed,
            None => {
                let group = path
                    .parent()
                    .and_then(Path::file_name)
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let stem = path
                    .file_stem()
                    .map(|n| n.to_string_lossy().trim_start_matches('.').to_string())
                    .unwrap_or_default();
                (stem, group)
            }
        };
        Ok(Self {
            group,
            env_name,
            vars: parse_env_file(path)?,
        })
    }

    fn var(&self, key: &str) -> &str {
        self.vars.get(key).map(|v| v.trim()).unwrap_or("")
    }

    pub fn login_request(&self) -> LoginRequest<'_> {
        LoginRequest {
            username: self.var("USERNAME"),
            password: self.var("PASSWORD"),
        }
    }

    /// Host of `BASE_URL`, or of `LOGIN_URL` when no base URL is set.
    pub fn slug(&self) -> String {
        let base = self.var("BASE_URL");
        let raw = if base.is_empty() { self.var("LOGIN_URL") } else { base };
        url_slug(raw)
    }
}

/// Parses `KEY=VALUE` lines, skipping blanks and `#` comments.
pub fn parse_env_str(text: &str) -> EnvVars {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            let (key, value) = line.split_once('=').unwrap_or((line, ""));
            (key.trim().to_string(), value.trim().to_string())
        })
        .collect()
}

pub fn parse_env_file(path: &Path) -> Result<EnvVars> {
    Ok(parse_env_str(&fs::read_to_string(path)?))
}

/// Splits `.<group>.<env>.env` into `(env, group)`. The group may itself
/// contain dots; the environment is the last dotted component.
pub fn parse_env_filename(name: &str) -> Option<(String, String)> {
    let inner = name.strip_prefix('.')?.strip_suffix(".env")?;
    let (group, env_name) = inner.rsplit_once('.')?;
    Some((env_name.to_string(), group.to_string()))
}

/// Credential files in `envs_dir`, sorted by group then environment.
pub fn scan_envs(envs_dir: &Path) -> Result<Vec<EnvEntry>> {
    if !envs_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut paths: Vec<PathBuf> = fs::read_dir(envs_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .collect();
    paths.sort();

    let mut entries = Vec::new();
    for path in paths {
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        let Some((env_name, group)) = parse_env_filename(&name) else {
            continue;
        };
        entries.push(EnvEntry {
            group,
            env_name,
            vars: parse_env_file(&path)?,
        });
    }
    entries.sort_by(|a, b| (&a.group, &a.env_name).cmp(&(&b.group, &b.env_name)));
    Ok(entries)
}

/// Filename-safe slug from a URL: its host name, or `""`.
///
/// `https://dev.example.org/graph/api/v1/login` becomes `dev.example.org`.
pub fn url_slug(url: &str) -> String {
    Url::parse(url.trim())
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default()
}

/// Host slug per group; the first entry of a group with a usable URL wins.
pub fn group_slugs(entries: &[EnvEntry]) -> IndexMap<String, String> {
    let mut slugs = IndexMap::new();
    for entry in entries {
        if slugs.contains_key(&entry.group) {
            continue;
        }
        let slug = entry.slug();
        if !slug.is_empty() {
            slugs.insert(entry.group.clone(), slug);
        }
    }
    slugs
}

/// First non-empty string found under a known JWT field name.
pub fn extract_token(login_body: &Value) -> Option<&str> {
    TOKEN_CANDIDATES
        .iter()
        .filter_map(|field| login_body.get(*field).and_then(Value::as_str))
        .find(|token| !token.is_empty())
}

/// Blocking HTTP client for the login → GetCapabilities flow.
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder().build().map_err(FetchError::Client)?;
        Ok(Self { client })
    }

    /// Logs in, downloads the capabilities document and saves it to
    /// `<input_dir>/<group>/<env>.json`.
    pub fn fetch_capabilities(
        &self,
        entry: &EnvEntry,
        input_dir: &Path,
    ) -> std::result::Result<PathBuf, FetchError> {
        let login_url = entry.var("LOGIN_URL");
        let caps_url = entry.var("GET_CAPABILITIES_URL");
        if login_url.is_empty() {
            return Err(FetchError::MissingKey("LOGIN_URL"));
        }
        if caps_url.is_empty() {
            return Err(FetchError::MissingKey("GET_CAPABILITIES_URL"));
        }

        info!(
            target: HARVEST_FETCH,
            group = %entry.group,
            env = %entry.env_name,
            "logging in"
        );
        let request = self
            .client
            .post(login_url)
            .timeout(LOGIN_TIMEOUT)
            .json(&entry.login_request());
        let login_body = send_json(request, FetchStage::Login)?;

        let token = extract_token(&login_body).ok_or_else(|| FetchError::NoToken {
            keys: login_body
                .as_object()
                .map(|o| o.keys().cloned().collect())
                .unwrap_or_default(),
        })?;

        debug!(target: HARVEST_FETCH, url = %caps_url, "requesting capabilities");
        let request = self
            .client
            .get(caps_url)
            .timeout(CAPABILITIES_TIMEOUT)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .header(ACCEPT, "application/json");
        let capabilities = send_json(request, FetchStage::GetCapabilities)?;

        save_capabilities(&capabilities, input_dir, entry)
    }
}

fn send_json(
    request: reqwest::blocking::RequestBuilder,
    stage: FetchStage,
) -> std::result::Result<Value, FetchError> {
    let response = request
        .send()
        .map_err(|source| FetchError::Connection { stage, source })?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Http {
            stage,
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("").to_string(),
        });
    }

    let body = response
        .text()
        .map_err(|source| FetchError::Connection { stage, source })?;
    serde_json::from_str(&body).map_err(|_| FetchError::InvalidJson { stage })
}

fn save_capabilities(
    capabilities: &Value,
    input_dir: &Path,
    entry: &EnvEntry,
) -> std::result::Result<PathBuf, FetchError> {
    let out_dir = input_dir.join(&entry.group);
    let out_path = out_dir.join(format!("{}.json", entry.env_name));
    let write_err = |source: std::io::Error| FetchError::Write {
        path: out_path.clone(),
        source,
    };

    fs::create_dir_all(&out_dir).map_err(write_err)?;
    let body = serde_json::to_vec(capabilities).map_err(|e| write_err(e.into()))?;
    fs::write(&out_path, body).map_err(write_err)?;

    debug!(target: HARVEST_FETCH, path = %out_path.display(), "saved capabilities");
    Ok(out_path)
}
