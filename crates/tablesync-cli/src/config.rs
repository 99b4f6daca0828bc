// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tablesync_app::{FieldSpec, RenderOptions, StringTable};
use tablesync_client::{ClientOptions, CsrfToken};

const CONFIG_VERSION: i64 = 1;
const APP_NAME: &str = "tablesync";
const DEFAULT_TIMEOUT: &str = "5s";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub resource: ResourceSection,
    #[serde(default)]
    pub table: TableSection,
    #[serde(default)]
    pub strings: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            resource: ResourceSection::default(),
            table: TableSection::default(),
            strings: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceSection {
    pub url: Option<String>,
    pub timeout: Option<String>,
    pub csrf_header: Option<String>,
    pub csrf_token: Option<String>,
}

impl Default for ResourceSection {
    fn default() -> Self {
        Self {
            url: None,
            timeout: Some(DEFAULT_TIMEOUT.to_owned()),
            csrf_header: None,
            csrf_token: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableSection {
    #[serde(default)]
    pub columns: Vec<FieldSpec>,
    #[serde(default)]
    pub form_fields: Vec<FieldSpec>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("TABLESYNC_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set TABLESYNC_CONFIG_PATH to the config file")
        })?;

        let app_dir = config_root.join(APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and put values under [resource], [table], and [strings]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(timeout) = &self.resource.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed <= Duration::ZERO {
                bail!(
                    "resource.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        match (&self.resource.csrf_header, &self.resource.csrf_token) {
            (Some(_), None) | (None, Some(_)) => bail!(
                "resource.csrf_header and resource.csrf_token in {} must be set together",
                path.display()
            ),
            _ => {}
        }

        for spec in self.table.columns.iter().chain(&self.table.form_fields) {
            if spec.name.trim().is_empty() {
                bail!(
                    "[table] entries in {} need a non-empty name",
                    path.display()
                );
            }
        }

        Ok(())
    }

    /// `--url` wins over `resource.url`.
    pub fn resource_url(&self, cli_override: Option<&str>) -> Result<String> {
        cli_override
            .or(self.resource.url.as_deref())
            .map(|url| url.trim_end_matches('/').to_owned())
            .ok_or_else(|| anyhow!("no resource url; pass --url or set [resource].url"))
    }

    pub fn timeout(&self) -> Result<Duration> {
        parse_duration(self.resource.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    pub fn client_options(&self) -> Result<ClientOptions> {
        let csrf = match (&self.resource.csrf_header, &self.resource.csrf_token) {
            (Some(header), Some(token)) => Some(CsrfToken {
                header: header.clone(),
                token: token.clone(),
            }),
            _ => None,
        };
        Ok(ClientOptions {
            timeout: self.timeout()?,
            csrf,
        })
    }

    /// Form fields default to the table columns when none are listed. With
    /// no columns at all, the first fetched row supplies them.
    pub fn render_options(&self) -> RenderOptions {
        let form_fields = if self.table.form_fields.is_empty() {
            self.table.columns.clone()
        } else {
            self.table.form_fields.clone()
        };
        RenderOptions {
            columns: self.table.columns.clone(),
            form_fields,
            strings: StringTable::english().with_overrides(&self.strings),
        }
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# tablesync config\n# Place this file at: {}\n\nversion = 1\n\n[resource]\nurl = \"http://localhost:8080/rest/admin/meals\"\ntimeout = \"{}\"\n# Anti-forgery header sent with every request. Set both or neither.\n# csrf_header = \"X-CSRF-TOKEN\"\n# csrf_token = \"...\"\n\n[table]\ncolumns = [\n  {{ name = \"dateTime\", label = \"Date/Time\" }},\n  {{ name = \"description\", label = \"Description\" }},\n  {{ name = \"calories\", label = \"Calories\" }},\n]\n# Defaults to columns. `id` is never an input; edits send it automatically.\n# Leave both lists out to take the columns from the first fetched row.\nform_fields = [\n  {{ name = \"dateTime\", label = \"Date/Time\" }},\n  {{ name = \"description\", label = \"Description\" }},\n  {{ name = \"calories\", label = \"Calories\" }},\n]\n\n[strings]\n# \"addTitle\" = \"Add meal\"\n# \"editTitle\" = \"Edit meal\"\n# \"common.confirm\" = \"Are you sure?\"\n# \"common.saved\" = \"Record saved\"\n# \"common.deleted\" = \"Record deleted\"\n",
            path.display(),
            DEFAULT_TIMEOUT,
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(mins * 60));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 5s)")
}
