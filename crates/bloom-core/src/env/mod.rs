//! # Bloom Environment
//!
//! Process environment and `.env` file handling.
//!
//! [`EnvStore`] merges values read from `<base>/.env` with the real process
//! environment. By default `.env` values win and the process environment is a
//! fallback; with `USE_GLOBAL_ENV` on the precedence flips. Values may carry
//! `${dotted.key}` placeholders which are expanded from the store's merge
//! variables (seeded by the application with its base and public paths).
//!
//! Files are parsed by `dotenvy`, which already expands `$NAME`/`${NAME}` from
//! earlier keys and the process environment while reading. Placeholders meant
//! for the merge variables therefore go in single quotes
//! (`LOG_DIR='${app.base_dir}/var/log'`), which `dotenvy` keeps verbatim.
//!
//! The kernel uses one process-wide store ([`global`]); tests and embedders can
//! construct isolated stores with [`EnvStore::with_process_vars`].
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use serde_json::Value;

use crate::config::data::merge_values;
use crate::kernel::constants;
use crate::kernel::error::{Error, Result};

/// Key/value environment store with `.env` loading and placeholder expansion.
pub struct EnvStore {
    file_vars: RwLock<HashMap<String, String>>,
    /// `None` reads the real process environment.
    process_vars: Option<HashMap<String, String>>,
    global: AtomicBool,
    merge_vars: RwLock<Value>,
}

impl EnvStore {
    /// Create a store backed by the real process environment.
    pub fn new() -> Self {
        Self {
            file_vars: RwLock::new(HashMap::new()),
            process_vars: None,
            global: AtomicBool::new(false),
            merge_vars: RwLock::new(Value::Object(Default::default())),
        }
    }

    /// Create a store whose "process environment" is the given fixed map.
    pub fn with_process_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            process_vars: Some(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect()),
            ..Self::new()
        }
    }

    /// Load `<base_path>/.env` into the store. A missing file loads nothing.
    ///
    /// Returns the number of variables read.
    pub fn load(&self, base_path: &Path) -> Result<usize> {
        let path = base_path.join(constants::ENV_FILE);
        if !path.is_file() {
            log::debug!("No environment file at {}", path.display());
            return Ok(0);
        }
        let origin = path.display().to_string();
        let entries = dotenvy::from_path_iter(&path).map_err(|source| Error::EnvFile {
            origin: origin.clone(),
            source,
        })?;
        let count = self.extend(entries, &origin)?;
        log::debug!("Loaded {} environment variables from {}", count, origin);
        Ok(count)
    }

    /// Parse `.env` formatted text and merge it into the store. Later keys override earlier ones.
    pub fn load_str(&self, contents: &str) -> Result<usize> {
        self.extend(dotenvy::from_read_iter(contents.as_bytes()), "<inline>")
    }

    // Nothing is stored unless every line parses
    fn extend<I>(&self, entries: I, origin: &str) -> Result<usize>
    where
        I: Iterator<Item = dotenvy::Result<(String, String)>>,
    {
        let parsed = entries
            .collect::<dotenvy::Result<Vec<_>>>()
            .map_err(|source| Error::EnvFile {
                origin: origin.to_string(),
                source,
            })?;
        let count = parsed.len();
        self.file_vars
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(parsed);
        Ok(count)
    }

    /// Set a single variable as if it came from the `.env` file.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.file_vars
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into());
    }

    /// Give the process environment precedence over `.env` values.
    pub fn enable_global(&self, enabled: bool) {
        self.global.store(enabled, Ordering::SeqCst);
    }

    pub fn is_global(&self) -> bool {
        self.global.load(Ordering::SeqCst)
    }

    /// Read a variable from the process environment only.
    pub fn process_var(&self, key: &str) -> Option<String> {
        match &self.process_vars {
            Some(vars) => vars.get(key).cloned(),
            None => std::env::var(key).ok(),
        }
    }

    /// Get a variable without placeholder expansion.
    pub fn raw(&self, key: &str) -> Option<String> {
        let file_value = self
            .file_vars
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned();
        if self.is_global() {
            self.process_var(key).or(file_value)
        } else {
            file_value.or_else(|| self.process_var(key))
        }
    }

    /// Get a variable with `${...}` placeholders expanded from merge variables.
    pub fn get(&self, key: &str) -> Option<String> {
        self.raw(key).map(|value| self.interpolate(&value))
    }

    /// Get a variable or `default` when unset.
    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    /// Get a variable as a boolean. Unset or unrecognised values yield `None`.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|value| parse_bool(&value))
    }

    /// Deep-merge `vars` into the merge variables used for placeholder expansion.
    pub fn set_merge_vars(&self, vars: Value) {
        let mut current = self.merge_vars.write().unwrap_or_else(PoisonError::into_inner);
        merge_values(&mut current, vars);
    }

    /// Snapshot of the merge variables.
    pub fn merge_vars(&self) -> Value {
        self.merge_vars.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn interpolate(&self, value: &str) -> String {
        if !value.contains("${") {
            return value.to_string();
        }
        let vars = self.merge_vars.read().unwrap_or_else(PoisonError::into_inner);
        let mut output = String::with_capacity(value.len());
        let mut rest = value;
        while let Some(start) = rest.find("${") {
            output.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find('}') else {
                // Unterminated placeholder, keep the remainder verbatim
                output.push_str(&rest[start..]);
                return output;
            };
            let key = after[..end].trim();
            match lookup_scalar(&vars, key) {
                Some(replacement) => output.push_str(&replacement),
                None => output.push_str(&rest[start..start + 2 + end + 1]),
            }
            rest = &after[end + 1..];
        }
        output.push_str(rest);
        output
    }
}

impl Default for EnvStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EnvStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.file_vars.read().map(|vars| vars.len()).unwrap_or(0);
        f.debug_struct("EnvStore")
            .field("file_vars_count", &count)
            .field("isolated", &self.process_vars.is_some())
            .field("global", &self.is_global())
            .finish()
    }
}

fn lookup_scalar(vars: &Value, dotted: &str) -> Option<String> {
    let mut current = vars;
    for segment in dotted.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    match current {
        Value::String(s) => Some(s.clone()),
        Value::Bool(_) | Value::Number(_) => Some(current.to_string()),
        _ => None,
    }
}

/// Parse a boolean the way `.env` files spell them.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "(true)" | "1" | "yes" | "on" => Some(true),
        "false" | "(false)" | "0" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

static GLOBAL_ENV: OnceLock<Arc<EnvStore>> = OnceLock::new();

/// The process-wide environment store.
pub fn global() -> Arc<EnvStore> {
    GLOBAL_ENV.get_or_init(|| Arc::new(EnvStore::new())).clone()
}
