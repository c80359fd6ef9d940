/*
 * config.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Larkspur, an asynchronous networking framework.
 *
 * Larkspur is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Larkspur is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Larkspur.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Network configuration: trust-anchor directory, keep-alive, timeouts and parser limits.
//! Read from ~/.larkspur/net.xml (root \<net\>); all XML reading uses the quick_xml parser.
//! A missing file means defaults; unknown elements are ignored.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::protocol::http::h1::ParserOptions;
use crate::tls::TrustAnchors;

/// Trust-anchor directory used when none is configured.
pub const DEFAULT_SSL_CERT_DIRECTORY: &str = "/etc/ssl/certs";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("XML parse error: {0}")]
    Xml(String),

    #[error("invalid value for <{element}>: {value:?}")]
    InvalidValue { element: String, value: String },
}

/// Settings for outbound HTTP(S) connections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetConfig {
    /// Directory of PEM trust anchors for client verification. `None` selects the platform store.
    pub ssl_cert_directory: Option<PathBuf>,
    /// Keep parsing pipelined responses after the first one.
    pub keep_alive: bool,
    /// How long an idle kept-alive connection waits for the server before closing. `None` waits
    /// indefinitely.
    pub keep_alive_timeout: Option<Duration>,
    pub connect_timeout: Duration,
    pub max_line_length: usize,
    pub max_header_count: usize,
}

impl Default for NetConfig {
    fn default() -> Self {
        let parser = ParserOptions::default();
        Self {
            ssl_cert_directory: Some(PathBuf::from(DEFAULT_SSL_CERT_DIRECTORY)),
            keep_alive: parser.persistent,
            keep_alive_timeout: Some(Duration::from_secs(60)),
            connect_timeout: Duration::from_secs(15),
            max_line_length: parser.max_line_length,
            max_header_count: parser.max_header_count,
        }
    }
}

impl NetConfig {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(content) => Self::from_xml(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Parse `<net><ssl-cert-directory>…</ssl-cert-directory><keep-alive>…</keep-alive>…</net>`.
    /// An empty `<ssl-cert-directory/>` selects the platform trust store.
    pub fn from_xml(content: &str) -> Result<Self, ConfigError> {
        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text(true);
        let mut buf = Vec::new();
        let mut config = Self::default();
        let mut element_name = Vec::<u8>::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Err(e) => return Err(ConfigError::Xml(e.to_string())),
                Ok(Event::Eof) => break,
                Ok(Event::Start(e)) => {
                    element_name.clear();
                    element_name.extend_from_slice(e.name().as_ref());
                }
                Ok(Event::Empty(e)) => {
                    if e.name().as_ref() == b"ssl-cert-directory" {
                        config.ssl_cert_directory = None;
                    }
                }
                Ok(Event::Text(e)) => {
                    if element_name.is_empty() {
                        continue;
                    }
                    let text = e
                        .unescape()
                        .map_err(|e| ConfigError::Xml(e.to_string()))?
                        .trim()
                        .to_string();
                    config.apply(&element_name, text)?;
                    element_name.clear();
                }
                Ok(Event::End(e)) => {
                    // <ssl-cert-directory></ssl-cert-directory> carries no text event
                    if element_name.as_slice() == b"ssl-cert-directory"
                        && e.name().as_ref() == b"ssl-cert-directory"
                    {
                        config.ssl_cert_directory = None;
                    }
                    element_name.clear();
                }
                _ => {}
            }
            buf.clear();
        }
        Ok(config)
    }

    fn apply(&mut self, element: &[u8], text: String) -> Result<(), ConfigError> {
        let invalid = |text: &str| ConfigError::InvalidValue {
            element: String::from_utf8_lossy(element).into_owned(),
            value: text.to_string(),
        };
        match element {
            b"ssl-cert-directory" => {
                self.ssl_cert_directory = if text.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(text))
                };
            }
            b"keep-alive" => {
                self.keep_alive = match text.as_str() {
                    "true" | "1" | "yes" => true,
                    "false" | "0" | "no" => false,
                    _ => return Err(invalid(&text)),
                };
            }
            b"keep-alive-timeout" => {
                // Seconds; 0 disables the timeout
                let secs: u64 = text.parse().map_err(|_| invalid(&text))?;
                self.keep_alive_timeout = (secs > 0).then(|| Duration::from_secs(secs));
            }
            b"connect-timeout" => {
                let secs: u64 = text.parse().map_err(|_| invalid(&text))?;
                self.connect_timeout = Duration::from_secs(secs);
            }
            b"max-line-length" => {
                self.max_line_length = text.parse().map_err(|_| invalid(&text))?;
            }
            b"max-header-count" => {
                self.max_header_count = text.parse().map_err(|_| invalid(&text))?;
            }
            _ => {}
        }
        Ok(())
    }

    pub fn parser_options(&self) -> ParserOptions {
        ParserOptions {
            persistent: self.keep_alive,
            max_line_length: self.max_line_length,
            max_header_count: self.max_header_count,
        }
    }

    /// Trust anchors for client verification.
    pub fn trust_anchors(&self) -> TrustAnchors {
        match &self.ssl_cert_directory {
            Some(dir) => TrustAnchors::Directory(dir.clone()),
            None => TrustAnchors::Platform,
        }
    }
}

/// Default config directory: ~/.larkspur.
pub fn default_config_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from).map(|h| h.join(".larkspur"))
}

/// Default network config path: ~/.larkspur/net.xml.
pub fn default_config_path() -> Option<PathBuf> {
    default_config_dir().map(|d| d.join("net.xml"))
}
