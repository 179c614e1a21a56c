//! Audio resolution.
//!
//! A door's audio file is found by probing a small combinatorial set of
//! candidate URLs: `{prefix+day, prefix+zero-padded-day}`, each also
//! lowercased, crossed with the configured extensions in order. The first
//! candidate confirmed reachable wins.
//!
//! The probe itself sits behind [`MediaProbe`] so the calendar stays
//! testable without a network; the production [`HttpProbe`] issues a cheap
//! HEAD request and falls back to GET for servers that reject HEAD. Every
//! request carries a timeout -- a hanging probe must not stall the reveal
//! forever.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::time::Duration;

use crate::config::CalendarConfig;
use crate::error::MediaError;

/// Candidate file names for a day, order-preserving and deduplicated.
///
/// `Kapitel3` yields `[Kapitel3, Kapitel03, kapitel3, kapitel03]`;
/// two-digit days skip the padded variant since it is identical.
pub fn candidate_names(prefix: &str, day: u32) -> Vec<String> {
    let mut names = vec![format!("{prefix}{day}")];
    let padded = format!("{day:02}");
    if padded != day.to_string() {
        names.push(format!("{prefix}{padded}"));
    }
    let lowered: Vec<String> = names.iter().map(|n| n.to_lowercase()).collect();
    names.extend(lowered);

    let mut seen = BTreeSet::new();
    names.retain(|name| seen.insert(name.clone()));
    names
}

/// Full candidate URLs for a day: every name crossed with every configured
/// extension, name-major, under the configured audio path prefix.
pub fn candidate_urls(config: &CalendarConfig, day: u32) -> Vec<String> {
    let mut urls = Vec::new();
    for name in candidate_names(&config.file_name_prefix, day) {
        for ext in &config.file_extensions {
            urls.push(format!("{}{}.{}", config.audio_path_prefix, name, ext));
        }
    }
    urls
}

/// Existence check for a candidate URL.
#[async_trait]
pub trait MediaProbe: Send + Sync {
    /// Whether the URL is confirmed reachable.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or timeout; the caller treats
    /// an errored candidate as "not found" and moves on.
    async fn exists(&self, url: &str) -> Result<bool, MediaError>;
}

/// HEAD-first HTTP probe with a GET fallback.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(10))
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }
}

impl Default for HttpProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaProbe for HttpProbe {
    async fn exists(&self, url: &str) -> Result<bool, MediaError> {
        match self.client.head(url).timeout(self.timeout).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(err) if err.is_timeout() => Err(MediaError::Timeout {
                url: url.to_string(),
            }),
            Err(_) => {
                // Some static hosts reject HEAD outright; retry with GET.
                match self.client.get(url).timeout(self.timeout).send().await {
                    Ok(response) => Ok(response.status().is_success()),
                    Err(err) if err.is_timeout() => Err(MediaError::Timeout {
                        url: url.to_string(),
                    }),
                    Err(err) => Err(MediaError::Transport {
                        url: url.to_string(),
                        message: err.to_string(),
                    }),
                }
            }
        }
    }
}

/// Resolve the playable URL for a day, or `None` when no candidate matches.
///
/// Probe errors are logged and treated as misses; a flaky candidate never
/// aborts the search.
pub async fn resolve_audio(
    probe: &dyn MediaProbe,
    config: &CalendarConfig,
    day: u32,
) -> Option<String> {
    for url in candidate_urls(config, day) {
        match probe.exists(&url).await {
            Ok(true) => return Some(url),
            Ok(false) => {}
            Err(err) => {
                tracing::debug!(%url, %err, "audio probe failed, trying next candidate");
            }
        }
    }
    None
}

/// Guidance message shown when no audio file resolves, naming the expected
/// path and filename pattern.
pub fn missing_audio_hint(config: &CalendarConfig, day: u32) -> String {
    let extension = config
        .file_extensions
        .first()
        .map(String::as_str)
        .unwrap_or("mp3");
    format!(
        "No audio file found. Place a file in {} named e.g. {}{}.{}",
        config.audio_path_prefix, config.file_name_prefix, day, extension
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_names_include_padded_and_lowercase_variants() {
        assert_eq!(
            candidate_names("Kapitel", 3),
            vec!["Kapitel3", "Kapitel03", "kapitel3", "kapitel03"]
        );
    }

    #[test]
    fn two_digit_days_skip_redundant_padding() {
        assert_eq!(candidate_names("Kapitel", 12), vec!["Kapitel12", "kapitel12"]);
    }

    #[test]
    fn lowercase_prefix_produces_no_duplicates() {
        assert_eq!(candidate_names("tag", 12), vec!["tag12"]);
    }

    #[test]
    fn candidate_urls_are_name_major_in_extension_order() {
        let config = CalendarConfig {
            audio_path_prefix: "/audio/".into(),
            file_name_prefix: "Kapitel".into(),
            file_extensions: vec!["m4a".into(), "mp3".into()],
            ..CalendarConfig::default()
        };
        assert_eq!(
            candidate_urls(&config, 12),
            vec![
                "/audio/Kapitel12.m4a",
                "/audio/Kapitel12.mp3",
                "/audio/kapitel12.m4a",
                "/audio/kapitel12.mp3",
            ]
        );
    }

    #[test]
    fn missing_audio_hint_names_path_and_pattern() {
        let hint = missing_audio_hint(&CalendarConfig::default(), 4);
        assert!(hint.contains("/audio/"));
        assert!(hint.contains("Kapitel4.m4a"));
    }

    fn server_config(server: &mockito::Server) -> CalendarConfig {
        CalendarConfig {
            audio_path_prefix: format!("{}/audio/", server.url()),
            file_name_prefix: "Kapitel".into(),
            file_extensions: vec!["m4a".into(), "mp3".into()],
            ..CalendarConfig::default()
        }
    }

    #[tokio::test]
    async fn resolve_prefers_first_reachable_candidate() {
        let mut server = mockito::Server::new_async().await;
        let miss = server
            .mock("HEAD", "/audio/Kapitel3.m4a")
            .with_status(404)
            .create_async()
            .await;
        let hit = server
            .mock("HEAD", "/audio/Kapitel3.mp3")
            .with_status(200)
            .create_async()
            .await;

        let config = server_config(&server);
        let probe = HttpProbe::new();
        let url = resolve_audio(&probe, &config, 3).await;
        assert_eq!(url, Some(format!("{}/audio/Kapitel3.mp3", server.url())));
        miss.assert_async().await;
        hit.assert_async().await;
    }

    #[tokio::test]
    async fn resolve_returns_none_when_nothing_matches() {
        let mut server = mockito::Server::new_async().await;
        // Every candidate misses; four names x two extensions.
        let misses = server
            .mock("HEAD", mockito::Matcher::Regex("^/audio/.*".into()))
            .with_status(404)
            .expect_at_least(1)
            .create_async()
            .await;

        let config = server_config(&server);
        let probe = HttpProbe::new();
        assert_eq!(resolve_audio(&probe, &config, 3).await, None);
        misses.assert_async().await;
    }
}
