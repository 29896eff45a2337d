//! Media played from a URL

use url::Url;

/// An audio stream or file the speaker can fetch
///
/// The speaker reports nothing about URL playback, so the title and
/// description given here are what subscribers see. When left empty they
/// are derived from the URL's host and file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlMediaItem {
    pub url: String,
    title: Option<String>,
    description: Option<String>,
    /// Seconds
    pub duration: Option<u64>,
    pub thumbnail: Option<String>,
}

impl UrlMediaItem {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
            description: None,
            duration: None,
            thumbnail: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into()).filter(|t: &String| !t.is_empty());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into()).filter(|d: &String| !d.is_empty());
        self
    }

    pub fn with_duration(mut self, seconds: u64) -> Self {
        self.duration = Some(seconds);
        self
    }

    pub fn with_thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail = Some(url.into());
        self
    }

    /// Given title, else the last three labels of the host without `www.`
    pub fn title(&self) -> String {
        if let Some(title) = &self.title {
            return title.clone();
        }
        Url::parse(&self.url)
            .ok()
            .and_then(|url| url.host_str().map(domain))
            .unwrap_or_else(|| "URL stream".to_string())
    }

    /// Given description, else the file name of the URL path
    pub fn description(&self) -> String {
        if let Some(description) = &self.description {
            return description.clone();
        }
        Url::parse(&self.url)
            .ok()
            .and_then(|url| {
                url.path_segments()
                    .and_then(|mut segments| segments.next_back().map(String::from))
            })
            .filter(|file| !file.is_empty())
            .unwrap_or_else(|| "URL stream".to_string())
    }
}

fn domain(host: &str) -> String {
    let labels: Vec<&str> = host.split('.').collect();
    let start = labels.len().saturating_sub(3);
    labels[start..].join(".").replace("www.", "")
}
