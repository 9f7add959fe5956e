use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use lazyload_core::{Asset, FetchError};
use reqwest::{Client, StatusCode, Url};

// ─── AssetFetcher ─────────────────────────────────────────────────────────

/// The capability that actually retrieves a script or stylesheet.
///
/// Implementations resolve once per call: `Ok(())` when the asset arrived,
/// `Err` when it did not. The loader never retries.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch(&self, asset: &Asset) -> Result<(), FetchError>;
}

#[async_trait]
impl<F: AssetFetcher + ?Sized> AssetFetcher for Arc<F> {
    async fn fetch(&self, asset: &Asset) -> Result<(), FetchError> {
        (**self).fetch(asset).await
    }
}

// ─── HttpFetcher ──────────────────────────────────────────────────────────

/// Fetches assets over HTTP, resolving relative asset URLs against the URL
/// of the page that hosts the application.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    base: Url,
}

impl HttpFetcher {
    /// `base` is the page URL, e.g. `https://example.com/app/index.html`.
    pub fn new(base: &str) -> Result<Self, FetchError> {
        let base = Url::parse(base).map_err(|e| FetchError::InvalidUrl {
            url: base.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            client: Client::new(),
            base,
        })
    }

    pub fn resolve(&self, url: &str) -> Result<Url, FetchError> {
        self.base.join(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl AssetFetcher for HttpFetcher {
    async fn fetch(&self, asset: &Asset) -> Result<(), FetchError> {
        let url = self.resolve(&asset.url)?;
        tracing::debug!(url = %url, "GET asset");

        let transport = |e: reqwest::Error| FetchError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        };
        let resp = self.client.get(url.clone()).send().await.map_err(transport)?;

        match resp.status() {
            s if s.is_success() => {
                resp.bytes().await.map_err(transport)?;
                Ok(())
            }
            StatusCode::NOT_FOUND => Err(FetchError::NotFound {
                url: url.to_string(),
            }),
            s => Err(FetchError::Status {
                url: url.to_string(),
                status: s.as_u16(),
            }),
        }
    }
}

// ─── FsFetcher ────────────────────────────────────────────────────────────

/// Reads assets from disk, treating `page_dir` as the directory of the
/// application's index page. `../A/A.js` resolves to `<page_dir>/../A/A.js`.
#[derive(Debug, Clone)]
pub struct FsFetcher {
    page_dir: PathBuf,
}

impl FsFetcher {
    pub fn new(page_dir: impl Into<PathBuf>) -> Self {
        Self {
            page_dir: page_dir.into(),
        }
    }

    pub fn resolve(&self, url: &str) -> Result<PathBuf, FetchError> {
        if url.starts_with('/') || url.contains("://") {
            return Err(FetchError::InvalidUrl {
                url: url.to_string(),
                message: "only page-relative urls can be read from disk".into(),
            });
        }
        let mut path = normalize(&self.page_dir);
        for segment in url.split('/') {
            match segment {
                "" | "." => {}
                ".." => parent(&mut path),
                s => path.push(s),
            }
        }
        Ok(path)
    }
}

/// Step up one level. A relative path that runs out of named components
/// keeps the `..` instead of dropping it.
fn parent(path: &mut PathBuf) {
    match path.components().next_back() {
        Some(Component::Normal(_)) => {
            path.pop();
        }
        Some(Component::RootDir | Component::Prefix(_)) => {}
        _ => path.push(".."),
    }
}

/// Lexically collapse `.` and `..` so `parent` walks real parents.
fn normalize(dir: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for c in dir.components() {
        match c {
            Component::CurDir => {}
            Component::ParentDir => parent(&mut out),
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[async_trait]
impl AssetFetcher for FsFetcher {
    async fn fetch(&self, asset: &Asset) -> Result<(), FetchError> {
        let path = self.resolve(&asset.url)?;
        tracing::debug!(path = %path.display(), "read asset");
        match tokio::fs::read(&path).await {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(FetchError::NotFound {
                url: asset.url.clone(),
            }),
            Err(source) => Err(FetchError::Io {
                url: asset.url.clone(),
                source,
            }),
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn site() -> (TempDir, FsFetcher) {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("app")).unwrap();
        std::fs::create_dir_all(dir.path().join("A/resources")).unwrap();
        std::fs::write(dir.path().join("A/A.js"), "// A").unwrap();
        std::fs::write(dir.path().join("A/resources/A-all.css"), "body{}").unwrap();
        let fetcher = FsFetcher::new(dir.path().join("app"));
        (dir, fetcher)
    }

    #[test]
    fn fs_resolve_walks_parent_segments() {
        let fetcher = FsFetcher::new("/srv/site/app");
        assert_eq!(
            fetcher.resolve("../A/A.js").unwrap(),
            PathBuf::from("/srv/site/A/A.js")
        );
        assert_eq!(
            fetcher.resolve("../build/production/App/../A/resources/A-all.css").unwrap(),
            PathBuf::from("/srv/site/build/production/A/resources/A-all.css")
        );
    }

    #[test]
    fn fs_resolve_keeps_parents_above_relative_root() {
        let fetcher = FsFetcher::new("site");
        assert_eq!(
            fetcher.resolve("../../A/A.js").unwrap(),
            PathBuf::from("../A/A.js")
        );
        let fetcher = FsFetcher::new("../site");
        assert_eq!(
            fetcher.resolve("../../A/A.js").unwrap(),
            PathBuf::from("../../A/A.js")
        );
        let fetcher = FsFetcher::new("/srv");
        assert_eq!(fetcher.resolve("../../A/A.js").unwrap(), PathBuf::from("/A/A.js"));
    }

    #[test]
    fn fs_resolve_rejects_absolute_urls() {
        let fetcher = FsFetcher::new("/srv/site/app");
        assert!(matches!(
            fetcher.resolve("/A/A.js"),
            Err(FetchError::InvalidUrl { .. })
        ));
        assert!(fetcher.resolve("http://cdn/A.js").is_err());
    }

    #[tokio::test]
    async fn fs_fetch_existing_assets() {
        let (_dir, fetcher) = site();
        fetcher.fetch(&Asset::script("../A/A.js")).await.unwrap();
        fetcher
            .fetch(&Asset::stylesheet("../A/resources/A-all.css"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn fs_fetch_missing_asset_is_not_found() {
        let (_dir, fetcher) = site();
        let err = fetcher.fetch(&Asset::script("../B/B.js")).await.unwrap_err();
        assert!(matches!(err, FetchError::NotFound { ref url } if url == "../B/B.js"));
    }

    #[tokio::test]
    async fn shared_fetcher_through_arc() {
        let (_dir, fetcher) = site();
        let shared = Arc::new(fetcher);
        let dynamic: Arc<dyn AssetFetcher> = Arc::new(Arc::clone(&shared));
        dynamic.fetch(&Asset::script("../A/A.js")).await.unwrap();
    }

    #[test]
    fn http_resolve_against_page_url() {
        let fetcher = HttpFetcher::new("https://example.com/app/index.html").unwrap();
        assert_eq!(
            fetcher.resolve("../A/A.js").unwrap().as_str(),
            "https://example.com/A/A.js"
        );
    }

    #[test]
    fn http_rejects_bad_base() {
        assert!(matches!(
            HttpFetcher::new("not a url"),
            Err(FetchError::InvalidUrl { .. })
        ));
    }

    #[tokio::test]
    async fn http_fetch_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/A/A.js")
            .with_status(200)
            .with_body("Ext.define('A.Main', {});")
            .create_async()
            .await;

        let fetcher = HttpFetcher::new(&format!("{}/app/index.html", server.url())).unwrap();
        fetcher.fetch(&Asset::script("../A/A.js")).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn http_fetch_404_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/A/resources/A-all.css")
            .with_status(404)
            .create_async()
            .await;

        let fetcher = HttpFetcher::new(&format!("{}/app/", server.url())).unwrap();
        let err = fetcher
            .fetch(&Asset::stylesheet("../A/resources/A-all.css"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::NotFound { .. }));
    }

    #[tokio::test]
    async fn http_fetch_server_error_keeps_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/B/B.js")
            .with_status(503)
            .create_async()
            .await;

        let fetcher = HttpFetcher::new(&format!("{}/app/", server.url())).unwrap();
        let err = fetcher.fetch(&Asset::script("../B/B.js")).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 503, .. }));
    }
}
