use async_trait::async_trait;
use reqwest::{Client, Response};
use seedwave_core::{
    resolve_asset, CatalogueApi, CoreError, Language, PageQuery, SeedwaveConfig, SongDetail,
    SongSummary,
};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

const LOG_TARGET: &str = "seedwave::catalogue::http";

const PAGE_ENDPOINT: &str = "/api/music/data";
const GENERATE_ENDPOINT: &str = "/api/song/generate";

/// Default whole-request timeout
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const CONNECT_TIMEOUT_SECS: u64 = 5;

const USER_AGENT: &str = concat!("Seedwave/", env!("CARGO_PKG_VERSION"));

/// Catalogue service client over HTTP.
///
/// Every call is a single request. Failures are returned to the caller and
/// never retried here.
#[derive(Debug, Clone)]
pub struct HttpCatalogue {
    client: Client,
    base_url: Url,
}

impl HttpCatalogue {
    /// Create a client for `base_url` with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(base_url: Url) -> Result<Self, CoreError> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a client using the service section of the config.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the client cannot be created.
    pub fn from_config(config: &SeedwaveConfig) -> Result<Self, CoreError> {
        Self::with_timeout(config.base_url()?, config.timeout())
    }

    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_timeout(base_url: Url, timeout: Duration) -> Result<Self, CoreError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;
        info!(target: LOG_TARGET, "Catalogue service at {}", base_url);
        Ok(Self { client, base_url })
    }
}

/// `GET /api/music/data?seed&skip&take&language&likeFilter`
///
/// # Errors
///
/// Returns an error if the base URL cannot be extended.
pub fn page_url(base: &Url, query: &PageQuery) -> Result<Url, CoreError> {
    let mut url = resolve_asset(base, PAGE_ENDPOINT)?;
    url.query_pairs_mut()
        .append_pair("seed", &query.seed)
        .append_pair("skip", &query.skip.to_string())
        .append_pair("take", &query.take.to_string())
        .append_pair("language", query.language.as_str())
        .append_pair("likeFilter", &query.like_filter.query_value().to_string());
    Ok(url)
}

/// `POST /api/song/generate?seed&language`
///
/// # Errors
///
/// Returns an error if the base URL cannot be extended.
pub fn generate_url(base: &Url, seed: &str, language: Language) -> Result<Url, CoreError> {
    let mut url = resolve_asset(base, GENERATE_ENDPOINT)?;
    url.query_pairs_mut()
        .append_pair("seed", seed)
        .append_pair("language", language.as_str());
    Ok(url)
}

fn ensure_success(response: Response, endpoint: &str) -> Result<Response, CoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    warn!(target: LOG_TARGET, "{} returned status: {}", endpoint, status);
    Err(CoreError::CatalogueStatus {
        endpoint: endpoint.to_string(),
        status: status.as_u16(),
    })
}

#[async_trait]
impl CatalogueApi for HttpCatalogue {
    fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn fetch_page(&self, query: &PageQuery) -> Result<Vec<SongSummary>, CoreError> {
        let url = page_url(&self.base_url, query)?;
        debug!(target: LOG_TARGET, "GET {}", url);

        let response = self.client.get(url).send().await?;
        let response = ensure_success(response, PAGE_ENDPOINT)?;
        let songs: Vec<SongSummary> = response.json().await?;

        debug!(
            target: LOG_TARGET,
            "Page skip={} take={} returned {} songs",
            query.skip,
            query.take,
            songs.len()
        );
        Ok(songs)
    }

    async fn generate_song(&self, seed: &str, language: Language) -> Result<SongDetail, CoreError> {
        let url = generate_url(&self.base_url, seed, language)?;
        info!(target: LOG_TARGET, "Generating song {} ({})", seed, language);

        let response = self.client.post(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(target: LOG_TARGET, "Generation of {} returned status: {}", seed, status);
            return Err(CoreError::GenerationFailed {
                seed: seed.to_string(),
                reason: format!("service returned status {status}"),
            });
        }

        let detail: SongDetail = response.json().await?;
        info!(
            target: LOG_TARGET,
            "Generated {} with {} lyric lines",
            detail.seed,
            detail.lyrics.len()
        );
        Ok(detail)
    }

    async fn fetch_asset(&self, url: &Url) -> Result<Vec<u8>, CoreError> {
        debug!(target: LOG_TARGET, "GET {}", url);
        let response = self.client.get(url.clone()).send().await?;
        let response = ensure_success(response, url.path())?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seedwave_core::LikeFilter;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve one canned HTTP response and hand back the request head.
    async fn serve_once(status: &'static str, body: String) -> (Url, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });
        (Url::parse(&format!("http://{addr}")).unwrap(), handle)
    }

    #[test]
    fn test_page_url() {
        let base = Url::parse("http://localhost:5000").unwrap();
        let query = PageQuery::for_page("42", Language::En, LikeFilter::Any, 2, 15);
        assert_eq!(
            page_url(&base, &query).unwrap().as_str(),
            "http://localhost:5000/api/music/data?seed=42&skip=15&take=15&language=en&likeFilter=-1"
        );

        let query = PageQuery::for_page("7", Language::Ru, LikeFilter::AtLeast(2.5), 1, 10);
        assert_eq!(
            page_url(&base, &query).unwrap().query(),
            Some("seed=7&skip=0&take=10&language=ru&likeFilter=2.5")
        );
    }

    #[test]
    fn test_urls_keep_base_path() {
        let base = Url::parse("https://example.test/music/").unwrap();
        assert_eq!(
            generate_url(&base, "99", Language::Ru).unwrap().as_str(),
            "https://example.test/music/api/song/generate?seed=99&language=ru"
        );
    }

    #[tokio::test]
    async fn test_fetch_page() {
        let body = serde_json::json!([{
            "seed": "42-0",
            "artistName": "Nova",
            "musicName": "Glass Rain",
            "albumTitle": "Single",
            "genre": "Ambient",
            "likes": 3.4
        }])
        .to_string();
        let (base, server) = serve_once("200 OK", body).await;
        let api = HttpCatalogue::new(base).unwrap();

        let query = PageQuery::for_page("42", Language::En, LikeFilter::Any, 1, 15);
        let songs = api.fetch_page(&query).await.unwrap();

        assert_eq!(songs.len(), 1);
        assert_eq!(songs[0].artist_name, "Nova");
        let request = server.await.unwrap();
        assert!(request.starts_with(
            "GET /api/music/data?seed=42&skip=0&take=15&language=en&likeFilter=-1 HTTP/1.1"
        ));
    }

    #[tokio::test]
    async fn test_fetch_page_error_status() {
        let (base, server) = serve_once("503 Service Unavailable", String::new()).await;
        let api = HttpCatalogue::new(base).unwrap();
        let query = PageQuery::for_page("42", Language::En, LikeFilter::Any, 1, 10);

        let err = api.fetch_page(&query).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::CatalogueStatus { status: 503, ref endpoint } if endpoint == PAGE_ENDPOINT
        ));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_generate_song() {
        let body = serde_json::json!({
            "seed": "42-3",
            "genre": "Synthwave",
            "finalMixPath": "/files/42-3_mix.mp3",
            "instrumentalPath": "/files/42-3_inst.mp3",
            "imagePath": "",
            "lyrics": [{ "time": 0.0, "text": "la" }, { "time": 4.5, "text": "da" }]
        })
        .to_string();
        let (base, server) = serve_once("200 OK", body).await;
        let api = HttpCatalogue::new(base).unwrap();

        let detail = api.generate_song("42-3", Language::Ru).await.unwrap();
        assert_eq!(detail.final_mix(), Some("/files/42-3_mix.mp3"));
        assert_eq!(detail.image(), None);
        assert_eq!(detail.lyrics.len(), 2);

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/song/generate?seed=42-3&language=ru HTTP/1.1"));
    }

    #[tokio::test]
    async fn test_generate_song_failure() {
        let (base, server) = serve_once("500 Internal Server Error", String::new()).await;
        let api = HttpCatalogue::new(base).unwrap();
        assert!(matches!(
            api.generate_song("1", Language::En).await,
            Err(CoreError::GenerationFailed { .. })
        ));
        server.await.unwrap();
    }
}
