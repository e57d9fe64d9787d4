//! File Registry - 저장된 코드 관리
//!
//! CRUD over saved artifacts plus share-link derivation. The last listing is
//! cached; `create` and `delete` drop the cache instead of patching it. Each
//! drop bumps a generation, and a listing that started before the drop is
//! returned but not cached.

use crate::auth::CredentialReader;
use codexec_foundation::{
    ArtifactContent, ArtifactDraft, ArtifactId, ArtifactSummary, Error, Result, ShareLink,
};
use codexec_transport::{path_segment, HttpTransport, RequestOptions};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct ShareResponse {
    share_url: String,
}

#[derive(Debug, Default)]
struct ListingCache {
    generation: u64,
    files: Option<Vec<ArtifactSummary>>,
}

/// Saved artifact client
pub struct FileRegistry {
    transport: HttpTransport,
    credentials: CredentialReader,
    cache: RwLock<ListingCache>,
}

impl FileRegistry {
    pub fn new(transport: HttpTransport, credentials: CredentialReader) -> Self {
        Self {
            transport,
            credentials,
            cache: RwLock::new(ListingCache::default()),
        }
    }

    fn authorized(&self, options: RequestOptions) -> RequestOptions {
        options.bearer(self.credentials.current().as_ref())
    }

    /// All artifacts owned by the authenticated user
    pub async fn list(&self) -> Result<Vec<ArtifactSummary>> {
        let started = self.cache.read().await.generation;
        let files: Vec<ArtifactSummary> = self
            .transport
            .request("/files", self.authorized(RequestOptions::get()))
            .await?
            .unwrap_or_default();

        debug!("Listed {} files", files.len());
        let mut cache = self.cache.write().await;
        if cache.generation == started {
            cache.files = Some(files.clone());
        } else {
            debug!("Listing raced a change; not cached");
        }
        Ok(files)
    }

    /// Last listing, if still valid
    pub async fn cached(&self) -> Option<Vec<ArtifactSummary>> {
        self.cache.read().await.files.clone()
    }

    /// Save a new artifact
    pub async fn create(&self, draft: &ArtifactDraft) -> Result<ArtifactSummary> {
        if draft.filename.trim().is_empty() {
            return Err(Error::InvalidInput("Filename must not be empty".to_string()));
        }

        let created: ArtifactSummary = self
            .transport
            .request_json("/files", self.authorized(RequestOptions::post().json(draft)))
            .await?;

        self.invalidate().await;
        info!("Saved {} as file {}", created.filename, created.id);
        Ok(created)
    }

    /// Owned artifact by identifier
    pub async fn fetch(&self, id: &ArtifactId) -> Result<ArtifactContent> {
        let endpoint = format!("/files/{}", path_segment(id.as_str()));
        Ok(self
            .transport
            .request_json(&endpoint, self.authorized(RequestOptions::get()))
            .await?)
    }

    /// Artifact behind a share link. No credential is sent.
    pub async fn fetch_shared(&self, link: &ShareLink) -> Result<ArtifactContent> {
        let endpoint = format!("/files/{}", path_segment(&link.share_id));
        Ok(self
            .transport
            .request_json(&endpoint, RequestOptions::get())
            .await?)
    }

    pub async fn delete(&self, id: &ArtifactId) -> Result<()> {
        let endpoint = format!("/files/{}", path_segment(id.as_str()));
        self.transport
            .request_empty(&endpoint, self.authorized(RequestOptions::delete()))
            .await?;

        self.invalidate().await;
        info!("Deleted file {}", id);
        Ok(())
    }

    /// Promote an artifact to a share link
    pub async fn share(&self, id: &ArtifactId) -> Result<ShareLink> {
        let endpoint = format!("/files/share/{}", path_segment(id.as_str()));
        let response: ShareResponse = self
            .transport
            .request_json(&endpoint, self.authorized(RequestOptions::post()))
            .await?;

        ShareLink::parse(&response.share_url).ok_or_else(|| {
            Error::Protocol(format!("Share URL without an id: {}", response.share_url))
        })
    }

    async fn invalidate(&self) {
        let mut cache = self.cache.write().await;
        cache.generation += 1;
        cache.files = None;
    }
}
