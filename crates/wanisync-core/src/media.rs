use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use wanisync_types::Media;
use wanisync_wanikani::WaniKaniClient;

/// Read-through cache for downloaded media. The directory must be usable
/// at startup; anything less aborts the run before Anki is touched.
pub struct MediaCache {
    dir: PathBuf,
}

impl MediaCache {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("media cache dir {} is not usable", dir.display()))?;

        let probe = dir.join(".wanisync-probe");
        fs::write(&probe, b"ok")
            .with_context(|| format!("media cache dir {} is not writable", dir.display()))?;
        let _ = fs::remove_file(&probe);

        Ok(Self { dir })
    }

    pub async fn fetch(&self, wk: &WaniKaniClient, media: &Media) -> Result<Vec<u8>> {
        let path = self.dir.join(&media.filename);
        if let Ok(bytes) = fs::read(&path) {
            tracing::debug!("media cache hit for {}", media.filename);
            return Ok(bytes);
        }

        let bytes = wk
            .download(&media.url)
            .await
            .with_context(|| format!("failed to download {}", media.url))?;
        fs::write(&path, &bytes).with_context(|| format!("failed to cache {}", path.display()))?;

        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_dir_is_created() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let dir = tmp.path().join("nested").join("cache");

        MediaCache::new(&dir).expect("MediaCache::new");
        assert!(dir.is_dir());
    }

    #[tokio::test]
    async fn test_cached_file_skips_the_network() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let cache = MediaCache::new(tmp.path()).expect("MediaCache::new");

        fs::write(tmp.path().join("ground.svg"), b"<svg/>").expect("seed cache");

        // nothing listens here; a network attempt would fail loudly
        let wk = WaniKaniClient::with_base_url("token", "http://127.0.0.1:1");
        let media = Media {
            filename: "ground.svg".to_string(),
            url: "http://127.0.0.1:1/ground.svg".to_string(),
        };

        let bytes = cache.fetch(&wk, &media).await.expect("fetch");
        assert_eq!(bytes, b"<svg/>");
    }
}
