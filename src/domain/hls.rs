use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// One rendition entry in a master playlist.
pub struct VariantStream {
    pub bandwidth: u64,
    pub width: u32,
    pub height: u32,
    pub uri: String,
}

/// Top-level HLS playlist listing every rendition of an asset.
pub struct MasterPlaylist {
    pub version: u8,
    pub variants: Vec<VariantStream>,
}

impl MasterPlaylist {
    pub fn new() -> Self {
        Self {
            version: 3,
            variants: Vec::new(),
        }
    }

    pub fn add_variant(&mut self, bandwidth: u64, width: u32, height: u32, uri: String) {
        self.variants.push(VariantStream {
            bandwidth,
            width,
            height,
            uri,
        });
    }

    pub async fn write_to(&self, path: &Path) -> Result<(), std::io::Error> {
        let mut file = File::create(path).await?;

        file.write_all(b"#EXTM3U\n").await?;
        file.write_all(format!("#EXT-X-VERSION:{}\n", self.version).as_bytes())
            .await?;

        for variant in &self.variants {
            file.write_all(
                format!(
                    "#EXT-X-STREAM-INF:BANDWIDTH={},RESOLUTION={}x{}\n",
                    variant.bandwidth, variant.width, variant.height
                )
                .as_bytes(),
            )
            .await?;
            file.write_all(variant.uri.as_bytes()).await?;
            file.write_all(b"\n").await?;
        }

        Ok(())
    }
}

impl Default for MasterPlaylist {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::fs;

    #[tokio::test]
    async fn test_master_playlist_contents() {
        let mut playlist = MasterPlaylist::new();
        playlist.add_variant(2_996_000, 1280, 720, "v1/prog_index.m3u8".to_string());
        playlist.add_variant(984_000, 854, 480, "v0/prog_index.m3u8".to_string());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("master.m3u8");

        playlist.write_to(&path).await.unwrap();

        let content = fs::read_to_string(&path).await.unwrap();

        assert!(content.starts_with("#EXTM3U\n"));
        assert!(content.contains("#EXT-X-VERSION:3"));
        assert!(content.contains("#EXT-X-STREAM-INF:BANDWIDTH=2996000,RESOLUTION=1280x720"));
        assert!(content.contains("v1/prog_index.m3u8\n"));
        assert!(content.contains("#EXT-X-STREAM-INF:BANDWIDTH=984000,RESOLUTION=854x480"));
        assert!(content.contains("v0/prog_index.m3u8\n"));
    }
}
