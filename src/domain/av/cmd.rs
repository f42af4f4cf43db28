use crate::domain::av::encode::Rendition;
use async_trait::async_trait;
use std::io;
use std::path::Path;
use std::process::Output;
use tokio::process::Command as TokioCommand;

/// Subprocess boundary for video probing and HLS transcoding.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait EncodeRunner: Send + Sync {
    /// Probe the primary video stream's dimensions and the container bitrate.
    async fn probe_video(&self, path: &Path) -> io::Result<Output>;

    /// Encode one rendition of `source` into `out_dir` as fixed-duration HLS
    /// segments plus a rendition playlist.
    async fn run_hls_encode(
        &self,
        source: &Path,
        rendition: &Rendition,
        out_dir: &Path,
    ) -> io::Result<Output>;
}

pub struct RealEncodeRunner;

#[async_trait]
impl EncodeRunner for RealEncodeRunner {
    async fn probe_video(&self, path: &Path) -> io::Result<Output> {
        TokioCommand::new("ffprobe")
            .arg("-v").arg("error")
            .arg("-select_streams").arg("v:0")
            .arg("-show_entries").arg("stream=width,height")
            .arg("-show_entries").arg("format=bit_rate")
            .arg("-of").arg("default=noprint_wrappers=1")
            .arg(path)
            .output()
            .await
    }

    async fn run_hls_encode(
        &self,
        source: &Path,
        rendition: &Rendition,
        out_dir: &Path,
    ) -> io::Result<Output> {
        let mut command = TokioCommand::new("ffmpeg");
        command
            .arg("-y")
            .arg("-i").arg(source)
            .arg("-vf").arg(format!("scale=-2:{}", rendition.height))
            .arg("-c:v").arg("libx264")
            .arg("-profile:v").arg("main")
            .arg("-crf").arg("20")
            .arg("-sc_threshold").arg("0")
            .arg("-g").arg("48")
            .arg("-keyint_min").arg("48")
            .arg("-c:a").arg("aac")
            .arg("-ar").arg("48000")
            .arg("-b:a").arg(format!("{}k", rendition.audio_bitrate_k))
            .arg("-b:v").arg(format!("{}k", rendition.video_bitrate_k))
            .arg("-maxrate").arg(format!("{}k", rendition.max_bitrate_k()))
            .arg("-bufsize").arg(format!("{}k", rendition.video_bitrate_k * 2))
            .arg("-hls_time").arg("6")
            .arg("-hls_playlist_type").arg("vod")
            .arg("-hls_segment_filename")
            .arg(out_dir.join("fileSequence%d.ts"))
            .arg(out_dir.join("prog_index.m3u8"));
        command.output().await
    }
}
