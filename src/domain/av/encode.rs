use crate::domain::av::cmd::EncodeRunner;
use crate::domain::hls::MasterPlaylist;
use std::error::Error;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Error produced while probing or transcoding a source video.
#[derive(Debug)]
pub enum EncodeError {
    Probe(String),
    Transcode(String),
    Io(std::io::Error),
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::Probe(e) => write!(f, "ffprobe error: {}", e),
            EncodeError::Transcode(e) => write!(f, "ffmpeg error: {}", e),
            EncodeError::Io(e) => write!(f, "io error: {}", e),
        }
    }
}

impl Error for EncodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            EncodeError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for EncodeError {
    fn from(err: std::io::Error) -> Self {
        EncodeError::Io(err)
    }
}

/// Source properties recovered by ffprobe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    pub bit_rate: Option<u64>,
}

/// Parse `key=value` lines from `ffprobe -of default=noprint_wrappers=1`.
pub(crate) fn parse_probe_output(stdout: &str) -> Result<VideoInfo, EncodeError> {
    let mut width = None;
    let mut height = None;
    let mut bit_rate = None;

    for line in stdout.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        match key.trim() {
            "width" => width = value.trim().parse().ok(),
            "height" => height = value.trim().parse().ok(),
            "bit_rate" => bit_rate = value.trim().parse().ok(),
            _ => {}
        }
    }

    match (width, height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => Ok(VideoInfo {
            width: w,
            height: h,
            bit_rate,
        }),
        _ => Err(EncodeError::Probe(format!(
            "missing video dimensions in ffprobe output: {stdout:?}"
        ))),
    }
}

/// One bitrate-ladder entry. `name` doubles as the rendition directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendition {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub video_bitrate_k: u64,
    pub audio_bitrate_k: u64,
}

impl Rendition {
    pub fn max_bitrate_k(&self) -> u64 {
        self.video_bitrate_k * 107 / 100
    }

    /// Peak bandwidth advertised in the master playlist, bits per second.
    pub fn bandwidth(&self) -> u64 {
        (self.max_bitrate_k() + self.audio_bitrate_k) * 1000
    }

    pub fn playlist_uri(&self) -> String {
        format!("{}/prog_index.m3u8", self.name)
    }
}

/// Candidate rungs: (height, video bitrate in kbit/s).
const LADDER: [(u32, u64); 3] = [(480, 800), (720, 2800), (1080, 5000)];

const AUDIO_BITRATE_K: u64 = 128;

/// Build the rendition ladder for a source. Rungs taller than the source are
/// dropped; a source shorter than the smallest rung is encoded at its native
/// height so there is always at least one rendition.
pub fn build_ladder(info: &VideoInfo) -> Vec<Rendition> {
    let mut rungs: Vec<(u32, u64)> = LADDER
        .iter()
        .copied()
        .filter(|&(height, _)| height <= info.height)
        .collect();

    if rungs.is_empty() {
        rungs.push((info.height & !1, LADDER[0].1));
    }

    rungs
        .iter()
        .enumerate()
        .map(|(i, &(height, video_bitrate_k))| Rendition {
            name: format!("v{}", i),
            width: scaled_width(info, height),
            height,
            video_bitrate_k,
            audio_bitrate_k: AUDIO_BITRATE_K,
        })
        .collect()
}

/// Width after `scale=-2:h`: aspect ratio preserved, rounded up to even.
fn scaled_width(info: &VideoInfo, height: u32) -> u32 {
    let width = (info.width as u64 * height as u64 / info.height as u64) as u32;
    (width + 1) & !1
}

/// Transcode one source video into the full HLS rendition set plus a master
/// playlist, all inside `workdir`. Rendition directories are `v0..vN` in
/// ladder order. The source file is removed once every rendition succeeded;
/// any subprocess failure aborts the whole encode and leaves the working
/// directory as-is.
pub async fn encode_hls(
    source: &Path,
    workdir: &Path,
    runner: &impl EncodeRunner,
) -> Result<(), EncodeError> {
    let probe = runner.probe_video(source).await?;
    if !probe.status.success() {
        return Err(EncodeError::Probe(
            String::from_utf8_lossy(&probe.stderr).into_owned(),
        ));
    }

    let info = parse_probe_output(&String::from_utf8_lossy(&probe.stdout))?;
    let ladder = build_ladder(&info);
    debug!(?info, renditions = ladder.len(), "starting HLS encode");

    let mut master = MasterPlaylist::new();
    for rendition in &ladder {
        let out_dir = workdir.join(&rendition.name);
        tokio::fs::create_dir_all(&out_dir).await?;

        let output = runner.run_hls_encode(source, rendition, &out_dir).await?;
        if !output.status.success() {
            return Err(EncodeError::Transcode(format!(
                "rendition {} failed: {}",
                rendition.name,
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        master.add_variant(
            rendition.bandwidth(),
            rendition.width,
            rendition.height,
            rendition.playlist_uri(),
        );
        debug!(rendition = %rendition.name, height = rendition.height, "rendition encoded");
    }

    master.write_to(&workdir.join("master.m3u8")).await?;
    tokio::fs::remove_file(source).await?;
    Ok(())
}
