use super::AppState;
use crate::domain::media::{Media, MediaType};
use axum::body::Bytes;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::{BoxError, Json};
use futures::{Stream, TryStreamExt};
use serde_json::{json, Value};
use std::io;
use std::path::PathBuf;
use tokio::{fs::File, io::BufWriter};
use tokio_util::io::StreamReader;
use tracing::info;
use uuid::Uuid;

const ALLOWED_VIDEO_EXTENSIONS: [&str; 2] = ["mp4", "mov"];

/// Request body cap for the video ingress route.
pub const MAX_VIDEO_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Accept a multipart video upload, admit it to the encoding queue and answer
/// immediately with the predicted master playlist URL. Only parts named
/// `video` are accepted. Clients poll `/medias/video-status/{id}` until
/// encoding finishes.
pub async fn upload_video_hls(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Value>, (StatusCode, String)> {
    let mut uploaded = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (e.status(), e.body_text()))?
    {
        if field.name() != Some("video") {
            return Err((
                StatusCode::BAD_REQUEST,
                "Only the 'video' field is accepted".to_owned(),
            ));
        }
        let file_name = if let Some(file_name) = field.file_name() {
            file_name.to_owned()
        } else {
            continue;
        };

        let extension = extension_of(&file_name)
            .ok_or((StatusCode::BAD_REQUEST, "File has no extension".to_owned()))?;
        if !ALLOWED_VIDEO_EXTENSIONS.contains(&extension.as_str()) {
            return Err((
                StatusCode::BAD_REQUEST,
                "File type is not supported".to_owned(),
            ));
        }

        let id = Uuid::new_v4().to_string();
        let workdir = PathBuf::from(&state.config.upload_video_dir).join(&id);
        tokio::fs::create_dir_all(&workdir)
            .await
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

        let path = workdir.join(format!("{}.{}", id, extension));
        info!(asset = %id, ?path, "saving uploaded video");
        stream_to_file(&path, field).await?;

        state
            .queue
            .enqueue(&path)
            .await
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

        uploaded.push(Media {
            url: format!(
                "{}/static/video-hls/{}/master.m3u8",
                state.config.host, id
            ),
            media_type: MediaType::Hls,
        });
    }

    if uploaded.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "File is required".to_owned()));
    }

    Ok(Json(json!({
        "message": "Upload video HLS success",
        "data": uploaded
    })))
}

/// Status polling endpoint backed by the status store.
pub async fn video_status(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match state.repo.get(&name).await {
        Ok(Some(record)) => Ok(Json(json!({
            "message": "Get video status success",
            "data": record
        }))),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "Video not found" })),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": e.to_string() })),
        )),
    }
}

fn extension_of(file_name: &str) -> Option<String> {
    std::path::Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

// Save a `Stream` to a file
async fn stream_to_file<S, E>(path: &PathBuf, stream: S) -> Result<(), (StatusCode, String)>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<BoxError>,
{
    async {
        let body_with_io_error = stream.map_err(|err| io::Error::new(io::ErrorKind::Other, err));
        let body_reader = StreamReader::new(body_with_io_error);
        futures::pin_mut!(body_reader);

        let mut file = BufWriter::new(File::create(path).await?);
        tokio::io::copy(&mut body_reader, &mut file).await?;

        Ok::<_, io::Error>(())
    }
    .await
    .map_err(|err| (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStatusRepository;
    use crate::application::queue::EncodingQueue;
    use crate::config::Config;
    use crate::ports::producer::MockSegmentProducer;
    use crate::ports::storage::{MockObjectStorage, ObjectStorage};
    use axum::body::Body;
    use axum::extract::FromRequest;
    use bytes::Bytes;
    use futures::stream;
    use std::fs;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn test_state(upload_dir: &std::path::Path) -> AppState {
        let repo = Arc::new(InMemoryStatusRepository::new());
        let mut storage = MockObjectStorage::new();
        storage
            .expect_put_file()
            .returning(|_, _, _| Box::pin(async move { Ok(()) }));
        let storage: Arc<dyn ObjectStorage> = Arc::new(storage);
        let mut producer = MockSegmentProducer::new();
        producer
            .expect_produce()
            .returning(|_, _| Box::pin(async move { Ok(()) }));
        let (queue, _worker) =
            EncodingQueue::start(repo.clone(), Arc::new(producer), storage.clone());
        AppState {
            config: Config {
                addr: "127.0.0.1".to_string(),
                port: "3000".to_string(),
                host: "http://localhost:3000".to_string(),
                redis_url: "redis://127.0.0.1/".to_string(),
                s3_bucket: "test".to_string(),
                upload_video_dir: upload_dir.to_string_lossy().into_owned(),
            },
            queue: Arc::new(queue),
            repo,
            storage,
        }
    }

    fn multipart_request(field_name: &str, file_name: &str) -> axum::http::Request<Body> {
        let body = format!(
            "--BOUNDARY\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: video/mp4\r\n\r\nfake video bytes\r\n--BOUNDARY--\r\n",
            field_name, file_name
        );
        axum::http::Request::builder()
            .header("content-type", "multipart/form-data; boundary=BOUNDARY")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_upload_rejects_wrongly_named_field() {
        let dir = tempdir().unwrap();
        let state = test_state(dir.path());

        let multipart = Multipart::from_request(multipart_request("image", "clip.mp4"), &())
            .await
            .unwrap();
        let err = upload_video_hls(State(state), multipart).await.unwrap_err();

        assert_eq!(err.0, StatusCode::BAD_REQUEST);
        assert!(err.1.contains("video"));
        // Nothing was saved or queued.
        assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn test_upload_accepts_video_field() {
        let dir = tempdir().unwrap();
        let state = test_state(dir.path());

        let multipart = Multipart::from_request(multipart_request("video", "clip.mp4"), &())
            .await
            .unwrap();
        let Json(json) = upload_video_hls(State(state.clone()), multipart)
            .await
            .unwrap();

        assert_eq!(json["message"], "Upload video HLS success");
        let url = json["data"][0]["url"].as_str().unwrap();
        let id = url
            .strip_prefix("http://localhost:3000/static/video-hls/")
            .and_then(|rest| rest.strip_suffix("/master.m3u8"))
            .unwrap();
        let record = state.repo.get(id).await.unwrap().unwrap();
        assert_eq!(record.name, id);
    }

    #[tokio::test]
    async fn test_stream_to_file() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("test_file.mp4");

        type E = std::io::Error;

        let test_data = "fake video bytes";
        let mock_stream = stream::iter(vec![Ok::<bytes::Bytes, E>(Bytes::from(test_data))]);

        let result = stream_to_file(&file_path, mock_stream).await;
        assert!(result.is_ok());

        let file_contents = fs::read_to_string(file_path).unwrap();
        assert_eq!(file_contents, test_data);
    }

    #[tokio::test]
    async fn test_stream_to_file_error() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("test_file.mp4");

        let mock_stream = stream::iter(vec![Err("Test error")]);

        let result = stream_to_file(&file_path, mock_stream).await;
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err(),
            (StatusCode::INTERNAL_SERVER_ERROR, "Test error".to_string())
        );
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("clip.mp4"), Some("mp4".to_string()));
        assert_eq!(extension_of("Clip.MOV"), Some("mov".to_string()));
        assert_eq!(extension_of("archive.tar.mp4"), Some("mp4".to_string()));
        assert_eq!(extension_of("noext"), None);
    }
}
