use image::{DynamicImage, GenericImageView, RgbaImage};
use std::time::Duration;

use crate::errors::{FrameError, Result};
use crate::playlist::{Locator, LocatorKind};
use crate::settings::ImageSettings;
use crate::transform::ImageExtent;

/// Limits handed to an image source for one load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageRequest {
    pub max_width: u32,
    pub max_height: u32,
    pub timeout: Duration,
}

impl Default for ImageRequest {
    fn default() -> Self {
        Self::from(&ImageSettings::default())
    }
}

impl From<&ImageSettings> for ImageRequest {
    fn from(settings: &ImageSettings) -> Self {
        Self {
            max_width: settings.max_width,
            max_height: settings.max_height,
            timeout: settings.load_timeout(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: RgbaImage,
}

impl LoadedImage {
    pub fn from_dynamic(image: DynamicImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            pixels: image.into_rgba8(),
        }
    }

    pub fn extent(&self) -> Result<ImageExtent> {
        ImageExtent::from_pixels(self.width, self.height)
    }
}

/// Fetches and decodes images. Called from worker threads.
pub trait ImageSource: Send + Sync {
    fn load(&self, locator: &Locator, request: &ImageRequest) -> Result<LoadedImage>;
}

/// Local files through the `image` crate. Remote locators are refused.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileImageSource;

impl ImageSource for FileImageSource {
    fn load(&self, locator: &Locator, request: &ImageRequest) -> Result<LoadedImage> {
        let path = match (locator.kind(), locator.to_path()) {
            (LocatorKind::Local, Some(path)) => path,
            _ => {
                return Err(FrameError::UnsupportedLocator {
                    locator: locator.to_string(),
                })
            }
        };
        if !path.exists() {
            return Err(FrameError::FileNotFound {
                locator: locator.to_string(),
            });
        }

        let image = image::open(&path).map_err(|e| decode_error(locator, e))?;
        Ok(cap_size(locator, image, request))
    }
}

/// `http`/`https` locators fetched with a blocking client. The request's
/// timeout bounds the whole transfer.
#[derive(Debug, Clone)]
pub struct HttpImageSource {
    client: reqwest::blocking::Client,
}

impl HttpImageSource {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("picframe/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FrameError::ImageLoadError {
                locator: String::new(),
                message: format!("HTTP client unavailable: {}", e),
            })?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

impl ImageSource for HttpImageSource {
    fn load(&self, locator: &Locator, request: &ImageRequest) -> Result<LoadedImage> {
        if locator.kind() != LocatorKind::Remote {
            return Err(FrameError::UnsupportedLocator {
                locator: locator.to_string(),
            });
        }

        let transfer_error = |e: reqwest::Error| {
            if e.is_timeout() {
                FrameError::LoadTimeout {
                    locator: locator.to_string(),
                    timeout: request.timeout,
                }
            } else {
                FrameError::ImageLoadError {
                    locator: locator.to_string(),
                    message: e.to_string(),
                }
            }
        };

        let response = self
            .client
            .get(locator.as_str())
            .timeout(request.timeout)
            .send()
            .map_err(transfer_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FrameError::ImageLoadError {
                locator: locator.to_string(),
                message: format!("server answered {}", status),
            });
        }
        let bytes = response.bytes().map_err(transfer_error)?;
        tracing::debug!(%locator, bytes = bytes.len(), "downloaded image");
        decode_bytes(locator, &bytes, request)
    }
}

/// Routes local paths to [`FileImageSource`] and URLs to [`HttpImageSource`].
#[derive(Debug, Clone)]
pub struct DefaultImageSource {
    file: FileImageSource,
    http: HttpImageSource,
}

impl DefaultImageSource {
    pub fn new() -> Result<Self> {
        Ok(Self {
            file: FileImageSource,
            http: HttpImageSource::new()?,
        })
    }
}

impl ImageSource for DefaultImageSource {
    fn load(&self, locator: &Locator, request: &ImageRequest) -> Result<LoadedImage> {
        match locator.kind() {
            LocatorKind::Local => self.file.load(locator, request),
            LocatorKind::Remote => self.http.load(locator, request),
        }
    }
}

/// Decodes an in-memory file, format sniffed from its header.
pub fn decode_bytes(locator: &Locator, bytes: &[u8], request: &ImageRequest) -> Result<LoadedImage> {
    let image = image::load_from_memory(bytes).map_err(|e| decode_error(locator, e))?;
    Ok(cap_size(locator, image, request))
}

fn decode_error(locator: &Locator, error: image::ImageError) -> FrameError {
    FrameError::ImageLoadError {
        locator: locator.to_string(),
        message: error.to_string(),
    }
}

fn cap_size(locator: &Locator, image: DynamicImage, request: &ImageRequest) -> LoadedImage {
    let (width, height) = image.dimensions();
    let image = if width > request.max_width || height > request.max_height {
        tracing::debug!(%locator, width, height, "downscaling oversized image");
        image.thumbnail(request.max_width.max(1), request.max_height.max(1))
    } else {
        image
    };
    LoadedImage::from_dynamic(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use tempfile::tempdir;

    fn write_png(path: &std::path::Path, width: u32, height: u32) {
        let img = RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        img.save(path).unwrap();
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, image::Rgba([200, 100, 50, 255]));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    /// Answers a single request with `status` and `body`, or stays silent
    /// when `status` is `None`. Returns the base URL.
    fn serve_once(status: Option<&'static str>, body: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 2048];
            let _ = stream.read(&mut buf);
            match status {
                Some(status) => {
                    let head = format!(
                        "HTTP/1.1 {}\r\nContent-Type: image/png\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                        status,
                        body.len()
                    );
                    let _ = stream.write_all(head.as_bytes());
                    let _ = stream.write_all(&body);
                }
                None => std::thread::sleep(Duration::from_secs(2)),
            }
        });
        format!("http://{}", addr)
    }

    fn local_http() -> HttpImageSource {
        let client = reqwest::blocking::Client::builder().no_proxy().build().unwrap();
        HttpImageSource::with_client(client)
    }

    #[test]
    fn test_loads_local_png() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("small.png");
        write_png(&path, 40, 20);

        let loaded = FileImageSource
            .load(&Locator::from_path(&path), &ImageRequest::default())
            .unwrap();
        assert_eq!((loaded.width, loaded.height), (40, 20));
        assert_eq!(loaded.pixels.get_pixel(0, 0).0, [10, 20, 30, 255]);
        assert_eq!(loaded.extent().unwrap().width(), 40.0);
    }

    #[test]
    fn test_oversized_image_is_capped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big.png");
        write_png(&path, 400, 100);

        let request = ImageRequest {
            max_width: 100,
            max_height: 100,
            ..ImageRequest::default()
        };
        let loaded = FileImageSource.load(&Locator::from_path(&path), &request).unwrap();
        assert_eq!(loaded.width, 100);
        assert_eq!(loaded.height, 25);
    }

    #[test]
    fn test_decode_bytes_applies_cap() {
        let request = ImageRequest {
            max_width: 50,
            max_height: 50,
            ..ImageRequest::default()
        };
        let locator = Locator::new("https://example.com/wide.png");
        let loaded = decode_bytes(&locator, &png_bytes(200, 100), &request).unwrap();
        assert_eq!((loaded.width, loaded.height), (50, 25));

        let err = decode_bytes(&locator, b"<html>", &request).unwrap_err();
        assert!(matches!(err, FrameError::ImageLoadError { .. }));
    }

    #[test]
    fn test_http_source_downloads_and_decodes() {
        let base = serve_once(Some("200 OK"), png_bytes(30, 60));
        let locator = Locator::new(format!("{}/photo.png?size=large", base));

        let loaded = local_http().load(&locator, &ImageRequest::default()).unwrap();
        assert_eq!((loaded.width, loaded.height), (30, 60));
        assert_eq!(loaded.pixels.get_pixel(0, 0).0, [200, 100, 50, 255]);
    }

    #[test]
    fn test_http_error_status_is_a_load_error() {
        let base = serve_once(Some("404 Not Found"), b"missing".to_vec());
        let locator = Locator::new(format!("{}/gone.jpg", base));

        let err = local_http().load(&locator, &ImageRequest::default()).unwrap_err();
        match err {
            FrameError::ImageLoadError { message, .. } => assert!(message.contains("404")),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_http_request_times_out() {
        let base = serve_once(None, Vec::new());
        let request = ImageRequest {
            timeout: Duration::from_millis(200),
            ..ImageRequest::default()
        };

        let err = local_http()
            .load(&Locator::new(format!("{}/stalled.jpg", base)), &request)
            .unwrap_err();
        assert!(matches!(err, FrameError::LoadTimeout { .. }));
        assert_eq!(err.error_code(), "LOAD_TIMEOUT");
    }

    #[test]
    fn test_http_source_refuses_local_paths() {
        let err = local_http()
            .load(&Locator::new("/photos/a.jpg"), &ImageRequest::default())
            .unwrap_err();
        assert!(matches!(err, FrameError::UnsupportedLocator { .. }));
    }

    #[test]
    fn test_default_source_routes_by_kind() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("local.png");
        write_png(&path, 12, 8);
        let source = DefaultImageSource {
            file: FileImageSource,
            http: local_http(),
        };

        let local = source.load(&Locator::from_path(&path), &ImageRequest::default()).unwrap();
        assert_eq!((local.width, local.height), (12, 8));

        let base = serve_once(Some("200 OK"), png_bytes(7, 9));
        let remote = source
            .load(&Locator::new(format!("{}/r.png", base)), &ImageRequest::default())
            .unwrap();
        assert_eq!((remote.width, remote.height), (7, 9));
    }

    #[test]
    fn test_failures_are_typed() {
        let source = FileImageSource;
        let request = ImageRequest::default();

        let err = source
            .load(&Locator::new("https://example.com/a.jpg"), &request)
            .unwrap_err();
        assert!(matches!(err, FrameError::UnsupportedLocator { .. }));

        let err = source
            .load(&Locator::new("/definitely/not/here.jpg"), &request)
            .unwrap_err();
        assert!(matches!(err, FrameError::FileNotFound { .. }));

        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"not an image").unwrap();
        let err = source.load(&Locator::from_path(&path), &request).unwrap_err();
        assert!(matches!(err, FrameError::ImageLoadError { .. }));
    }
}
