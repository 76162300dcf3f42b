//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the operations every backend must
//! support: identify, decode, and resize (resize + encode into the target
//! format). An original is decoded once and every variant of it is resized
//! from the shared decoded image.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), pure Rust with no
//! system libraries. Everything is statically linked into the binary.

use super::params::ResizeParams;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// `Sync` so one backend can be shared by every rayon worker of the variant
/// job.
pub trait ImageBackend: Sync {
    /// A decoded original, shared by the workers resizing it.
    type Decoded: Sync;

    /// Get image dimensions.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Decode the full pixel data of `path`.
    fn decode(&self, path: &Path) -> Result<Self::Decoded, BackendError>;

    /// Resize `image` (decoded from `params.source`) to exactly
    /// `width`×`height` and write `params.output` encoded as `params.format`.
    fn resize(&self, image: &Self::Decoded, params: &ResizeParams) -> Result<(), BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::OutputFormat;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Mock backend that records operations instead of encoding pixels.
    ///
    /// Uses Mutex (not RefCell) so it is Sync and works with rayon's par_iter.
    /// A successful resize writes `output_bytes` zero bytes to the output path
    /// so callers can stat it; formats listed in `failing_formats` write a
    /// partial file and then fail. Files named in `undecodable` identify but
    /// fail to decode.
    #[derive(Default)]
    pub struct MockBackend {
        pub dimensions: Mutex<HashMap<String, Dimensions>>,
        pub failing_formats: Vec<OutputFormat>,
        pub undecodable: Vec<String>,
        pub output_bytes: usize,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify(String),
        Decode(String),
        Resize {
            source: String,
            output: String,
            width: u32,
            height: u32,
            format: OutputFormat,
            quality: u32,
        },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self {
                output_bytes: 16,
                ..Self::default()
            }
        }

        /// Report `dims` for every source whose file name is `file_name`.
        pub fn with_dimensions(self, file_name: &str, dims: Dimensions) -> Self {
            self.dimensions
                .lock()
                .unwrap()
                .insert(file_name.to_string(), dims);
            self
        }

        pub fn failing_on(mut self, formats: &[OutputFormat]) -> Self {
            self.failing_formats = formats.to_vec();
            self
        }

        pub fn undecodable(mut self, file_name: &str) -> Self {
            self.undecodable.push(file_name.to_string());
            self
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        pub fn resize_count(&self) -> usize {
            self.get_operations()
                .iter()
                .filter(|op| matches!(op, RecordedOp::Resize { .. }))
                .count()
        }

        pub fn decode_count(&self) -> usize {
            self.get_operations()
                .iter()
                .filter(|op| matches!(op, RecordedOp::Decode(_)))
                .count()
        }
    }

    fn file_name_of(path: &Path) -> String {
        path.file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    impl ImageBackend for MockBackend {
        /// The mock never touches pixels; the decoded image is its path.
        type Decoded = std::path::PathBuf;

        fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Identify(path.to_string_lossy().to_string()));

            let name = file_name_of(path);
            self.dimensions
                .lock()
                .unwrap()
                .get(&name)
                .copied()
                .ok_or_else(|| {
                    BackendError::ProcessingFailed(format!("No mock dimensions for {name}"))
                })
        }

        fn decode(&self, path: &Path) -> Result<Self::Decoded, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Decode(path.to_string_lossy().to_string()));

            if self.undecodable.contains(&file_name_of(path)) {
                return Err(BackendError::ProcessingFailed(format!(
                    "mock cannot decode {}",
                    path.display()
                )));
            }
            Ok(path.to_path_buf())
        }

        fn resize(
            &self,
            _image: &Self::Decoded,
            params: &ResizeParams,
        ) -> Result<(), BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Resize {
                source: params.source.to_string_lossy().to_string(),
                output: params.output.to_string_lossy().to_string(),
                width: params.width,
                height: params.height,
                format: params.format,
                quality: params.quality.value(),
            });

            if self.failing_formats.contains(&params.format) {
                std::fs::write(&params.output, b"partial")?;
                return Err(BackendError::ProcessingFailed(format!(
                    "mock {} encoder failure",
                    params.format
                )));
            }
            std::fs::write(&params.output, vec![0u8; self.output_bytes])?;
            Ok(())
        }
    }

    #[test]
    fn mock_records_identify() {
        let backend = MockBackend::new().with_dimensions(
            "image.jpg",
            Dimensions {
                width: 800,
                height: 600,
            },
        );

        let result = backend.identify(Path::new("/test/image.jpg")).unwrap();
        assert_eq!(result.width, 800);
        assert_eq!(result.height, 600);

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(&ops[0], RecordedOp::Identify(p) if p == "/test/image.jpg"));
    }

    #[test]
    fn mock_identify_unknown_file_errors() {
        let backend = MockBackend::new();
        assert!(backend.identify(Path::new("/test/other.jpg")).is_err());
    }

    #[test]
    fn mock_decode_fails_for_undecodable_files() {
        let backend = MockBackend::new().undecodable("broken.png");

        assert!(backend.decode(Path::new("/img/photo.png")).is_ok());
        assert!(backend.decode(Path::new("/img/broken.png")).is_err());
        assert_eq!(backend.decode_count(), 2);
    }

    #[test]
    fn mock_records_resize_and_writes_output() {
        let tmp = tempfile::TempDir::new().unwrap();
        let output = tmp.path().join("out.avif");
        let backend = MockBackend::new();
        let params = ResizeParams {
            source: "/source.jpg".into(),
            output: output.clone(),
            width: 800,
            height: 600,
            format: OutputFormat::Avif,
            quality: crate::imaging::Quality::new(60),
        };

        backend.resize(&params.source, &params).unwrap();

        assert_eq!(std::fs::metadata(&output).unwrap().len(), 16);
        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(
            &ops[0],
            RecordedOp::Resize {
                width: 800,
                height: 600,
                format: OutputFormat::Avif,
                quality: 60,
                ..
            }
        ));
    }

    #[test]
    fn mock_fails_configured_formats() {
        let tmp = tempfile::TempDir::new().unwrap();
        let backend = MockBackend::new().failing_on(&[OutputFormat::Jpeg]);

        let params = ResizeParams {
            source: "/source.jpg".into(),
            output: tmp.path().join("out.jpg"),
            width: 10,
            height: 10,
            format: OutputFormat::Jpeg,
            quality: crate::imaging::Quality::new(75),
        };

        assert!(backend.resize(&params.source, &params).is_err());
    }
}
