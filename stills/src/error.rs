use std::path::PathBuf;

use stills_common::utils::fsutils::AtomicWriteError;

#[derive(thiserror::Error, Debug)]
pub enum StillsError {
    #[error("the video does not contain any frames")]
    EmptySource,
    #[error("none of the selected keyframes exist in the video")]
    NothingToComposite,
    #[error("failed to write the composite to {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: AtomicWriteError<image::ImageError>,
    },
}
