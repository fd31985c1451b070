//! Application service: decide which artifact file the agent runs.

use std::path::PathBuf;

use tracing::debug;

use crate::application::ports::LocalFs;
use crate::domain::artifact::{ArtifactOrigin, ArtifactPaths, LocatedArtifact, OVERRIDE_VARIABLE};
use crate::domain::error::ArtifactError;

/// Resolve the artifact to use; the first existing candidate wins.
///
/// Order: explicit override, trusted copy, packaged fallback.
///
/// # Errors
///
/// Returns `ArtifactError::OverrideMissing` if an override is given but does
/// not exist (it is never silently skipped), or `ArtifactError::NotFound`
/// when no candidate exists.
pub fn locate_artifact(
    fs: &impl LocalFs,
    override_path: Option<PathBuf>,
    paths: &ArtifactPaths,
) -> Result<LocatedArtifact, ArtifactError> {
    if let Some(path) = override_path {
        if !fs.exists(&path) {
            return Err(ArtifactError::OverrideMissing {
                variable: OVERRIDE_VARIABLE.to_string(),
                path: path.display().to_string(),
            });
        }
        return Ok(found(path, ArtifactOrigin::Overridden));
    }

    if fs.exists(&paths.trusted_artifact) {
        return Ok(found(paths.trusted_artifact.clone(), ArtifactOrigin::Trusted));
    }
    if fs.exists(&paths.packaged_artifact) {
        return Ok(found(paths.packaged_artifact.clone(), ArtifactOrigin::Packaged));
    }
    Err(ArtifactError::NotFound)
}

fn found(path: PathBuf, origin: ArtifactOrigin) -> LocatedArtifact {
    debug!(path = %path.display(), origin = origin.label(), "artifact located");
    LocatedArtifact { path, origin }
}
