use crate::error::{ProposalBuildError, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::path::Path;

/// Package a chaincode source directory into a TAR.GZ byte stream, the
/// `code_package` field of a `ChaincodeDeploymentSpec`. Mirrors only
/// the shape of Fabric's packager, not its full metadata/descriptor
/// conventions, which are out of scope.
pub fn package_source(source_dir: &Path) -> Result<Vec<u8>> {
    if !source_dir.is_dir() {
        return Err(ProposalBuildError::Packaging(format!(
            "{} is not a directory",
            source_dir.display()
        )));
    }

    let gz = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(gz);
    builder
        .append_dir_all(".", source_dir)
        .map_err(|e| ProposalBuildError::Packaging(e.to_string()))?;
    let gz = builder
        .into_inner()
        .map_err(|e| ProposalBuildError::Packaging(e.to_string()))?;
    gz.finish()
        .map_err(|e| ProposalBuildError::Packaging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn packages_a_directory_into_a_nonempty_gzip_stream() {
        let dir = std::env::temp_dir().join(format!("fabric-proposal-pkg-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("main.go"), b"package main").unwrap();

        let archive = package_source(&dir).unwrap();
        assert!(!archive.is_empty());
        // gzip magic number
        assert_eq!(&archive[0..2], &[0x1f, 0x8b]);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn rejects_missing_directory() {
        let missing = std::env::temp_dir().join("fabric-proposal-pkg-test-missing-xyz");
        assert!(package_source(&missing).is_err());
    }
}
