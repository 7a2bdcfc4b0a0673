//! Generic parameters functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::de::DeserializeOwned;
use std::fs::read_to_string;
use std::path::Path;
use thiserror::Error;
use toml;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// An error that occurs during loading of a parameter file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("The software root environment variable (ROVER_TWIN_ROOT) is not set")]
    SwRootNotSet,

    #[error("Cannot load the parmeter file: {0}")]
    FileLoadError(std::io::Error),

    #[error("Cannot read the parameter file: {0}")]
    DeserialiseError(toml::de::Error)
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Load a parameter file
///
/// The file path is relative to the "params" directory under the software
/// root.
pub fn load<P>(param_file_path: &str) -> Result<P, LoadError> 
where
    P: DeserializeOwned
{
    // Get the params dir
    let mut path = crate::host::get_sw_root()
        .map_err(|_| LoadError::SwRootNotSet)?;
    path.push("params");
    path.push(param_file_path);

    load_from(path)
}

/// Load a parameter file from an explicit path.
pub fn load_from<P, F>(path: F) -> Result<P, LoadError>
where
    P: DeserializeOwned,
    F: AsRef<Path>
{
    // Load the file into a string
    let params_str = match read_to_string(path) {
        Ok(s) => s,
        Err(e) => return Err(LoadError::FileLoadError(e))
    };

    from_str(params_str.as_str())
}

/// Parse parameters from a TOML string.
pub fn from_str<P>(params_str: &str) -> Result<P, LoadError>
where
    P: DeserializeOwned
{
    toml::from_str(params_str).map_err(LoadError::DeserialiseError)
}

#[cfg(test)]
mod test {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct TestParams {
        tile_size_m: f64,
        num_rays: usize,
        #[serde(default)]
        seed: Option<u64>,
    }

    #[test]
    fn test_from_str() -> Result<(), LoadError> {
        let p: TestParams = from_str("tile_size_m = 0.075\nnum_rays = 11\n")?;

        assert_eq!(p, TestParams { tile_size_m: 0.075, num_rays: 11, seed: None });

        Ok(())
    }

    #[test]
    fn test_bad_params() {
        let r: Result<TestParams, _> = from_str("tile_size_m = \"big\"");
        assert!(matches!(r, Err(LoadError::DeserialiseError(_))));

        let r: Result<TestParams, _> = load_from("/definitely/not/a/real/file.toml");
        assert!(matches!(r, Err(LoadError::FileLoadError(_))));
    }
}
